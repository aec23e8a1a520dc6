//! Cache contracts and built-in backends for serialized token payloads.

pub mod file;
pub mod memory;

pub use file::FileCache;
pub use memory::MemoryCache;

// self
use crate::_prelude::*;

/// Boxed future returned by [`TokenCache`] operations.
pub type CacheFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CacheError>> + 'a + Send>>;

/// Key/value-with-TTL contract the token pool persists serialized tokens through.
///
/// The backend is an external shared resource: multiple pools, threads, or processes may hit it
/// concurrently. Get/set must be safe under that concurrency, but no read-modify-write
/// transaction is required; tokens are immutable values, so last write wins.
pub trait TokenCache
where
	Self: Send + Sync,
{
	/// Fetches the payload stored under `key`, if present and not yet expired.
	fn get<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<String>>;

	/// Stores `value` under `key`, expiring it after `ttl`.
	///
	/// A zero (or clamped-to-zero) TTL means the entry is already stale and may be dropped
	/// immediately.
	fn set<'a>(&'a self, key: &'a str, value: String, ttl: Duration) -> CacheFuture<'a, ()>;
}

/// Error type produced by [`TokenCache`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CacheError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
