//! Internal observability events, emitted through `tracing` when the feature is enabled.
//!
//! Purely observational: no control flow depends on these, and every helper compiles down to a
//! no-op without the `tracing` feature.

pub(crate) fn cache_hit(key: &str) {
	#[cfg(feature = "tracing")]
	tracing::debug!(key, "Obtained token from cache.");
	#[cfg(not(feature = "tracing"))]
	let _ = key;
}

pub(crate) fn cache_miss(key: &str) {
	#[cfg(feature = "tracing")]
	tracing::debug!(key, "No cached token present.");
	#[cfg(not(feature = "tracing"))]
	let _ = key;
}

pub(crate) fn cache_expired(key: &str) {
	#[cfg(feature = "tracing")]
	tracing::debug!(key, "Cached token has expired.");
	#[cfg(not(feature = "tracing"))]
	let _ = key;
}

pub(crate) fn token_requested(endpoint: &url::Url) {
	#[cfg(feature = "tracing")]
	tracing::debug!(endpoint = %endpoint, "Requesting a new token.");
	#[cfg(not(feature = "tracing"))]
	let _ = endpoint;
}

pub(crate) fn token_request_failed(error: &dyn std::fmt::Display) {
	#[cfg(feature = "tracing")]
	tracing::error!("Error requesting token: {error}");
	#[cfg(not(feature = "tracing"))]
	let _ = error;
}

pub(crate) fn token_cached(key: &str, ttl_seconds: i64) {
	#[cfg(feature = "tracing")]
	tracing::debug!(key, ttl_seconds, "Cached fresh token.");
	#[cfg(not(feature = "tracing"))]
	let _ = (key, ttl_seconds);
}

pub(crate) fn reauthenticating(status: u16) {
	#[cfg(feature = "tracing")]
	tracing::debug!(status, "Received an unauthenticated response; re-signing and retrying once.");
	#[cfg(not(feature = "tracing"))]
	let _ = status;
}

pub(crate) fn reauth_skipped_token_endpoint(status: u16) {
	#[cfg(feature = "tracing")]
	tracing::debug!(status, "Token endpoint rejected the request; not reauthenticating.");
	#[cfg(not(feature = "tracing"))]
	let _ = status;
}
