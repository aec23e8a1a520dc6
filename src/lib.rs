//! Keystone-flavored HTTP client authentication: cached token exchange, catalog-aware endpoint
//! resolution, and transparent single-shot reauthentication for any async transport.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod cache;
pub mod client;
pub mod error;
pub mod pool;
pub mod signer;
pub mod source;
pub mod tenant;
pub mod token;
pub mod transport;

mod obs;

#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		cache::MemoryCache, client::SignedClient, tenant::TenantConfig, transport::ReqwestTransport,
	};

	/// Builds a [`SignedClient`] backed by an in-memory cache and the reqwest transport used
	/// across integration tests, returning the cache so tests can inspect stored payloads.
	pub fn build_reqwest_test_client(tenant: TenantConfig) -> (SignedClient, Arc<MemoryCache>) {
		let cache_backend = Arc::new(MemoryCache::default());
		let client = SignedClient::with_transport(
			tenant,
			cache_backend.clone(),
			Arc::new(ReqwestTransport::default()),
		);

		(client, cache_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use http;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use httpmock as _;
