//! Transport primitives for sending signed requests.
//!
//! The module exposes [`Transport`] as the crate's only dependency on an HTTP stack. Requests
//! and responses use plain [`http`] types so the signer can mutate headers and rewrite URIs
//! before dispatch, and so any client library can be adapted behind the trait. The default
//! [`ReqwestTransport`] is enabled through the `reqwest` feature.

// std
use std::ops::Deref;
// self
use crate::{_prelude::*, error::TransportError};

/// Outbound HTTP request as consumed by a [`Transport`].
pub type HttpRequest = http::Request<Vec<u8>>;
/// HTTP response as produced by a [`Transport`].
pub type HttpResponse = http::Response<Vec<u8>>;
/// Boxed future returned by [`Transport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing arbitrary requests.
///
/// Implementations must be `Send + Sync` so one instance can serve many concurrent logical
/// requests; the component imposes no timeout of its own, cancellation and deadlines belong to
/// the transport and its caller. Responses are returned for every status code; only
/// connection-level failures surface as [`TransportError`].
pub trait Transport
where
	Self: Send + Sync,
{
	/// Sends the request and resolves with the remote response.
	fn send(&self, request: HttpRequest) -> TransportFuture<'_>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// The wrapper converts between [`http`] messages and reqwest's own types, buffering response
/// bodies so the reauthentication layer can inspect the status before handing the response to
/// the caller.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Transport for ReqwestTransport {
	fn send(&self, request: HttpRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let request: reqwest::Request = request.try_into().map_err(TransportError::from)?;
			let response = client.execute(request).await.map_err(TransportError::from)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(TransportError::from)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}
