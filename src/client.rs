//! Transport-compatible client composing the token pool, request signer, and single-shot
//! reauthentication around an underlying transport.

// crates.io
use http::{Method, StatusCode};
// self
#[cfg(feature = "reqwest")] use crate::transport::ReqwestTransport;
use crate::{
	_prelude::*,
	cache::TokenCache,
	obs,
	pool::TokenPool,
	signer::RequestSigner,
	tenant::TenantConfig,
	transport::{HttpRequest, HttpResponse, Transport},
};

/// HTTP client decorator with Keystone authentication support.
///
/// Every logical request runs sign then send. When the remote reports the token invalid or
/// expired with a 401 or 403, exactly one resign-with-fresh-token and resend cycle runs. The second
/// outcome is final whatever it is. Requests targeting the token endpoint itself are never
/// reauthenticated: an auth failure fetching a token cannot be fixed by fetching a token.
///
/// The pipeline is an explicitly constructed, explicitly owned object; concurrent logical
/// requests share it without any global serialization.
pub struct SignedClient {
	transport: Arc<dyn Transport>,
	signer: RequestSigner,
	token_endpoint: Url,
}
impl SignedClient {
	/// Creates a client for the tenant, provisioning the crate's default reqwest transport.
	#[cfg(feature = "reqwest")]
	pub fn new(tenant: TenantConfig, cache: Arc<dyn TokenCache>) -> Self {
		Self::with_transport(tenant, cache, Arc::new(ReqwestTransport::default()))
	}

	/// Composes the pipeline around a caller-provided transport.
	///
	/// The same transport instance serves both the credential exchange and the signed
	/// requests, so tests can observe every call in one place.
	pub fn with_transport(
		tenant: TenantConfig,
		cache: Arc<dyn TokenCache>,
		transport: Arc<dyn Transport>,
	) -> Self {
		let token_endpoint = tenant.token_endpoint.clone();
		let pool = Arc::new(TokenPool::new(tenant, cache, transport.clone()));

		Self { transport, signer: RequestSigner::new(pool), token_endpoint }
	}

	/// The token pool backing this client.
	pub fn pool(&self) -> &Arc<TokenPool> {
		self.signer.pool()
	}

	/// The request signer backing this client.
	pub fn signer(&self) -> &RequestSigner {
		&self.signer
	}

	/// Signs and sends a request, transparently reauthenticating at most once.
	///
	/// Signing failures surface as [`SigningError`](crate::error::SigningError) before
	/// anything is sent (fail-closed); transport failures and non-auth HTTP errors pass
	/// through untouched.
	pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
		let signed = self.signer.sign(clone_request(&request), false).await?;
		let response = self.transport.send(signed).await?;
		let status = response.status();

		if !is_unauthenticated(status) {
			return Ok(response);
		}
		if self.targets_token_endpoint(&request) {
			obs::reauth_skipped_token_endpoint(status.as_u16());

			return Ok(response);
		}

		obs::reauthenticating(status.as_u16());

		let resigned = self.signer.sign(request, true).await?;

		Ok(self.transport.send(resigned).await?)
	}

	/// Convenience helper issuing a GET for `target` (absolute, or relative to the resolved
	/// service endpoint).
	pub async fn get(&self, target: &str) -> Result<HttpResponse> {
		self.request(Method::GET, target, Vec::new()).await
	}

	/// Convenience helper issuing a POST with the provided body.
	pub async fn post(&self, target: &str, body: Vec<u8>) -> Result<HttpResponse> {
		self.request(Method::POST, target, body).await
	}

	/// Convenience helper issuing a PUT with the provided body.
	pub async fn put(&self, target: &str, body: Vec<u8>) -> Result<HttpResponse> {
		self.request(Method::PUT, target, body).await
	}

	/// Convenience helper issuing a DELETE for `target`.
	pub async fn delete(&self, target: &str) -> Result<HttpResponse> {
		self.request(Method::DELETE, target, Vec::new()).await
	}

	/// Builds and sends a request through the signing pipeline.
	pub async fn request(
		&self,
		method: Method,
		target: &str,
		body: Vec<u8>,
	) -> Result<HttpResponse> {
		let request = http::Request::builder().method(method).uri(target).body(body)?;

		self.send(request).await
	}

	fn targets_token_endpoint(&self, request: &HttpRequest) -> bool {
		Url::parse(&request.uri().to_string()).is_ok_and(|url| url == self.token_endpoint)
	}
}
impl Debug for SignedClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SignedClient")
			.field("signer", &self.signer)
			.field("token_endpoint", &self.token_endpoint)
			.finish_non_exhaustive()
	}
}

fn is_unauthenticated(status: StatusCode) -> bool {
	matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
}

fn clone_request(request: &HttpRequest) -> HttpRequest {
	let mut cloned = HttpRequest::new(request.body().clone());

	*cloned.method_mut() = request.method().clone();
	*cloned.uri_mut() = request.uri().clone();
	*cloned.headers_mut() = request.headers().clone();
	*cloned.version_mut() = request.version();

	cloned
}
