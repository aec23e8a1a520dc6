//! Request signing: endpoint-relative URI rewriting plus auth header injection.

// crates.io
use http::{HeaderValue, Uri, header::HeaderName};
// self
use crate::{_prelude::*, error::SigningError, pool::TokenPool, transport::HttpRequest};

/// Header carrying the bearer token id on signed requests.
pub const AUTH_HEADER: HeaderName = HeaderName::from_static("x-auth-token");

/// Signs outgoing requests with a token obtained from a [`TokenPool`].
///
/// Signing is fail-closed: every token lifecycle or URI failure is wrapped in
/// [`SigningError`] and the request is never sent unsigned.
pub struct RequestSigner {
	pool: Arc<TokenPool>,
}
impl RequestSigner {
	/// Creates a signer drawing tokens from the provided pool.
	pub fn new(pool: Arc<TokenPool>) -> Self {
		Self { pool }
	}

	/// The pool this signer draws tokens from.
	pub fn pool(&self) -> &Arc<TokenPool> {
		&self.pool
	}

	/// Rewrites the request's URI against the resolved service endpoint and injects the auth
	/// header, optionally forcing a fresh token first.
	///
	/// Relative request URIs are resolved against the endpoint base (query preserved);
	/// absolute URIs pass through untouched per RFC 3986 reference resolution.
	pub async fn sign(
		&self,
		request: HttpRequest,
		force_new: bool,
	) -> Result<HttpRequest, SigningError> {
		self.pool.get_token(force_new).await.map_err(SigningError::token)?;

		let endpoint = self.pool.endpoint_url().await.map_err(SigningError::token)?;
		let token_id = self.pool.token_id().await.map_err(SigningError::token)?;
		let (mut parts, body) = request.into_parts();

		parts.uri = resolve_uri(&endpoint, &parts.uri)?;
		parts.headers.insert(
			AUTH_HEADER,
			HeaderValue::from_str(token_id.expose())
				.map_err(|source| SigningError::Header { source })?,
		);

		Ok(HttpRequest::from_parts(parts, body))
	}
}
impl Debug for RequestSigner {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestSigner").field("pool", &self.pool).finish()
	}
}

fn resolve_uri(endpoint: &Url, uri: &Uri) -> Result<Uri, SigningError> {
	if uri.scheme().is_some() {
		return Ok(uri.clone());
	}

	let reference = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("");
	let resolved = endpoint.join(reference).map_err(|source| SigningError::Resolve { source })?;

	Uri::try_from(resolved.as_str()).map_err(|source| SigningError::Uri { source })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		cache::MemoryCache,
		tenant::{EndpointClass, TenantConfig},
		transport::{HttpResponse, Transport, TransportFuture},
	};

	const TOKEN_BODY: &str = r#"{
		"access": {
			"token": { "id": "abcd1234", "expires": "2099-01-01T00:00:00Z" },
			"serviceCatalog": [
				{ "name": "api", "type": "compute", "endpoints": [{ "adminurl": "http://admin.example" }] },
				{ "name": "files", "type": "object-store", "endpoints": [{ "publicurl": "http://svc.example/v1" }] }
			]
		}
	}"#;

	struct StaticTransport;
	impl Transport for StaticTransport {
		fn send(&self, _: HttpRequest) -> TransportFuture<'_> {
			Box::pin(async move { Ok(HttpResponse::new(TOKEN_BODY.as_bytes().to_vec())) })
		}
	}

	fn signer_for(tenant: TenantConfig) -> RequestSigner {
		RequestSigner::new(Arc::new(TokenPool::new(
			tenant,
			Arc::new(MemoryCache::default()),
			Arc::new(StaticTransport),
		)))
	}

	fn tenant() -> TenantConfig {
		TenantConfig::new(
			Url::parse("http://ks.example/tokens").expect("Token endpoint fixture should parse."),
			"u",
			"p",
			"object-store",
		)
	}

	#[test]
	fn relative_uris_are_rebased_onto_the_endpoint() {
		let endpoint =
			Url::parse("http://svc.example/v2/").expect("Endpoint fixture should parse.");
		let uri = Uri::from_static("/instances?limit=10");
		let resolved =
			resolve_uri(&endpoint, &uri).expect("Absolute-path reference should resolve.");

		assert_eq!(resolved.to_string(), "http://svc.example/instances?limit=10");

		let relative = Uri::from_static("instances");
		let resolved =
			resolve_uri(&endpoint, &relative).expect("Relative reference should resolve.");

		assert_eq!(resolved.to_string(), "http://svc.example/v2/instances");
	}

	#[test]
	fn absolute_uris_pass_through_untouched() {
		let endpoint = Url::parse("http://svc.example/").expect("Endpoint fixture should parse.");
		let uri = Uri::from_static("http://ks.example/tokens");
		let resolved = resolve_uri(&endpoint, &uri).expect("Absolute URI should pass through.");

		assert_eq!(resolved.to_string(), "http://ks.example/tokens");
	}

	#[tokio::test]
	async fn sign_rewrites_the_uri_and_injects_the_auth_header() {
		let signer = signer_for(tenant());
		let request = http::Request::builder()
			.method(http::Method::GET)
			.uri("/instances")
			.body(Vec::new())
			.expect("Request fixture should build.");
		let signed = signer.sign(request, false).await.expect("Signing should succeed.");

		assert_eq!(signed.uri().to_string(), "http://svc.example/instances");
		assert_eq!(
			signed
				.headers()
				.get(&AUTH_HEADER)
				.expect("Signed request should carry the auth header.")
				.to_str()
				.expect("Auth header should be valid ASCII."),
			"abcd1234",
		);
	}

	#[tokio::test]
	async fn signing_failures_are_wrapped_not_transport_errors() {
		// The compute entry only advertises an admin URL, so the default public class fails.
		let signer = signer_for(
			TenantConfig::new(
				Url::parse("http://ks.example/tokens")
					.expect("Token endpoint fixture should parse."),
				"u",
				"p",
				"compute",
			)
			.with_endpoint_class(EndpointClass::Public),
		);
		let request = http::Request::builder()
			.uri("/instances")
			.body(Vec::new())
			.expect("Request fixture should build.");
		let err = signer
			.sign(request, false)
			.await
			.expect_err("Signing should fail when no public URL exists.");

		assert!(matches!(err, SigningError::Token { .. }));
	}
}
