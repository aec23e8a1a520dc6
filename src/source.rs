//! Credential exchange against the token endpoint.

// crates.io
use http::{
	Method,
	header::{ACCEPT, CONTENT_TYPE},
};
// self
use crate::{
	_prelude::*,
	error::TokenRequestError,
	obs,
	tenant::TenantConfig,
	token::Token,
	transport::Transport,
};

const BODY_PREVIEW_LIMIT: usize = 256;

#[derive(Serialize)]
struct AuthRequest<'a> {
	auth: AuthPayload<'a>,
}
#[derive(Serialize)]
struct AuthPayload<'a> {
	#[serde(rename = "passwordCredentials")]
	password_credentials: PasswordCredentials<'a>,
	#[serde(rename = "tenantName", skip_serializing_if = "Option::is_none")]
	tenant_name: Option<&'a str>,
}
#[derive(Serialize)]
struct PasswordCredentials<'a> {
	username: &'a str,
	password: &'a str,
}

/// Exchanges tenant credentials for a fresh [`Token`] at the token endpoint.
///
/// Each exchange builds its request from scratch, so no pre-existing auth header can leak
/// into the credential call.
pub struct TokenSource {
	transport: Arc<dyn Transport>,
}
impl TokenSource {
	/// Creates a source that exchanges credentials through the provided transport.
	pub fn new(transport: Arc<dyn Transport>) -> Self {
		Self { transport }
	}

	/// POSTs the tenant's credentials and parses the response into a [`Token`].
	///
	/// Network failures and non-2xx statuses surface as
	/// [`TokenRequestError`]; an unparsable body surfaces as
	/// [`MalformedTokenError`](crate::error::MalformedTokenError). A cancelled or failed
	/// exchange produces no partial token.
	pub async fn request_token(&self, tenant: &TenantConfig) -> Result<Token> {
		obs::token_requested(&tenant.token_endpoint);

		let result = self.exchange(tenant).await;

		if let Err(e) = &result {
			obs::token_request_failed(e);
		}

		result
	}

	async fn exchange(&self, tenant: &TenantConfig) -> Result<Token> {
		let payload = AuthRequest {
			auth: AuthPayload {
				password_credentials: PasswordCredentials {
					username: &tenant.username,
					password: tenant.password.expose(),
				},
				tenant_name: tenant.tenant_name.as_deref(),
			},
		};
		let body = serde_json::to_vec(&payload).map_err(TokenRequestError::Encode)?;
		let request = http::Request::builder()
			.method(Method::POST)
			.uri(tenant.token_endpoint.as_str())
			.header(CONTENT_TYPE, "application/json")
			.header(ACCEPT, "application/json")
			.body(body)
			.map_err(TokenRequestError::Build)?;
		let response = self.transport.send(request).await.map_err(TokenRequestError::Transport)?;

		if !response.status().is_success() {
			return Err(TokenRequestError::Status {
				status: response.status().as_u16(),
				body: preview(response.body()),
			}
			.into());
		}

		let text = String::from_utf8_lossy(response.body());

		Ok(Token::from_json(&text)?)
	}
}
impl Debug for TokenSource {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenSource").finish_non_exhaustive()
	}
}

fn preview(body: &[u8]) -> String {
	let text = String::from_utf8_lossy(body);
	let mut preview: String = text.chars().take(BODY_PREVIEW_LIMIT).collect();

	if text.chars().count() > BODY_PREVIEW_LIMIT {
		preview.push_str("...");
	}

	preview
}
