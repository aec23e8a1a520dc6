//! Immutable tenant configuration describing where to authenticate and which service to target.

// self
use crate::{_prelude::*, token::Secret};

/// Which variant of a service's catalog URL to use when resolving endpoints.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointClass {
	/// Publicly reachable endpoint URL.
	#[default]
	Public,
	/// Administrative endpoint URL.
	Admin,
	/// Internal-network endpoint URL.
	Internal,
}
impl EndpointClass {
	/// Every URL class a catalog endpoint record may advertise.
	pub const ALL: [Self; 3] = [Self::Public, Self::Admin, Self::Internal];

	/// Lower-cased endpoint-record key carrying this class's URL.
	pub fn key(self) -> &'static str {
		match self {
			Self::Public => "publicurl",
			Self::Admin => "adminurl",
			Self::Internal => "internalurl",
		}
	}
}
impl Display for EndpointClass {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(match self {
			Self::Public => "public",
			Self::Admin => "admin",
			Self::Internal => "internal",
		})
	}
}

/// Describes a configured identity authenticating against a Keystone-style token service.
///
/// Constructed once at setup and read-only thereafter; the [`TokenPool`](crate::pool::TokenPool)
/// owns the instance for the lifetime of the pipeline.
#[derive(Clone, Debug)]
pub struct TenantConfig {
	/// Where to POST credentials for a token.
	pub token_endpoint: Url,
	/// Username presented during the credential exchange.
	pub username: String,
	/// Password presented during the credential exchange; redacted in debug output.
	pub password: Secret,
	/// Optional tenant name scoping the auth request.
	pub tenant_name: Option<String>,
	/// Service type selecting the relevant catalog entry.
	pub service_type: String,
	/// Service name within the type; when unset the first entry for the type is used.
	pub service_name: Option<String>,
	/// Which URL class of the selected catalog entry to resolve.
	pub endpoint_class: EndpointClass,
}
impl TenantConfig {
	/// Creates a configuration targeting the first catalog entry of `service_type` via its
	/// public URL. Use the `with_*` helpers to narrow the selection.
	pub fn new(
		token_endpoint: Url,
		username: impl Into<String>,
		password: impl Into<String>,
		service_type: impl Into<String>,
	) -> Self {
		Self {
			token_endpoint,
			username: username.into(),
			password: Secret::new(password),
			tenant_name: None,
			service_type: service_type.into(),
			service_name: None,
			endpoint_class: EndpointClass::default(),
		}
	}

	/// Sets the tenant name sent with the credential exchange.
	pub fn with_tenant_name(mut self, name: impl Into<String>) -> Self {
		self.tenant_name = Some(name.into());

		self
	}

	/// Pins the catalog lookup to a specific service name.
	pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
		self.service_name = Some(name.into());

		self
	}

	/// Selects which URL class of the catalog entry to resolve.
	pub fn with_endpoint_class(mut self, class: EndpointClass) -> Self {
		self.endpoint_class = class;

		self
	}
}
