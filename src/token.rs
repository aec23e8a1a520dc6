//! Immutable token model: bearer credential, expiry, and the service catalog it was issued with.

// crates.io
use serde_json::{Map as JsonMap, Value as JsonValue};
use time::format_description::well_known::Rfc3339;
// self
use crate::{
	_prelude::*,
	error::{CatalogError, MalformedTokenError},
	tenant::EndpointClass,
};

/// Redacted secret wrapper keeping credentials out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret(String);
impl Secret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for Secret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("Secret").field(&"<redacted>").finish()
	}
}
impl Display for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

// Wire shape of a Keystone token response; also the cached representation, so the parse and
// serialize paths must stay inverse of each other. Bump the cache key version in
// `pool` whenever this changes.
#[derive(Serialize, Deserialize)]
struct RawResponse {
	access: RawAccess,
}
#[derive(Serialize, Deserialize)]
struct RawAccess {
	token: RawToken,
	#[serde(rename = "serviceCatalog", default)]
	service_catalog: Vec<RawService>,
}
#[derive(Serialize, Deserialize)]
struct RawToken {
	id: String,
	expires: String,
}
#[derive(Serialize, Deserialize)]
struct RawService {
	name: String,
	#[serde(rename = "type")]
	service_type: String,
	endpoints: Vec<JsonMap<String, JsonValue>>,
}

/// Single catalog endpoint record with lower-cased keys, so URL class lookups are
/// case-insensitive regardless of how the remote service spells `publicURL`.
#[derive(Clone, Debug, PartialEq)]
pub struct EndpointRecord(JsonMap<String, JsonValue>);
impl EndpointRecord {
	fn from_wire(
		service_type: &str,
		service_name: &str,
		record: JsonMap<String, JsonValue>,
	) -> Result<Self, MalformedTokenError> {
		let mut lowered = JsonMap::new();

		for (key, value) in record {
			lowered.insert(key.to_ascii_lowercase(), value);
		}

		let recognized = EndpointClass::ALL
			.iter()
			.any(|class| lowered.get(class.key()).is_some_and(JsonValue::is_string));

		if !recognized {
			return Err(MalformedTokenError::InvalidCatalogEntry {
				service_type: service_type.to_owned(),
				service_name: service_name.to_owned(),
			});
		}

		Ok(Self(lowered))
	}

	/// Returns the URL string advertised for the class, if the record carries one.
	pub fn url(&self, class: EndpointClass) -> Option<&str> {
		self.0.get(class.key()).and_then(JsonValue::as_str)
	}
}

/// One named service within a catalog, holding its endpoint records in wire order.
#[derive(Clone, Debug, PartialEq)]
pub struct CatalogService {
	/// Service type as supplied by the remote service (case preserved).
	pub service_type: String,
	/// Service name as supplied by the remote service (case preserved).
	pub name: String,
	/// Endpoint records in the order the token response listed them.
	pub endpoints: Vec<EndpointRecord>,
}

/// Service catalog keyed by type and name, preserving insertion order.
///
/// Order matters: when a tenant omits the service name, the first inserted entry for the
/// requested type wins, deterministically.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ServiceCatalog {
	services: Vec<CatalogService>,
}
impl ServiceCatalog {
	/// Catalog entries in insertion order.
	pub fn services(&self) -> &[CatalogService] {
		&self.services
	}

	// Re-announcing an existing (type, name) pair replaces its endpoints in place, keeping
	// the original position for ordered lookups.
	fn insert(&mut self, service_type: String, name: String, endpoints: Vec<EndpointRecord>) {
		if let Some(existing) = self.services.iter_mut().find(|service| {
			service.service_type.eq_ignore_ascii_case(&service_type)
				&& service.name.eq_ignore_ascii_case(&name)
		}) {
			existing.endpoints = endpoints;

			return;
		}

		self.services.push(CatalogService { service_type, name, endpoints });
	}

	fn service(
		&self,
		service_type: &str,
		service_name: Option<&str>,
	) -> Result<&CatalogService, CatalogError> {
		let mut of_type = self
			.services
			.iter()
			.filter(|service| service.service_type.eq_ignore_ascii_case(service_type))
			.peekable();

		if of_type.peek().is_none() {
			return Err(CatalogError::UnknownServiceType { service_type: service_type.to_owned() });
		}

		match service_name {
			None => of_type.next().ok_or(CatalogError::UnknownServiceType {
				service_type: service_type.to_owned(),
			}),
			Some(name) =>
				of_type.find(|service| service.name.eq_ignore_ascii_case(name)).ok_or_else(|| {
					CatalogError::UnknownServiceName {
						service_type: service_type.to_owned(),
						service_name: name.to_owned(),
					}
				}),
		}
	}
}

/// Immutable authentication grant plus the service catalog it was issued with.
///
/// Tokens are values: a refreshed token is a new instance, never an in-place mutation. This is
/// what keeps the cache-race and single-retry reasoning tractable.
#[derive(Clone, PartialEq)]
pub struct Token {
	id: Secret,
	expires_at: OffsetDateTime,
	catalog: ServiceCatalog,
}
impl Token {
	/// Parses a Keystone token response body, or a cached serialization produced by
	/// [`to_json`](Self::to_json).
	pub fn from_json(raw: &str) -> Result<Self, MalformedTokenError> {
		let mut deserializer = serde_json::Deserializer::from_str(raw);
		let raw_response: RawResponse = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| MalformedTokenError::Json { source })?;

		Self::from_raw(raw_response)
	}

	fn from_raw(raw: RawResponse) -> Result<Self, MalformedTokenError> {
		let RawResponse { access } = raw;
		let expires_at = OffsetDateTime::parse(&access.token.expires, &Rfc3339).map_err(
			|source| MalformedTokenError::InvalidExpiry { value: access.token.expires.clone(), source },
		)?;
		let mut catalog = ServiceCatalog::default();

		for service in access.service_catalog {
			let endpoints = service
				.endpoints
				.into_iter()
				.map(|record| EndpointRecord::from_wire(&service.service_type, &service.name, record))
				.collect::<Result<Vec<_>, _>>()?;

			catalog.insert(service.service_type, service.name, endpoints);
		}

		Ok(Self { id: Secret::new(access.token.id), expires_at, catalog })
	}

	/// Serializes the token back into the response shape, bit-for-bit reconstructible via
	/// [`from_json`](Self::from_json).
	pub fn to_json(&self) -> Result<String, serde_json::Error> {
		use serde::ser::Error as _;

		let expires = self.expires_at.format(&Rfc3339).map_err(serde_json::Error::custom)?;
		let raw = RawResponse {
			access: RawAccess {
				token: RawToken { id: self.id.expose().to_owned(), expires },
				service_catalog: self
					.catalog
					.services
					.iter()
					.map(|service| RawService {
						name: service.name.clone(),
						service_type: service.service_type.clone(),
						endpoints: service.endpoints.iter().map(|record| record.0.clone()).collect(),
					})
					.collect(),
			},
		};

		serde_json::to_string(&raw)
	}

	/// Opaque bearer credential to present as `X-Auth-Token`.
	pub fn id(&self) -> &Secret {
		&self.id
	}

	/// Expiry instant reported by the token service.
	pub fn expires_at(&self) -> OffsetDateTime {
		self.expires_at
	}

	/// The service catalog issued alongside the token.
	pub fn catalog(&self) -> &ServiceCatalog {
		&self.catalog
	}

	/// Returns `true` if the token has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}

	/// Returns `true` if the token is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}

	/// Resolves the base URL for a service selection.
	///
	/// Lookups are case-insensitive on type, name, and URL class. An omitted `service_name`
	/// picks the first inserted entry for the type. Within the chosen entry, the first endpoint
	/// record carrying the requested class wins.
	pub fn resolve_endpoint(
		&self,
		service_type: &str,
		service_name: Option<&str>,
		class: EndpointClass,
	) -> Result<Url, CatalogError> {
		let service = self.catalog.service(service_type, service_name)?;
		let raw = service
			.endpoints
			.iter()
			.find_map(|record| record.url(class))
			.ok_or(CatalogError::NoEndpointFound { class })?;

		Url::parse(raw)
			.map_err(|source| CatalogError::InvalidEndpointUrl { value: raw.to_owned(), source })
	}
}
impl Debug for Token {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Token")
			.field("id", &self.id)
			.field("expires_at", &self.expires_at)
			.field("catalog", &self.catalog)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	const RESPONSE: &str = r#"{
		"access": {
			"token": { "id": "abcd1234", "expires": "2025-06-01T12:00:00Z" },
			"serviceCatalog": [
				{
					"name": "api",
					"type": "compute",
					"endpoints": [
						{ "publicURL": "http://svc.example", "adminURL": "http://admin.example" }
					]
				},
				{
					"name": "backup",
					"type": "compute",
					"endpoints": [
						{ "adminurl": "http://backup-admin.example" }
					]
				},
				{
					"name": "cdn",
					"type": "object-store",
					"endpoints": [
						{ "publicurl": "http://cdn.example", "region": "ams" }
					]
				}
			]
		}
	}"#;

	fn token() -> Token {
		Token::from_json(RESPONSE).expect("Token fixture should parse.")
	}

	#[test]
	fn serialization_round_trip_is_the_identity() {
		let original = token();
		let serialized = original.to_json().expect("Token fixture should serialize.");
		let restored = Token::from_json(&serialized).expect("Serialized token should parse back.");

		assert_eq!(restored, original);
		assert_eq!(restored.id().expose(), "abcd1234");
		assert_eq!(restored.expires_at(), macros::datetime!(2025-06-01 12:00 UTC));
		assert_eq!(restored.catalog().services().len(), 3);
	}

	#[test]
	fn expiry_is_inclusive_at_the_boundary() {
		let token = token();

		assert!(!token.is_expired_at(macros::datetime!(2025-06-01 11:59:59 UTC)));
		assert!(token.is_expired_at(macros::datetime!(2025-06-01 12:00:00 UTC)));
		assert!(token.is_expired_at(macros::datetime!(2025-06-01 12:00:01 UTC)));
	}

	#[test]
	fn lookup_is_case_insensitive_on_type_name_and_class() {
		let token = token();
		let url = token
			.resolve_endpoint("COMPUTE", Some("API"), EndpointClass::Public)
			.expect("Case-insensitive lookup should resolve the compute api entry.");

		assert_eq!(url.as_str(), "http://svc.example/");

		let admin = token
			.resolve_endpoint("compute", Some("api"), EndpointClass::Admin)
			.expect("Mixed-case adminURL key should be found.");

		assert_eq!(admin.as_str(), "http://admin.example/");
	}

	#[test]
	fn omitted_name_picks_the_first_inserted_entry() {
		let token = token();
		let url = token
			.resolve_endpoint("compute", None, EndpointClass::Admin)
			.expect("First inserted compute entry should win when the name is omitted.");

		// `api` was inserted before `backup`, so its adminURL wins.
		assert_eq!(url.as_str(), "http://admin.example/");
	}

	#[test]
	fn missing_class_in_selected_entry_is_no_endpoint_found() {
		let token = token();
		let err = token
			.resolve_endpoint("compute", Some("backup"), EndpointClass::Public)
			.expect_err("Admin-only entry should not resolve a public URL.");

		assert!(matches!(err, CatalogError::NoEndpointFound { class: EndpointClass::Public }));
	}

	#[test]
	fn unknown_type_and_unknown_name_are_distinct_failures() {
		let token = token();

		assert!(matches!(
			token.resolve_endpoint("network", None, EndpointClass::Public),
			Err(CatalogError::UnknownServiceType { .. }),
		));
		assert!(matches!(
			token.resolve_endpoint("compute", Some("missing"), EndpointClass::Public),
			Err(CatalogError::UnknownServiceName { .. }),
		));
	}

	#[test]
	fn endpoint_without_any_url_class_is_rejected() {
		let raw = r#"{
			"access": {
				"token": { "id": "abcd1234", "expires": "2025-06-01T12:00:00Z" },
				"serviceCatalog": [
					{ "name": "api", "type": "compute", "endpoints": [{ "region": "ams" }] }
				]
			}
		}"#;
		let err = Token::from_json(raw).expect_err("Endpoint without URL classes should fail.");

		assert!(matches!(err, MalformedTokenError::InvalidCatalogEntry { .. }));
	}

	#[test]
	fn missing_required_fields_report_the_json_path() {
		let err = Token::from_json(r#"{"access": {"token": {"expires": "2025-06-01T12:00:00Z"}}}"#)
			.expect_err("Missing token id should fail.");

		match err {
			MalformedTokenError::Json { source } =>
				assert_eq!(source.path().to_string(), "access.token"),
			other => panic!("Unexpected error variant: {other:?}."),
		}

		assert!(matches!(
			Token::from_json("[1, 2]").expect_err("Non-object payload should fail."),
			MalformedTokenError::Json { .. },
		));
	}

	#[test]
	fn invalid_expiry_is_reported_with_the_raw_value() {
		let err =
			Token::from_json(r#"{"access": {"token": {"id": "abcd1234", "expires": "tomorrow"}}}"#)
				.expect_err("Unparsable expiry should fail.");

		match err {
			MalformedTokenError::InvalidExpiry { value, .. } => assert_eq!(value, "tomorrow"),
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}

	#[test]
	fn reannounced_service_replaces_endpoints_in_place() {
		let raw = r#"{
			"access": {
				"token": { "id": "abcd1234", "expires": "2025-06-01T12:00:00Z" },
				"serviceCatalog": [
					{ "name": "api", "type": "compute", "endpoints": [{ "publicurl": "http://old.example" }] },
					{ "name": "backup", "type": "compute", "endpoints": [{ "publicurl": "http://backup.example" }] },
					{ "name": "api", "type": "compute", "endpoints": [{ "publicurl": "http://new.example" }] }
				]
			}
		}"#;
		let token = Token::from_json(raw).expect("Duplicate catalog entries should parse.");

		assert_eq!(token.catalog().services().len(), 2);

		// The replacement keeps the original position, so `api` still wins unnamed lookups.
		let url = token
			.resolve_endpoint("compute", None, EndpointClass::Public)
			.expect("Unnamed lookup should resolve the first inserted entry.");

		assert_eq!(url.as_str(), "http://new.example/");
	}

	#[test]
	fn debug_output_redacts_the_token_id() {
		let token = token();
		let debugged = format!("{token:?}");

		assert!(!debugged.contains("abcd1234"));
		assert!(debugged.contains("<redacted>"));
	}
}
