//! Client-level error types shared across the token lifecycle, signer, and transport seams.

// self
use crate::{_prelude::*, tenant::EndpointClass};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Token response or cached payload does not match the expected schema.
	#[error(transparent)]
	MalformedToken(#[from] MalformedTokenError),
	/// Credential exchange against the token endpoint failed.
	#[error(transparent)]
	TokenRequest(#[from] TokenRequestError),
	/// Service catalog lookup failed for the configured tenant.
	#[error(transparent)]
	Catalog(#[from] CatalogError),
	/// Cache backend failure.
	#[error("{0}")]
	Cache(
		#[from]
		#[source]
		crate::cache::CacheError,
	),
	/// A cached payload was present but could not be parsed into a token.
	///
	/// This is deliberately not treated as a cache miss: an unparsable entry points at a
	/// cache-writer versioning bug that must not be masked by a silent refresh.
	#[error("Cached token payload under `{key}` could not be parsed.")]
	CacheCorruption {
		/// Cache key holding the corrupted payload.
		key: String,
		/// Parse failure raised for the cached payload.
		#[source]
		source: MalformedTokenError,
	},
	/// Request could not be signed; the request was never sent.
	#[error(transparent)]
	Signing(#[from] SigningError),
	/// Transport failure while sending a signed request.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Outbound request could not be constructed.
	#[error("Request could not be constructed.")]
	Request(#[from] http::Error),
}

/// Schema violations raised while parsing a token response or cached token payload.
#[derive(Debug, ThisError)]
pub enum MalformedTokenError {
	/// Payload is not JSON, or misses a required field along the reported path.
	#[error("Token payload does not match the expected schema.")]
	Json {
		/// Structured parsing failure carrying the failing JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// `access.token.expires` is not a valid RFC 3339 timestamp.
	#[error("Token expiry `{value}` is not a valid RFC 3339 timestamp.")]
	InvalidExpiry {
		/// Raw expiry string as returned by the token endpoint.
		value: String,
		/// Underlying timestamp parse failure.
		#[source]
		source: time::error::Parse,
	},
	/// A catalog endpoint record is missing every recognized URL class key.
	#[error(
		"Catalog entry `{service_type}`/`{service_name}` has an endpoint without a public, admin, or internal URL."
	)]
	InvalidCatalogEntry {
		/// Service type of the offending catalog entry.
		service_type: String,
		/// Service name of the offending catalog entry.
		service_name: String,
	},
}

/// Failures raised while exchanging credentials at the token endpoint.
#[derive(Debug, ThisError)]
pub enum TokenRequestError {
	/// Credential exchange request could not be constructed.
	#[error("Token request could not be constructed.")]
	Build(#[from] http::Error),
	/// Credential payload could not be encoded as JSON.
	#[error("Credential payload could not be encoded.")]
	Encode(#[from] serde_json::Error),
	/// Transport-level failure reaching the token endpoint.
	#[error("Token endpoint could not be reached.")]
	Transport(#[from] TransportError),
	/// Token endpoint responded with a non-success status.
	#[error("Token endpoint returned HTTP {status}: {body}.")]
	Status {
		/// HTTP status code returned by the token endpoint.
		status: u16,
		/// Bounded preview of the response body.
		body: String,
	},
}

/// Service catalog lookup failures; fatal for the current signing attempt.
#[derive(Debug, ThisError)]
pub enum CatalogError {
	/// The token's catalog has no entry for the requested service type.
	#[error("There is no catalog for service type `{service_type}`.")]
	UnknownServiceType {
		/// Requested service type.
		service_type: String,
	},
	/// The catalog knows the service type but not the requested service name.
	#[error("There is no service named `{service_name}` for catalog `{service_type}`.")]
	UnknownServiceName {
		/// Requested service type.
		service_type: String,
		/// Requested service name.
		service_name: String,
	},
	/// No endpoint record in the selected entry carries the requested URL class.
	#[error("No endpoint with a {class} URL found.")]
	NoEndpointFound {
		/// Requested endpoint class.
		class: EndpointClass,
	},
	/// The catalog advertises an endpoint URL that does not parse.
	#[error("Catalog endpoint URL `{value}` is invalid.")]
	InvalidEndpointUrl {
		/// Raw URL string from the catalog.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}

/// Failures raised from within the request signer.
///
/// Every token-lifecycle error is wrapped here before it leaves the signer, so transport code
/// can distinguish "the request could not even be signed" from "the remote service rejected it".
#[derive(Debug, ThisError)]
pub enum SigningError {
	/// No usable token could be obtained for this request.
	#[error("Could not obtain a token to sign the request with.")]
	Token {
		/// Underlying token lifecycle failure.
		#[source]
		source: Box<Error>,
	},
	/// Request URI could not be resolved against the service endpoint.
	#[error("Request URI could not be resolved against the service endpoint.")]
	Resolve {
		/// Underlying URL resolution failure.
		#[source]
		source: url::ParseError,
	},
	/// The resolved URL is not a valid HTTP request URI.
	#[error("Resolved request URI is not a valid HTTP URI.")]
	Uri {
		/// Underlying URI conversion failure.
		#[source]
		source: http::uri::InvalidUri,
	},
	/// The token id cannot be carried as an HTTP header value.
	#[error("Token id is not a valid header value.")]
	Header {
		/// Underlying header validation failure.
		#[source]
		source: http::header::InvalidHeaderValue,
	},
}
impl SigningError {
	/// Wraps a token lifecycle failure raised while signing.
	pub fn token(source: Error) -> Self {
		Self::Token { source: Box::new(source) }
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while sending the request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while sending the request.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
