//! Token cache manager: decides between cached and fresh tokens, persists them with a TTL, and
//! resolves the tenant's service endpoint.

// crates.io
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
// self
use crate::{
	_prelude::*,
	cache::{CacheError, TokenCache},
	obs,
	source::TokenSource,
	tenant::TenantConfig,
	token::{Secret, Token},
	transport::Transport,
};

/// Safety margin subtracted from the token's real expiry when computing the cache TTL, so the
/// cache never hands out a token that expires mid-flight.
const EXPIRY_SAFETY_MARGIN: Duration = Duration::seconds(5);
/// Cache key schema version. Bump whenever the serialized token shape changes, so entries
/// written by older releases are never deserialized.
const CACHE_KEY_VERSION: u32 = 3;
// rawurlencode-compatible escape set: everything except RFC 3986 unreserved characters.
const CACHE_KEY_ESCAPE: &AsciiSet =
	&NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

#[derive(Clone, Debug)]
struct ResolvedEndpoint {
	endpoint_url: Url,
	token_id: Secret,
}

/// Per-tenant token lifecycle manager.
///
/// The pool reuses a cached token whenever possible, exchanges credentials when the cache is
/// empty, expired, or a fresh token is forced, and keeps the resolved `(endpoint URL, token id)`
/// pair in memory for cheap repeated access. Tokens are immutable values, so concurrent
/// refreshes across pools or processes merely race on the cache write; the last one wins.
pub struct TokenPool {
	tenant: TenantConfig,
	cache: Arc<dyn TokenCache>,
	source: TokenSource,
	resolved: RwLock<Option<ResolvedEndpoint>>,
	refresh_guard: AsyncMutex<()>,
}
impl TokenPool {
	/// Creates a pool for the tenant, exchanging credentials through the provided transport.
	pub fn new(
		tenant: TenantConfig,
		cache: Arc<dyn TokenCache>,
		transport: Arc<dyn Transport>,
	) -> Self {
		Self {
			tenant,
			cache,
			source: TokenSource::new(transport),
			resolved: RwLock::new(None),
			refresh_guard: AsyncMutex::new(()),
		}
	}

	/// The tenant configuration this pool authenticates for.
	pub fn tenant(&self) -> &TenantConfig {
		&self.tenant
	}

	/// Stable cache key for this tenant, derived from the token endpoint and versioned so
	/// schema changes never collide with stale entries.
	pub fn cache_key(&self) -> String {
		format!(
			"keystone_token_{CACHE_KEY_VERSION}_{}",
			utf8_percent_encode(self.tenant.token_endpoint.as_str(), CACHE_KEY_ESCAPE),
		)
	}

	/// Returns a token for the keystone service, reusing the cached instance whenever possible.
	///
	/// With `force_new` the cache read is skipped entirely and a fresh credential exchange is
	/// performed. A cached payload that fails to parse surfaces as
	/// [`Error::CacheCorruption`]; it is never silently treated as a miss.
	pub async fn get_token(&self, force_new: bool) -> Result<Token> {
		let key = self.cache_key();

		if !force_new {
			if let Some(token) = self.cached_token(&key).await? {
				return Ok(token);
			}
		}

		// Singleflight per pool instance: concurrent refreshes piggy-back on the winner's
		// cache write instead of stampeding the token endpoint.
		let _refresh = self.refresh_guard.lock().await;

		if !force_new {
			if let Some(token) = self.cached_token(&key).await? {
				return Ok(token);
			}
		}

		let token = self.source.request_token(&self.tenant).await?;
		let ttl = (token.expires_at() - OffsetDateTime::now_utc() - EXPIRY_SAFETY_MARGIN)
			.max(Duration::ZERO);
		let serialized = token.to_json().map_err(|e| CacheError::Serialization {
			message: format!("Failed to serialize token for caching: {e}"),
		})?;

		self.cache.set(&key, serialized, ttl).await?;
		obs::token_cached(&key, ttl.whole_seconds());
		self.remember(&token)?;

		Ok(token)
	}

	/// Resolved base URL for the tenant's service selection, lazily fetching a token if none
	/// has been resolved in this pool's lifetime.
	pub async fn endpoint_url(&self) -> Result<Url> {
		Ok(self.ensure_resolved().await?.endpoint_url)
	}

	/// Id of the currently resolved token, lazily fetching one if necessary.
	pub async fn token_id(&self) -> Result<Secret> {
		Ok(self.ensure_resolved().await?.token_id)
	}

	async fn cached_token(&self, key: &str) -> Result<Option<Token>> {
		let Some(payload) = self.cache.get(key).await? else {
			obs::cache_miss(key);

			return Ok(None);
		};
		let token = Token::from_json(&payload)
			.map_err(|source| Error::CacheCorruption { key: key.to_owned(), source })?;

		if token.is_expired() {
			obs::cache_expired(key);

			return Ok(None);
		}

		obs::cache_hit(key);
		self.remember(&token)?;

		Ok(Some(token))
	}

	fn remember(&self, token: &Token) -> Result<()> {
		let endpoint_url = token.resolve_endpoint(
			&self.tenant.service_type,
			self.tenant.service_name.as_deref(),
			self.tenant.endpoint_class,
		)?;

		*self.resolved.write() =
			Some(ResolvedEndpoint { endpoint_url, token_id: token.id().clone() });

		Ok(())
	}

	async fn ensure_resolved(&self) -> Result<ResolvedEndpoint> {
		if let Some(resolved) = self.resolved.read().clone() {
			return Ok(resolved);
		}

		let token = self.get_token(false).await?;
		let endpoint_url = token.resolve_endpoint(
			&self.tenant.service_type,
			self.tenant.service_name.as_deref(),
			self.tenant.endpoint_class,
		)?;

		Ok(ResolvedEndpoint { endpoint_url, token_id: token.id().clone() })
	}
}
impl Debug for TokenPool {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenPool")
			.field("tenant", &self.tenant)
			.field("cache_key", &self.cache_key())
			.finish_non_exhaustive()
	}
}
