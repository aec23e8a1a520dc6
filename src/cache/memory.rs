//! Thread-safe in-memory [`TokenCache`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	cache::{CacheFuture, TokenCache},
};

#[derive(Clone, Debug)]
struct CacheSlot {
	value: String,
	expires_at: OffsetDateTime,
}

type SlotMap = Arc<RwLock<HashMap<String, CacheSlot>>>;

/// Thread-safe cache backend that keeps entries in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryCache(SlotMap);
impl MemoryCache {
	fn get_now(map: SlotMap, key: &str) -> Option<String> {
		let guard = map.read();
		let slot = guard.get(key)?;

		if OffsetDateTime::now_utc() >= slot.expires_at {
			return None;
		}

		Some(slot.value.clone())
	}

	fn set_now(map: SlotMap, key: String, value: String, ttl: Duration) {
		let slot = CacheSlot { value, expires_at: OffsetDateTime::now_utc() + ttl };

		map.write().insert(key, slot);
	}
}
impl TokenCache for MemoryCache {
	fn get<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<String>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::get_now(map, key)) })
	}

	fn set<'a>(&'a self, key: &'a str, value: String, ttl: Duration) -> CacheFuture<'a, ()> {
		let map = self.0.clone();
		let key = key.to_owned();

		Box::pin(async move {
			Self::set_now(map, key, value, ttl);

			Ok(())
		})
	}
}
