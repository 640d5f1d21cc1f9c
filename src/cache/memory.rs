//! Thread-safe in-memory [`CacheStore`] with passive expiry.

// self
use crate::{
	_prelude::*,
	cache::{CacheError, CacheFuture, CacheStore},
};

type EntryMap = Arc<RwLock<HashMap<String, CacheEntry>>>;

#[derive(Clone, Debug)]
struct CacheEntry {
	value: Value,
	ttl: Duration,
	expires_at: OffsetDateTime,
}
impl CacheEntry {
	fn is_live_at(&self, instant: OffsetDateTime) -> bool {
		instant < self.expires_at
	}
}

/// Process-local cache that keeps entries until their TTL elapses.
///
/// Expired entries are treated as absent and swept on every write.
#[derive(Clone, Debug, Default)]
pub struct MemoryCache(EntryMap);
impl MemoryCache {
	/// Returns the TTL the live entry at `key` was written with.
	pub fn ttl(&self, key: &str) -> Option<Duration> {
		let now = OffsetDateTime::now_utc();

		self.0.read().get(key).filter(|entry| entry.is_live_at(now)).map(|entry| entry.ttl)
	}

	/// Number of live entries.
	pub fn len(&self) -> usize {
		let now = OffsetDateTime::now_utc();

		self.0.read().values().filter(|entry| entry.is_live_at(now)).count()
	}

	/// Returns `true` when no live entries remain.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn get_now(map: &EntryMap, key: &str) -> Option<Value> {
		let now = OffsetDateTime::now_utc();

		map.read().get(key).filter(|entry| entry.is_live_at(now)).map(|entry| entry.value.clone())
	}

	fn set_now(map: &EntryMap, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError> {
		if !ttl.is_positive() {
			return Err(CacheError::Backend {
				message: format!("TTL for `{key}` must be positive, got {ttl}"),
			});
		}

		let now = OffsetDateTime::now_utc();
		let expires_at = now.checked_add(ttl).ok_or_else(|| CacheError::Backend {
			message: format!("TTL for `{key}` is out of range, got {ttl}"),
		})?;
		let mut entries = map.write();

		entries.retain(|_, entry| entry.is_live_at(now));
		entries.insert(key.to_owned(), CacheEntry { value, ttl, expires_at });

		Ok(())
	}

	fn delete_now(map: &EntryMap, key: &str) -> bool {
		let now = OffsetDateTime::now_utc();

		map.write().remove(key).is_some_and(|entry| entry.is_live_at(now))
	}
}
impl CacheStore for MemoryCache {
	fn get<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<Value>> {
		Box::pin(async move { Ok(Self::get_now(&self.0, key)) })
	}

	fn set<'a>(&'a self, key: &'a str, value: Value, ttl: Duration) -> CacheFuture<'a, ()> {
		Box::pin(async move { Self::set_now(&self.0, key, value, ttl) })
	}

	fn delete<'a>(&'a self, key: &'a str) -> CacheFuture<'a, bool> {
		Box::pin(async move { Ok(Self::delete_now(&self.0, key)) })
	}

	fn has<'a>(&'a self, key: &'a str) -> CacheFuture<'a, bool> {
		Box::pin(async move { Ok(Self::get_now(&self.0, key).is_some()) })
	}
}
