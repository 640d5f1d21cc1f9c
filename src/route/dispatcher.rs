//! Turns route matches into cache reads, refills, and invalidations.

// self
use crate::{
	_prelude::*,
	cache::{self, CacheStore, ROUTE_TTL},
	http::Method,
	obs::{self, CacheEvent},
	route::RouteMatcher,
};

/// Cache bookkeeping decided for one request before it is sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CachePlan {
	/// No template matched; the cache is not touched.
	Bypass,
	/// `GET`: serve from the cache when present, otherwise fill after success.
	ReadThrough {
		/// Cache key.
		key: String,
		/// Canonical path the key was derived from.
		key_path: String,
	},
	/// `POST` / `PUT`: replace the entry with the fresh result after success.
	Refill {
		/// Cache key.
		key: String,
		/// Canonical path the key was derived from.
		key_path: String,
	},
	/// `DELETE`: drop the entry after success.
	Invalidate {
		/// Cache key.
		key: String,
		/// Canonical path the key was derived from.
		key_path: String,
	},
}
impl CachePlan {
	/// Cache key targeted by the plan, if any.
	pub fn key(&self) -> Option<&str> {
		match self {
			Self::Bypass => None,
			Self::ReadThrough { key, .. } | Self::Refill { key, .. } | Self::Invalidate { key, .. } =>
				Some(key),
		}
	}
}

/// Applies the route table to the injected cache store.
#[derive(Clone)]
pub struct CacheDispatcher {
	matcher: RouteMatcher,
	cache: Arc<dyn CacheStore>,
}
impl CacheDispatcher {
	/// Creates a dispatcher over a compiled matcher and a cache handle.
	pub fn new(matcher: RouteMatcher, cache: Arc<dyn CacheStore>) -> Self {
		Self { matcher, cache }
	}

	/// Decides what the cache should do for `method` + `uri`.
	pub fn plan(&self, method: Method, uri: &str) -> CachePlan {
		let Some(found) = self.matcher.find(method, uri) else {
			return CachePlan::Bypass;
		};
		let key = cache::route_key(&found.key_path);
		let key_path = found.key_path;

		match method {
			Method::Get => CachePlan::ReadThrough { key, key_path },
			Method::Post | Method::Put => CachePlan::Refill { key, key_path },
			Method::Delete => CachePlan::Invalidate { key, key_path },
		}
	}

	/// Returns the cached payload for a read-through plan; other plans never read.
	///
	/// Entries that are not JSON objects are treated as misses.
	pub async fn lookup(&self, plan: &CachePlan) -> Result<Option<Payload>> {
		let CachePlan::ReadThrough { key, key_path } = plan else {
			return Ok(None);
		};
		let cached = match <dyn CacheStore>::get(self.cache.as_ref(), key).await? {
			Some(Value::Object(payload)) => Some(payload),
			_ => None,
		};

		obs::record_cache_event(
			if cached.is_some() { CacheEvent::Hit } else { CacheEvent::Miss },
			key_path,
		);

		Ok(cached)
	}

	/// Applies the plan after the request succeeded with `payload`.
	pub async fn commit(&self, plan: &CachePlan, payload: &Payload) -> Result<()> {
		match plan {
			CachePlan::Bypass => {},
			CachePlan::ReadThrough { key, key_path } => {
				self.store(key, payload).await?;
				obs::record_cache_event(CacheEvent::Refill, key_path);
			},
			CachePlan::Refill { key, key_path } => {
				<dyn CacheStore>::delete(self.cache.as_ref(), key).await?;
				self.store(key, payload).await?;
				obs::record_cache_event(CacheEvent::Refill, key_path);
			},
			CachePlan::Invalidate { key, key_path } => {
				<dyn CacheStore>::delete(self.cache.as_ref(), key).await?;
				obs::record_cache_event(CacheEvent::Invalidate, key_path);
			},
		}

		Ok(())
	}

	async fn store(&self, key: &str, payload: &Payload) -> Result<()> {
		<dyn CacheStore>::set(self.cache.as_ref(), key, Value::Object(payload.clone()), ROUTE_TTL)
			.await
			.map_err(Error::from)
	}
}
impl Debug for CacheDispatcher {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CacheDispatcher").field("matcher", &self.matcher).finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{cache::MemoryCache, route::RouteTable};

	fn dispatcher() -> (CacheDispatcher, Arc<MemoryCache>) {
		let table = RouteTable::new()
			.rule("admin/{id}", [Method::Get, Method::Put, Method::Delete])
			.ally("admin/{id}", "admin/{id}/credentials", [Method::Put]);
		let matcher = RouteMatcher::compile(&table).expect("Route table fixture should compile.");
		let cache = Arc::new(MemoryCache::default());

		(CacheDispatcher::new(matcher, cache.clone()), cache)
	}

	fn payload(value: Value) -> Payload {
		value.as_object().cloned().expect("Fixture should be a JSON object.")
	}

	#[test]
	fn plans_follow_method() {
		let (dispatcher, _) = dispatcher();
		let key = cache::route_key("admin/42");

		assert_eq!(
			dispatcher.plan(Method::Get, "/admin/42"),
			CachePlan::ReadThrough { key: key.clone(), key_path: "admin/42".into() }
		);
		assert_eq!(
			dispatcher.plan(Method::Put, "/admin/42/credentials"),
			CachePlan::Refill { key: key.clone(), key_path: "admin/42".into() }
		);
		assert_eq!(
			dispatcher.plan(Method::Delete, "/admin/42"),
			CachePlan::Invalidate { key, key_path: "admin/42".into() }
		);
		assert_eq!(dispatcher.plan(Method::Post, "/admin/42"), CachePlan::Bypass);
	}

	#[tokio::test]
	async fn read_through_fills_then_hits() {
		let (dispatcher, cache) = dispatcher();
		let plan = dispatcher.plan(Method::Get, "/admin/42");
		let body = payload(serde_json::json!({ "id": 42 }));

		assert_eq!(dispatcher.lookup(&plan).await.expect("Lookup should succeed."), None);

		dispatcher.commit(&plan, &body).await.expect("Commit should succeed.");

		assert_eq!(dispatcher.lookup(&plan).await.expect("Lookup should succeed."), Some(body));
		assert_eq!(cache.ttl(&cache::route_key("admin/42")), Some(ROUTE_TTL));
	}

	#[tokio::test]
	async fn ally_refill_replaces_primary_entry() {
		let (dispatcher, cache) = dispatcher();
		let get = dispatcher.plan(Method::Get, "/admin/42");

		dispatcher
			.commit(&get, &payload(serde_json::json!({ "id": 42, "rev": 1 })))
			.await
			.expect("Commit should succeed.");

		let put = dispatcher.plan(Method::Put, "/admin/42/credentials");
		let fresh = payload(serde_json::json!({ "id": 42, "rev": 2 }));

		dispatcher.commit(&put, &fresh).await.expect("Commit should succeed.");

		assert_eq!(dispatcher.lookup(&get).await.expect("Lookup should succeed."), Some(fresh));
		assert_eq!(cache.len(), 1);
	}

	#[tokio::test]
	async fn invalidate_drops_without_refill() {
		let (dispatcher, cache) = dispatcher();
		let get = dispatcher.plan(Method::Get, "/admin/42");

		dispatcher
			.commit(&get, &payload(serde_json::json!({ "id": 42 })))
			.await
			.expect("Commit should succeed.");
		dispatcher
			.commit(&dispatcher.plan(Method::Delete, "/admin/42"), &Payload::new())
			.await
			.expect("Commit should succeed.");

		assert!(cache.is_empty());
	}
}
