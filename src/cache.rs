//! Cache-store contract, key derivation, and the built-in in-memory store.

pub mod memory;

pub use memory::MemoryCache;

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	auth::{AuthType, SubjectId},
	uri,
};

/// TTL applied to route-cache entries.
pub const ROUTE_TTL: Duration = Duration::seconds(600);
/// TTL applied to the mock dataset.
pub const MOCK_DATASET_TTL: Duration = Duration::seconds(86_400);

const KEY_NAMESPACE: &str = "zuggr_cloud";

/// Boxed future returned by [`CacheStore`] operations.
pub type CacheFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CacheError>> + 'a + Send>>;

/// Key/value store with per-entry TTL shared by tokens, route responses, and the mock dataset.
///
/// The client never assumes a process-wide singleton: callers pass a handle at construction and
/// are responsible for whatever concurrency guarantees the backend offers. Entries expire
/// passively; the client never sweeps.
pub trait CacheStore
where
	Self: Send + Sync,
{
	/// Returns the live value stored at `key`, if any.
	fn get<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<Value>>;

	/// Stores or replaces the value at `key` for `ttl`.
	fn set<'a>(&'a self, key: &'a str, value: Value, ttl: Duration) -> CacheFuture<'a, ()>;

	/// Removes `key`, returning whether a live entry was present.
	fn delete<'a>(&'a self, key: &'a str) -> CacheFuture<'a, bool>;

	/// Returns `true` if a live entry exists at `key`.
	fn has<'a>(&'a self, key: &'a str) -> CacheFuture<'a, bool>;
}

/// Error type produced by [`CacheStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CacheError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Key of the route-cache entry for `uri`; method independent.
pub fn route_key(uri: &str) -> String {
	fingerprint(&uri::canonical(uri, false))
}

/// Key of the cached token for a principal.
pub fn token_key(auth_type: AuthType, subject: Option<&SubjectId>) -> String {
	let subject = subject.map(ToString::to_string).unwrap_or_default();

	fingerprint(&format!("{KEY_NAMESPACE}:auth:{auth_type}:{subject}"))
}

/// Key of the cached mock dataset.
pub fn mock_dataset_key() -> String {
	fingerprint(&format!("{KEY_NAMESPACE}:mock:data"))
}

/// Stable digest used for every cache key: SHA-256, base64url without padding.
pub fn fingerprint(input: &str) -> String {
	let mut hasher = Sha256::new();

	hasher.update(input.as_bytes());

	URL_SAFE_NO_PAD.encode(hasher.finalize())
}
