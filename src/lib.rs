//! Zuggr Cloud API client: bearer auth with transparent app-token refresh, declarative
//! route-table response caching, and a canned-data mock mode behind one facade.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod http;
pub mod mock;
pub mod obs;
pub mod route;
pub mod token;
pub mod uri;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test`
	//! crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		cache::{CacheStore, MemoryCache},
		client::CloudClient,
		config::Config,
		http::{ApiRequest, ApiResponse, Method, Transport, TransportFuture},
	};

	type Responder = Box<dyn Fn(&ApiRequest) -> ApiResponse + Send + Sync>;

	/// In-process [`Transport`] that answers every request through a closure and records
	/// what it was asked.
	pub struct ScriptedTransport {
		responder: Responder,
		calls: Mutex<Vec<ApiRequest>>,
	}
	impl ScriptedTransport {
		/// Creates a transport that delegates every request to `responder`.
		pub fn new(responder: impl Fn(&ApiRequest) -> ApiResponse + Send + Sync + 'static) -> Self {
			Self { responder: Box::new(responder), calls: Mutex::new(Vec::new()) }
		}

		/// Returns every request observed so far, oldest first.
		pub fn calls(&self) -> Vec<ApiRequest> {
			self.calls.lock().clone()
		}

		/// Counts observed requests matching the method and path (query excluded).
		pub fn count(&self, method: Method, path: &str) -> usize {
			self.calls.lock().iter().filter(|call| call.method == method && call.path() == path).count()
		}
	}
	impl Transport for ScriptedTransport {
		fn send(&self, request: ApiRequest) -> TransportFuture<'_> {
			let response = (self.responder)(&request);

			self.calls.lock().push(request);

			Box::pin(async move { Ok(response) })
		}
	}

	/// Builds a JSON response with the provided status.
	pub fn json_response(status: u16, body: serde_json::Value) -> ApiResponse {
		ApiResponse::new(status, body.to_string().into_bytes())
	}

	/// Minimal configuration used across unit tests.
	pub fn test_config() -> Config {
		Config::new("app-test", "secret-test", "node-test")
	}

	/// Wires a [`CloudClient`] to a scripted transport and a fresh in-memory cache.
	pub fn build_scripted_client(
		config: Config,
		transport: Arc<ScriptedTransport>,
	) -> (CloudClient<ScriptedTransport>, Arc<MemoryCache>) {
		let cache_backend = Arc::new(MemoryCache::default());
		let cache: Arc<dyn CacheStore> = cache_backend.clone();
		let client = CloudClient::with_transport(config, cache, transport)
			.expect("Scripted client configuration should be valid.");

		(client, cache_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::{Map, Value};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};

	/// JSON object exchanged with the API: request data, response bodies, and cached values.
	pub type Payload = Map<String, Value>;
}

pub use _prelude::Payload;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use httpmock as _;
