//! Mock mode: canned responses served from a dataset fetched once per day.

// self
use crate::{
	_prelude::*,
	cache::{self, CacheStore, MOCK_DATASET_TTL},
	executor::{ApiCall, RequestExecutor},
	http::{Method, Transport},
	obs::{self, CallKind},
	uri,
};

const MOCK_DATA_FIELD: &str = "mock_data";

/// Canned responses keyed by canonical URI, then by method.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MockDataset {
	routes: BTreeMap<String, BTreeMap<Method, Payload>>,
}
impl MockDataset {
	/// Extracts the dataset from a mock endpoint response carrying a `mock_data` object.
	pub fn from_response(response: &Payload) -> Result<Self> {
		match response.get(MOCK_DATA_FIELD) {
			Some(Value::Object(entries)) => Self::from_entries(entries),
			Some(_) => Err(mock_fetch("`mock_data` is not an object")),
			None => Err(mock_fetch("response carries no `mock_data`")),
		}
	}

	/// Builds the dataset from `{ uri: { method: payload } }`, canonicalizing every URI.
	pub fn from_entries(entries: &Payload) -> Result<Self> {
		let mut routes = BTreeMap::<String, BTreeMap<Method, Payload>>::new();

		for (raw_uri, methods) in entries {
			let Value::Object(methods) = methods else {
				return Err(mock_fetch(format!("entry `{raw_uri}` is not an object")));
			};
			let by_method = routes.entry(uri::canonical(raw_uri, false)).or_default();

			for (raw_method, payload) in methods {
				let method = raw_method.parse::<Method>().map_err(|e| mock_fetch(e.to_string()))?;
				let Value::Object(payload) = payload else {
					return Err(mock_fetch(format!("[{method}] {raw_uri} is not an object")));
				};

				by_method.insert(method, payload.clone());
			}
		}

		Ok(Self { routes })
	}

	/// Canned response for `method` + `uri`, if any.
	pub fn get(&self, method: Method, uri: &str) -> Option<&Payload> {
		self.routes.get(&uri::canonical(uri, false))?.get(&method)
	}

	/// Number of URIs with at least one canned response.
	pub fn len(&self) -> usize {
		self.routes.len()
	}

	/// Returns `true` when the dataset is empty.
	pub fn is_empty(&self) -> bool {
		self.routes.is_empty()
	}

	fn to_entries(&self) -> Payload {
		self.routes
			.iter()
			.map(|(uri, methods)| {
				let methods = methods
					.iter()
					.map(|(method, payload)| (method.to_string(), Value::Object(payload.clone())))
					.collect();

				(uri.clone(), Value::Object(methods))
			})
			.collect()
	}
}

/// Serves every call from the mock dataset; never falls back to the network.
pub struct MockResponder<T>
where
	T: ?Sized + Transport,
{
	executor: RequestExecutor<T>,
	cache: Arc<dyn CacheStore>,
	mock_data_uri: String,
}
impl<T> MockResponder<T>
where
	T: ?Sized + Transport,
{
	/// Creates a responder fetching its dataset from `mock_data_uri` through `executor`.
	pub fn new(
		executor: RequestExecutor<T>,
		cache: Arc<dyn CacheStore>,
		mock_data_uri: impl Into<String>,
	) -> Self {
		Self { executor, cache, mock_data_uri: mock_data_uri.into() }
	}

	/// Returns the cached dataset, fetching it with app auth on a miss.
	pub async fn dataset(&self) -> Result<MockDataset> {
		let key = cache::mock_dataset_key();

		if let Some(Value::Object(entries)) = <dyn CacheStore>::get(self.cache.as_ref(), &key).await? {
			return MockDataset::from_entries(&entries);
		}

		let dataset = obs::observe_call(CallKind::MockDataset, "fetch_mock_data", async {
			let call = ApiCall::new(self.mock_data_uri.as_str()).with_app_auth();
			let response = self.executor.execute(Method::Get, call).await?;

			MockDataset::from_response(&response)
		})
		.await?;

		<dyn CacheStore>::set(
			self.cache.as_ref(),
			&key,
			Value::Object(dataset.to_entries()),
			MOCK_DATASET_TTL,
		)
		.await?;

		Ok(dataset)
	}

	/// Returns the canned response for `method` + `uri`.
	pub async fn respond(&self, method: Method, uri: &str) -> Result<Payload> {
		obs::observe_call(CallKind::MockResponse, method.as_str(), async {
			self.dataset().await?.get(method, uri).cloned().ok_or_else(|| {
				Error::MockRouteNotFound { method, uri: uri::canonical(uri, false) }
			})
		})
		.await
	}
}
impl<T> Debug for MockResponder<T>
where
	T: ?Sized + Transport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("MockResponder").field("mock_data_uri", &self.mock_data_uri).finish()
	}
}

fn mock_fetch(reason: impl Into<String>) -> Error {
	Error::MockFetch { reason: reason.into() }
}
