//! Public facade choosing between live execution and mock mode.

// self
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;
use crate::{
	_prelude::*,
	auth::{AuthToken, AuthType},
	cache::CacheStore,
	config::Config,
	executor::{ApiCall, LoginRoutes, RequestExecutor},
	http::{Method, Transport},
	mock::MockResponder,
	route::{CacheDispatcher, RouteMatcher},
	token::TokenManager,
};

/// Client wired to the default reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestCloudClient = CloudClient<ReqwestTransport>;

/// Zuggr Cloud client.
///
/// Every call resolves to the response payload or a typed [`Error`]. In mock mode no call other
/// than the dataset bootstrap reaches the transport.
pub struct CloudClient<T>
where
	T: ?Sized + Transport,
{
	executor: RequestExecutor<T>,
	mock: Option<MockResponder<T>>,
}
impl<T> CloudClient<T>
where
	T: ?Sized + Transport,
{
	/// Builds a client over a caller-provided transport.
	///
	/// Fails with [`Error::Config`] when credentials or the node are missing, or when the route
	/// table does not compile.
	pub fn with_transport(
		config: Config,
		cache: Arc<dyn CacheStore>,
		transport: impl Into<Arc<T>>,
	) -> Result<Self> {
		config.validate()?;

		let transport = transport.into();
		let tokens = TokenManager::new(
			cache.clone(),
			transport.clone(),
			config.credentials()?,
			config.app_auth_uri.as_str(),
		);
		let dispatcher = CacheDispatcher::new(RouteMatcher::compile(&config.routes)?, cache.clone());
		let logins = LoginRoutes::new(&config.admin_auth_uri, &config.passport_auth_uri);
		let executor = RequestExecutor::new(transport, tokens, dispatcher, logins);
		let mock = config
			.mock
			.then(|| MockResponder::new(executor.clone(), cache, config.mock_data_uri.as_str()));

		Ok(Self { executor, mock })
	}

	/// Returns `true` when calls are served from the mock dataset.
	pub fn is_mock(&self) -> bool {
		self.mock.is_some()
	}

	/// Token manager backing this client.
	pub fn tokens(&self) -> &TokenManager<T> {
		self.executor.tokens()
	}

	/// Fetches the mock dataset ahead of the first call; a no-op outside mock mode.
	pub async fn warm_up(&self) -> Result<()> {
		if let Some(mock) = &self.mock {
			mock.dataset().await?;
		}

		Ok(())
	}

	/// Sends `call` with `method`.
	pub async fn call(&self, method: Method, call: ApiCall) -> Result<Payload> {
		match &self.mock {
			Some(mock) => mock.respond(method, &call.uri).await,
			None => self.executor.execute(method, call).await,
		}
	}

	/// `GET` shorthand for [`CloudClient::call`].
	pub async fn get(&self, call: ApiCall) -> Result<Payload> {
		self.call(Method::Get, call).await
	}

	/// `POST` shorthand for [`CloudClient::call`].
	pub async fn post(&self, call: ApiCall) -> Result<Payload> {
		self.call(Method::Post, call).await
	}

	/// `PUT` shorthand for [`CloudClient::call`].
	pub async fn put(&self, call: ApiCall) -> Result<Payload> {
		self.call(Method::Put, call).await
	}

	/// `DELETE` shorthand for [`CloudClient::call`].
	pub async fn delete(&self, call: ApiCall) -> Result<Payload> {
		self.call(Method::Delete, call).await
	}

	/// Registers a token obtained elsewhere for an admin or passport principal.
	pub async fn register_token(
		&self,
		auth_type: AuthType,
		oauth_pair: &Payload,
		subject_info: &Payload,
	) -> Result<AuthToken> {
		self.tokens().register_token(auth_type, subject_info, oauth_pair).await
	}
}
#[cfg(feature = "reqwest")]
impl CloudClient<ReqwestTransport> {
	/// Builds a client over the default reqwest transport configured from `config.client`.
	pub fn new(config: Config, cache: Arc<dyn CacheStore>) -> Result<Self> {
		let transport = ReqwestTransport::from_config(&config.client)?;

		Self::with_transport(config, cache, transport)
	}
}
impl<T> Debug for CloudClient<T>
where
	T: ?Sized + Transport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CloudClient")
			.field("executor", &self.executor)
			.field("mock", &self.mock)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		_preludet::*,
		auth::SubjectId,
		cache::{self, MemoryCache},
		error::ConfigError,
		route::RouteTable,
	};

	fn payload(value: Value) -> Payload {
		value.as_object().cloned().expect("Fixture should be a JSON object.")
	}

	fn live_server() -> Arc<ScriptedTransport> {
		Arc::new(ScriptedTransport::new(|request| match (request.method, request.path()) {
			(Method::Post, "/app/login") =>
				json_response(200, serde_json::json!({ "access_token": "T1", "expires_in": 3600 })),
			(Method::Get, "/test/mock-data") => json_response(
				200,
				serde_json::json!({ "mock_data": { "app/login": { "POST": { "ok": true } } } }),
			),
			(Method::Get, "/admin/42") => json_response(200, serde_json::json!({ "id": 42, "rev": 1 })),
			(Method::Put, "/admin/42/credentials") =>
				json_response(200, serde_json::json!({ "id": 42, "rev": 2 })),
			_ => json_response(404, serde_json::json!({ "message": "not found" })),
		}))
	}

	fn admin_routes() -> RouteTable {
		RouteTable::new()
			.rule("admin/{id}", [Method::Get, Method::Put, Method::Delete])
			.ally("admin/{id}", "admin/{id}/credentials", [Method::Put])
	}

	#[test]
	fn construction_validates_config() {
		let transport = live_server();
		let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::default());
		let mut config = test_config();

		config.client.node = None;

		assert!(matches!(
			CloudClient::<ScriptedTransport>::with_transport(config, cache.clone(), transport.clone()),
			Err(Error::Config(ConfigError::MissingNode))
		));

		let config = test_config().with_routes(RouteTable::new().rule("admin/{id", [Method::Get]));

		assert!(matches!(
			CloudClient::<ScriptedTransport>::with_transport(config, cache, transport),
			Err(Error::Config(ConfigError::InvalidRoute { .. }))
		));
	}

	#[tokio::test]
	async fn admin_scenario_reads_through_and_refills_via_ally() {
		let transport = live_server();
		let (client, cache) =
			build_scripted_client(test_config().with_routes(admin_routes()), transport.clone());
		let subject = SubjectId::new("42").expect("Subject fixture should be valid.");

		client
			.register_token(
				AuthType::Admin,
				&payload(serde_json::json!({ "access_token": "A1", "expires_in": 3600 })),
				&payload(serde_json::json!({ "id": 42 })),
			)
			.await
			.expect("Registration should succeed.");

		let call = ApiCall::new("/admin/42").with_subject_auth(AuthType::Admin, subject.clone());

		client.get(call.clone()).await.expect("First GET should reach the network.");
		client.get(call.clone()).await.expect("Second GET should be cached.");

		assert_eq!(transport.count(Method::Get, "/admin/42"), 1);

		client
			.put(
				ApiCall::new("/admin/42/credentials")
					.with_subject_auth(AuthType::Admin, subject)
					.with_param("password", "new"),
			)
			.await
			.expect("PUT should succeed.");

		let refreshed = client.get(call).await.expect("GET should hit the refilled entry.");

		assert_eq!(Value::Object(refreshed), serde_json::json!({ "id": 42, "rev": 2 }));
		assert_eq!(transport.count(Method::Get, "/admin/42"), 1);
		assert_eq!(transport.count(Method::Post, "/app/login"), 0);
		assert_eq!(cache.ttl(&cache::route_key("admin/42")), Some(cache::ROUTE_TTL));
	}

	#[tokio::test]
	async fn mock_mode_serves_dataset_only() {
		let transport = live_server();
		let (client, _) = build_scripted_client(test_config().with_mock(true), transport.clone());

		assert!(client.is_mock());

		client.warm_up().await.expect("Warm-up should fetch the dataset.");

		let login = client.post(ApiCall::new("app/login")).await.expect("Canned POST exists.");

		assert_eq!(Value::Object(login), serde_json::json!({ "ok": true }));
		assert!(matches!(
			client.get(ApiCall::new("app/login")).await,
			Err(Error::MockRouteNotFound { method: Method::Get, .. })
		));
		assert_eq!(transport.count(Method::Get, "/test/mock-data"), 1);
		assert_eq!(transport.count(Method::Post, "/app/login"), 1);
		assert_eq!(transport.calls().len(), 2);
	}

	#[tokio::test]
	async fn warm_up_is_noop_when_live() {
		let transport = live_server();
		let (client, _) = build_scripted_client(test_config(), transport.clone());

		client.warm_up().await.expect("Warm-up should succeed.");

		assert!(!client.is_mock());
		assert!(transport.calls().is_empty());
	}
}
