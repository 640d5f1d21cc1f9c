// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use serde_json::{Value, json};
// self
use zuggr_cloud::{
	cache::{self, CacheStore, MemoryCache},
	client::ReqwestCloudClient,
	config::{ClientConfig, Config},
	error::Error,
	executor::ApiCall,
	http::Method,
};

fn build_mock_client(server: &MockServer) -> (ReqwestCloudClient, Arc<MemoryCache>) {
	let client_config = ClientConfig { node: Some("it".into()), ..ClientConfig::default() }
		.with_endpoint(server.base_url());
	let config = Config::new("app-mock", "secret-mock", "it").with_mock(true).with_client(client_config);
	let cache = Arc::new(MemoryCache::default());
	let store: Arc<dyn CacheStore> = cache.clone();
	let client = ReqwestCloudClient::new(config, store).expect("Mock client should build.");

	(client, cache)
}

#[tokio::test]
async fn mock_mode_fetches_dataset_once_and_never_calls_through() {
	let server = MockServer::start_async().await;
	let login = server
		.mock_async(|when, then| {
			when.method(POST).path("/app/login");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"T1\",\"expires_in\":3600}");
		})
		.await;
	let dataset = server
		.mock_async(|when, then| {
			when.method(GET).path("/test/mock-data").header("authorization", "Bearer T1");
			then.status(200).header("content-type", "application/json").body(
				json!({
					"mock_data": {
						"app/login": { "POST": { "ok": true } },
						"orders/7": { "DELETE": {} }
					}
				})
				.to_string(),
			);
		})
		.await;
	let (client, cache) = build_mock_client(&server);
	let first = client.post(ApiCall::new("/app/login")).await.expect("Canned login should exist.");
	let second = client.post(ApiCall::new("app/login/")).await.expect("Canned login should exist.");

	assert_eq!(Value::Object(first), json!({ "ok": true }));
	assert_eq!(Value::Object(second), json!({ "ok": true }));
	assert!(client.delete(ApiCall::new("/orders/7")).await.expect("Canned delete should exist.").is_empty());

	match client.get(ApiCall::new("/orders/8")).await {
		Err(Error::MockRouteNotFound { method, uri }) => {
			assert_eq!(method, Method::Get);
			assert_eq!(uri, "orders/8");
		},
		other => panic!("Unexpected outcome: {other:?}."),
	}

	login.assert_calls_async(1).await;
	dataset.assert_calls_async(1).await;

	assert_eq!(cache.ttl(&cache::mock_dataset_key()), Some(time::Duration::days(1)));
}

#[tokio::test]
async fn warm_up_surfaces_malformed_dataset() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/app/login");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"T1\",\"expires_in\":3600}");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/test/mock-data");
			then.status(200).header("content-type", "application/json").body("{\"data\":[]}");
		})
		.await;

	let (client, cache) = build_mock_client(&server);
	let err = client.warm_up().await.expect_err("Dataset without mock_data should fail.");

	assert!(matches!(err, Error::MockFetch { .. }));
	assert!(cache.ttl(&cache::mock_dataset_key()).is_none());
}
