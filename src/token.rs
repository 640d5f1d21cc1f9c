//! App-token acquisition and registration of externally obtained principal tokens.
//!
//! [`TokenManager`] is the only component allowed to write token entries. App tokens are
//! fetched from the configured auth endpoint on demand; admin and passport tokens only ever
//! arrive through [`TokenManager::register_token`] (or a login response the executor
//! captures), never through auto-provisioning.

// self
use crate::{
	_prelude::*,
	auth::{AuthToken, AuthType, OAuthPair, Principal, SAFETY_MARGIN, SubjectId, TokenSecret},
	cache::{self, CacheStore},
	config::Credentials,
	error::ValidationError,
	http::{self, ApiRequest, Method, Transport},
	obs::{self, CallKind},
};

const SUBJECT_ID_FIELD: &str = "id";

/// Caches, fetches, and registers bearer tokens.
pub struct TokenManager<T>
where
	T: ?Sized + Transport,
{
	cache: Arc<dyn CacheStore>,
	transport: Arc<T>,
	credentials: Credentials,
	app_auth_uri: String,
}
impl<T> TokenManager<T>
where
	T: ?Sized + Transport,
{
	/// Creates a manager that stores tokens in `cache` and fetches app tokens through
	/// `transport`.
	pub fn new(
		cache: Arc<dyn CacheStore>,
		transport: Arc<T>,
		credentials: Credentials,
		app_auth_uri: impl Into<String>,
	) -> Self {
		Self { cache, transport, credentials, app_auth_uri: app_auth_uri.into() }
	}

	/// Returns the cached app token, fetching a new one on a miss.
	pub async fn app_token(&self) -> Result<TokenSecret> {
		match self.cached(AuthType::App, None).await? {
			Some(token) => Ok(token),
			None => self.fetch_app_token().await,
		}
	}

	/// Drops the cached app token and fetches a new one.
	pub async fn refresh_app_token(&self) -> Result<TokenSecret> {
		let key = cache::token_key(AuthType::App, None);

		<dyn CacheStore>::delete(self.cache.as_ref(), &key).await?;

		self.fetch_app_token().await
	}

	/// Returns the token for `auth_type`.
	///
	/// App tokens are fetched on demand. Every other principal must have been registered for
	/// `subject` beforehand, otherwise [`Error::AuthCacheMiss`] is returned.
	pub async fn token(
		&self,
		auth_type: AuthType,
		subject: Option<&SubjectId>,
	) -> Result<TokenSecret> {
		if !auth_type.is_registrable() {
			return self.app_token().await;
		}

		let miss = || Error::AuthCacheMiss { auth_type, subject: subject.map(ToString::to_string) };
		let Some(subject) = subject else {
			return Err(miss());
		};

		self.cached(auth_type, Some(subject)).await?.ok_or_else(miss)
	}

	/// Registers a token obtained outside this client, e.g. from a login elsewhere.
	///
	/// `subject_info` must carry an `id` (string or integer) and `oauth_pair` an
	/// `access_token` + `expires_in` pair whose lifetime outlasts the safety margin.
	/// Registering the same pair twice leaves the cache unchanged.
	pub async fn register_token(
		&self,
		auth_type: AuthType,
		subject_info: &Payload,
		oauth_pair: &Payload,
	) -> Result<AuthToken> {
		if !auth_type.is_registrable() {
			return Err(ValidationError::NotRegistrable { auth_type }.into());
		}

		let subject = subject_info
			.get(SUBJECT_ID_FIELD)
			.and_then(SubjectId::from_value)
			.ok_or(ValidationError::MissingSubjectId)?;
		let pair = OAuthPair::from_payload(oauth_pair).ok_or(ValidationError::MalformedOAuthPair)?;
		let principal = Principal::subject(auth_type, subject);

		self.store_token(&principal, &pair).await?.ok_or_else(|| {
			ValidationError::ExpiresInTooShort {
				expires_in: pair.expires_in,
				margin: SAFETY_MARGIN.whole_seconds(),
			}
			.into()
		})
	}

	/// Stores `pair` for `principal`, overwriting any previous token.
	///
	/// Pairs whose lifetime does not outlast the safety margin are not cached and yield
	/// `None`.
	pub async fn store_token(
		&self,
		principal: &Principal,
		pair: &OAuthPair,
	) -> Result<Option<AuthToken>> {
		let Some(effective_ttl) = pair.effective_ttl() else {
			return Ok(None);
		};
		let key = cache::token_key(principal.auth_type, principal.subject.as_ref());

		<dyn CacheStore>::set(
			self.cache.as_ref(),
			&key,
			Value::from(pair.access_token.expose()),
			effective_ttl,
		)
		.await?;

		Ok(Some(AuthToken { value: pair.access_token.clone(), effective_ttl }))
	}

	async fn cached(
		&self,
		auth_type: AuthType,
		subject: Option<&SubjectId>,
	) -> Result<Option<TokenSecret>> {
		let key = cache::token_key(auth_type, subject);
		let token = match <dyn CacheStore>::get(self.cache.as_ref(), &key).await? {
			Some(Value::String(raw)) => Some(TokenSecret::new(raw)),
			_ => None,
		};

		Ok(token)
	}

	async fn fetch_app_token(&self) -> Result<TokenSecret> {
		obs::observe_call(CallKind::AppToken, "fetch_app_token", async {
			let request = ApiRequest::new(
				Method::Post,
				&self.app_auth_uri,
				&self.credentials.form(),
				BTreeMap::new(),
			);
			let payload = http::exchange(self.transport.as_ref(), request).await?;
			let pair = OAuthPair::from_payload(&payload)
				.ok_or(Error::AuthFetch { auth_type: AuthType::App })?;

			self.store_token(&Principal::app(), &pair).await?;

			Ok(pair.access_token)
		})
		.await
	}
}
impl<T> Clone for TokenManager<T>
where
	T: ?Sized + Transport,
{
	fn clone(&self) -> Self {
		Self {
			cache: self.cache.clone(),
			transport: self.transport.clone(),
			credentials: self.credentials.clone(),
			app_auth_uri: self.app_auth_uri.clone(),
		}
	}
}
impl<T> Debug for TokenManager<T>
where
	T: ?Sized + Transport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenManager")
			.field("credentials", &self.credentials)
			.field("app_auth_uri", &self.app_auth_uri)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::*, cache::MemoryCache};

	fn payload(value: Value) -> Payload {
		value.as_object().cloned().expect("Fixture should be a JSON object.")
	}

	fn manager(transport: Arc<ScriptedTransport>) -> (TokenManager<ScriptedTransport>, Arc<MemoryCache>) {
		let cache = Arc::new(MemoryCache::default());
		let credentials = test_config().credentials().expect("Test credentials should validate.");

		(TokenManager::new(cache.clone(), transport, credentials, "/app/login"), cache)
	}

	fn token_endpoint(token: &'static str) -> Arc<ScriptedTransport> {
		Arc::new(ScriptedTransport::new(move |_| {
			json_response(200, serde_json::json!({ "access_token": token, "expires_in": 3600 }))
		}))
	}

	#[tokio::test]
	async fn app_token_is_fetched_once_and_cached_with_margin() {
		let transport = token_endpoint("T1");
		let (manager, cache) = manager(transport.clone());

		assert_eq!(manager.app_token().await.expect("App token should be fetched.").expose(), "T1");
		assert_eq!(manager.app_token().await.expect("App token should be cached.").expose(), "T1");
		assert_eq!(transport.count(Method::Post, "/app/login"), 1);
		assert_eq!(
			cache.ttl(&cache::token_key(AuthType::App, None)),
			Some(Duration::seconds(3540))
		);

		let form = transport.calls()[0].body.pairs().to_vec();

		assert!(form.contains(&("credential_id".into(), "app-test".into())));
		assert!(form.contains(&("secret".into(), "secret-test".into())));
	}

	#[tokio::test]
	async fn app_token_fetch_requires_pair() {
		let transport = Arc::new(ScriptedTransport::new(|_| {
			json_response(200, serde_json::json!({ "access_token": "T1" }))
		}));
		let (manager, cache) = manager(transport);
		let err = manager.app_token().await.expect_err("Missing expires_in should fail.");

		assert!(matches!(err, Error::AuthFetch { auth_type: AuthType::App }));
		assert!(cache.is_empty());
	}

	#[tokio::test]
	async fn extreme_lifetimes_never_panic() {
		let endless = Arc::new(ScriptedTransport::new(|_| {
			json_response(200, serde_json::json!({ "access_token": "T1", "expires_in": i64::MAX }))
		}));
		let (long_lived, long_lived_cache) = manager(endless);

		assert!(matches!(long_lived.app_token().await, Err(Error::Cache(_))));
		assert!(long_lived_cache.is_empty());

		let expired = Arc::new(ScriptedTransport::new(|_| {
			json_response(200, serde_json::json!({ "access_token": "T1", "expires_in": i64::MIN }))
		}));
		let (manager, cache) = manager(expired.clone());

		assert_eq!(manager.app_token().await.expect("Token should still be returned.").expose(), "T1");
		assert_eq!(manager.app_token().await.expect("Token should be fetched again.").expose(), "T1");
		assert_eq!(expired.count(Method::Post, "/app/login"), 2);
		assert!(cache.is_empty());
	}

	#[tokio::test]
	async fn refresh_replaces_cached_app_token() {
		let issued = Arc::new(Mutex::new(0_u32));
		let counter = issued.clone();
		let transport = Arc::new(ScriptedTransport::new(move |_| {
			let issued = {
				let mut issued = counter.lock();

				*issued += 1;

				*issued
			};

			json_response(
				200,
				serde_json::json!({ "access_token": format!("T{issued}"), "expires_in": 3600 }),
			)
		}));
		let (manager, _) = manager(transport.clone());

		assert_eq!(manager.app_token().await.expect("App token should be fetched.").expose(), "T1");
		assert_eq!(
			manager.refresh_app_token().await.expect("App token should be refreshed.").expose(),
			"T2"
		);
		assert_eq!(manager.app_token().await.expect("App token should be cached.").expose(), "T2");
		assert_eq!(transport.count(Method::Post, "/app/login"), 2);
	}

	#[tokio::test]
	async fn unregistered_principals_miss_without_network() {
		let transport = token_endpoint("T1");
		let (manager, _) = manager(transport.clone());
		let subject = SubjectId::new("42").expect("Subject fixture should be valid.");
		let err = manager
			.token(AuthType::Admin, Some(&subject))
			.await
			.expect_err("Unregistered admin should miss.");

		assert!(matches!(
			err,
			Error::AuthCacheMiss { auth_type: AuthType::Admin, subject: Some(ref s) } if s == "42"
		));
		assert!(matches!(
			manager.token(AuthType::Passport, None).await,
			Err(Error::AuthCacheMiss { subject: None, .. })
		));
		assert!(transport.calls().is_empty());
	}

	#[tokio::test]
	async fn registered_token_is_served_and_idempotent() {
		let (manager, cache) = manager(token_endpoint("unused"));
		let subject_info = payload(serde_json::json!({ "id": 42, "name": "root" }));
		let pair = payload(serde_json::json!({ "access_token": "A1", "expires_in": 3600 }));
		let first = manager
			.register_token(AuthType::Admin, &subject_info, &pair)
			.await
			.expect("Registration should succeed.");
		let second = manager
			.register_token(AuthType::Admin, &subject_info, &pair)
			.await
			.expect("Repeated registration should succeed.");

		assert_eq!(first, second);
		assert_eq!(first.effective_ttl, Duration::seconds(3540));
		assert_eq!(cache.len(), 1);

		let subject = SubjectId::new("42").expect("Subject fixture should be valid.");

		assert_eq!(
			manager
				.token(AuthType::Admin, Some(&subject))
				.await
				.expect("Registered token should be served.")
				.expose(),
			"A1"
		);
	}

	#[tokio::test]
	async fn registration_validates_input() {
		let (manager, cache) = manager(token_endpoint("unused"));
		let subject_info = payload(serde_json::json!({ "id": "7" }));
		let pair = payload(serde_json::json!({ "access_token": "P1", "expires_in": 3600 }));
		let cases = [
			(
				AuthType::App,
				subject_info.clone(),
				pair.clone(),
				ValidationError::NotRegistrable { auth_type: AuthType::App },
			),
			(AuthType::Passport, Payload::new(), pair.clone(), ValidationError::MissingSubjectId),
			(
				AuthType::Passport,
				subject_info.clone(),
				payload(serde_json::json!({ "access_token": "P1" })),
				ValidationError::MalformedOAuthPair,
			),
			(
				AuthType::Passport,
				subject_info.clone(),
				payload(serde_json::json!({ "access_token": "P1", "expires_in": 60 })),
				ValidationError::ExpiresInTooShort { expires_in: 60, margin: 60 },
			),
		];

		for (auth_type, subject_info, pair, expected) in cases {
			match manager.register_token(auth_type, &subject_info, &pair).await {
				Err(Error::Validation(actual)) => assert_eq!(actual, expected),
				other => panic!("Unexpected registration outcome: {other:?}."),
			}
		}

		assert!(cache.is_empty());
	}
}
