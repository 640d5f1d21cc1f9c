//! Live request pipeline: cache lookup, bearer auth, transport, one 422 replay, token
//! bookkeeping, and cache commit.

// self
use crate::{
	_prelude::*,
	auth::{ACCESS_TOKEN_FIELD, AuthType, OAuthPair, Principal, SubjectId, TokenSecret},
	http::{self, ApiRequest, Method, Transport},
	obs::{self, CallKind},
	route::CacheDispatcher,
	token::TokenManager,
	uri,
};

const AUTHORIZATION: &str = "Authorization";
const EXPIRED_TOKEN_STATUS: u16 = 422;
const LOGIN_SUBJECT_FIELD: &str = "id";

/// One API call: URI, data, headers, and how it should authenticate.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ApiCall {
	/// Request URI relative to the base URL; a leading slash is optional.
	pub uri: String,
	/// Query parameters for `GET`, form fields otherwise.
	pub data: Payload,
	/// Extra headers.
	pub headers: BTreeMap<String, String>,
	/// Principal whose bearer token should be attached.
	pub auth: Option<Principal>,
	/// Keeps an embedded `access_token` + `expires_in` pair in the returned payload.
	pub keep_embedded_auth: bool,
}
impl ApiCall {
	/// Creates an unauthenticated call to `uri`.
	pub fn new(uri: impl Into<String>) -> Self {
		Self { uri: uri.into(), ..Default::default() }
	}

	/// Replaces the request data.
	pub fn with_data(mut self, data: Payload) -> Self {
		self.data = data;

		self
	}

	/// Sets one data field.
	pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.data.insert(key.into(), value.into());

		self
	}

	/// Sets one header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());

		self
	}

	/// Authenticates as the application.
	pub fn with_app_auth(mut self) -> Self {
		self.auth = Some(Principal::app());

		self
	}

	/// Authenticates as a registered `auth_type` principal identified by `subject`.
	pub fn with_subject_auth(mut self, auth_type: AuthType, subject: SubjectId) -> Self {
		self.auth = Some(match auth_type {
			AuthType::App => Principal::app(),
			_ => Principal::subject(auth_type, subject),
		});

		self
	}

	/// Keeps an embedded OAuth pair in the returned payload instead of stripping it.
	pub fn keep_embedded_auth(mut self, keep: bool) -> Self {
		self.keep_embedded_auth = keep;

		self
	}

	/// Returns `true` when the caller already carries a token, in which case none is attached.
	fn supplies_token(&self) -> bool {
		self.data.contains_key(ACCESS_TOKEN_FIELD)
			|| self.headers.keys().any(|name| name.eq_ignore_ascii_case(AUTHORIZATION))
	}
}

/// Login endpoints whose successful responses register the returned principal token.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoginRoutes {
	admin: String,
	passport: String,
}
impl LoginRoutes {
	/// Creates the table from the configured admin and passport login URIs.
	pub fn new(admin: &str, passport: &str) -> Self {
		Self { admin: uri::canonical(admin, false), passport: uri::canonical(passport, false) }
	}

	/// Returns the principal kind a `POST` to `canonical` logs in.
	pub fn auth_type(&self, method: Method, canonical: &str) -> Option<AuthType> {
		if method != Method::Post {
			return None;
		}

		if canonical == self.admin {
			Some(AuthType::Admin)
		} else if canonical == self.passport {
			Some(AuthType::Passport)
		} else {
			None
		}
	}
}

/// Executes live API calls.
pub struct RequestExecutor<T>
where
	T: ?Sized + Transport,
{
	transport: Arc<T>,
	tokens: TokenManager<T>,
	dispatcher: CacheDispatcher,
	logins: LoginRoutes,
}
impl<T> RequestExecutor<T>
where
	T: ?Sized + Transport,
{
	/// Wires the executor to its collaborators.
	pub fn new(
		transport: Arc<T>,
		tokens: TokenManager<T>,
		dispatcher: CacheDispatcher,
		logins: LoginRoutes,
	) -> Self {
		Self { transport, tokens, dispatcher, logins }
	}

	/// Token manager backing this executor.
	pub fn tokens(&self) -> &TokenManager<T> {
		&self.tokens
	}

	/// Runs `call` with `method`, returning the response payload.
	///
	/// Cached `GET` responses are returned before any token lookup or network access. A 422 on
	/// a call that carried a token obtained here refreshes the app token and replays the request
	/// exactly once.
	pub async fn execute(&self, method: Method, call: ApiCall) -> Result<Payload> {
		obs::observe_call(CallKind::Request, method.as_str(), self.run(method, call)).await
	}

	async fn run(&self, method: Method, call: ApiCall) -> Result<Payload> {
		let plan = self.dispatcher.plan(method, &call.uri);

		if let Some(cached) = self.dispatcher.lookup(&plan).await? {
			return Ok(cached);
		}

		let mut request = ApiRequest::new(method, &call.uri, &call.data, call.headers.clone());
		let principal = call.auth.as_ref().filter(|_| !call.supplies_token());
		let mut sent = None;

		if let Some(principal) = principal {
			let token = self.tokens.token(principal.auth_type, principal.subject.as_ref()).await?;

			request.set_header(AUTHORIZATION, bearer(&token));
			sent = Some(token);
		}

		let mut payload = match http::exchange(self.transport.as_ref(), request.clone()).await {
			Err(Error::Status { status: EXPIRED_TOKEN_STATUS, .. }) if sent.is_some() => {
				obs::trace_token_retry(EXPIRED_TOKEN_STATUS, &request.uri);

				let fresh = self.tokens.refresh_app_token().await?;

				if principal.is_some_and(Principal::is_app) {
					request.set_header(AUTHORIZATION, bearer(&fresh));
					sent = Some(fresh);
				}

				http::exchange(self.transport.as_ref(), request).await?
			},
			result => result?,
		};
		let canonical = uri::canonical(&call.uri, false);

		if let Some(auth_type) = self.logins.auth_type(method, &canonical) {
			self.capture_login(auth_type, &payload).await?;
		} else if let Some(principal) = &call.auth {
			self.rotate(principal, sent.as_ref(), &payload).await?;
		}

		let kept = call.keep_embedded_auth.then(|| payload.clone());

		// Shared route entries never carry an embedded pair.
		OAuthPair::strip_from(&mut payload);
		self.dispatcher.commit(&plan, &payload).await?;

		Ok(kept.unwrap_or(payload))
	}

	async fn capture_login(&self, auth_type: AuthType, payload: &Payload) -> Result<()> {
		let subject = payload.get(LOGIN_SUBJECT_FIELD).and_then(SubjectId::from_value);
		let (Some(subject), Some(pair)) = (subject, OAuthPair::from_payload(payload)) else {
			return Err(Error::AuthFetch { auth_type });
		};

		self.tokens.store_token(&Principal::subject(auth_type, subject), &pair).await?;

		Ok(())
	}

	async fn rotate(
		&self,
		principal: &Principal,
		sent: Option<&TokenSecret>,
		payload: &Payload,
	) -> Result<()> {
		if !principal.is_app() && principal.subject.is_none() {
			return Ok(());
		}

		if let Some(pair) = OAuthPair::from_payload(payload).filter(|pair| pair.differs_from(sent))
			&& self.tokens.store_token(principal, &pair).await?.is_some()
		{
			obs::trace_token_rotation(principal.auth_type.as_str());
		}

		Ok(())
	}
}
impl<T> Clone for RequestExecutor<T>
where
	T: ?Sized + Transport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			tokens: self.tokens.clone(),
			dispatcher: self.dispatcher.clone(),
			logins: self.logins.clone(),
		}
	}
}
impl<T> Debug for RequestExecutor<T>
where
	T: ?Sized + Transport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestExecutor")
			.field("tokens", &self.tokens)
			.field("dispatcher", &self.dispatcher)
			.field("logins", &self.logins)
			.finish()
	}
}

fn bearer(token: &TokenSecret) -> String {
	format!("Bearer {}", token.expose())
}
