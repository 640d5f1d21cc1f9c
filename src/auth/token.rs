//! OAuth pairs returned by the API and the cached token model derived from them.

// self
use crate::{
	_prelude::*,
	auth::{AuthType, SubjectId, TokenSecret},
};

/// Seconds subtracted from a server-declared lifetime before a token is cached.
pub const SAFETY_MARGIN: Duration = Duration::seconds(60);

/// Payload field carrying the bearer token.
pub const ACCESS_TOKEN_FIELD: &str = "access_token";
/// Payload field carrying the token lifetime in seconds.
pub const EXPIRES_IN_FIELD: &str = "expires_in";

/// Principal a call authenticates as: an auth type plus the subject it belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Principal {
	/// Principal kind.
	pub auth_type: AuthType,
	/// Subject owning the token; unused for [`AuthType::App`].
	pub subject: Option<SubjectId>,
}
impl Principal {
	/// The application principal.
	pub const fn app() -> Self {
		Self { auth_type: AuthType::App, subject: None }
	}

	/// A registered principal identified by `subject`.
	pub fn subject(auth_type: AuthType, subject: SubjectId) -> Self {
		Self { auth_type, subject: Some(subject) }
	}

	/// Returns `true` for the application principal.
	pub fn is_app(&self) -> bool {
		matches!(self.auth_type, AuthType::App)
	}
}

/// `access_token` + `expires_in` block issued by the token endpoint or embedded in a response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OAuthPair {
	/// Bearer token value.
	pub access_token: TokenSecret,
	/// Server-declared lifetime in seconds.
	pub expires_in: i64,
}
impl OAuthPair {
	/// Creates a pair from raw parts.
	pub fn new(access_token: impl Into<String>, expires_in: i64) -> Self {
		Self { access_token: TokenSecret::new(access_token), expires_in }
	}

	/// Extracts a pair when `payload` carries a string `access_token` and an integer
	/// `expires_in`.
	pub fn from_payload(payload: &Payload) -> Option<Self> {
		let access_token = payload.get(ACCESS_TOKEN_FIELD)?.as_str()?;
		let expires_in = payload.get(EXPIRES_IN_FIELD)?.as_i64()?;

		Some(Self::new(access_token, expires_in))
	}

	/// Removes the pair's fields from `payload`.
	pub fn strip_from(payload: &mut Payload) {
		payload.remove(ACCESS_TOKEN_FIELD);
		payload.remove(EXPIRES_IN_FIELD);
	}

	/// Lifetime to cache the token for: `expires_in` minus [`SAFETY_MARGIN`].
	///
	/// Returns `None` when nothing of the lifetime survives the margin.
	pub fn effective_ttl(&self) -> Option<Duration> {
		Duration::seconds(self.expires_in).checked_sub(SAFETY_MARGIN).filter(|ttl| ttl.is_positive())
	}

	/// Returns `true` when the pair carries a token different from `sent`.
	pub fn differs_from(&self, sent: Option<&TokenSecret>) -> bool {
		sent.is_none_or(|token| token != &self.access_token)
	}
}

/// Token as stored in the cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthToken {
	/// Bearer token value.
	pub value: TokenSecret,
	/// TTL the cache entry was written with.
	pub effective_ttl: Duration,
}
