//! Client-level error types shared across the executor, token manager, mock responder, and
//! cache layers.

// self
use crate::{
	_prelude::*,
	auth::{AuthType, IdentifierError},
	http::Method,
};

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Cache-store failure.
	#[error("{0}")]
	Cache(
		#[from]
		#[source]
		crate::cache::CacheError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Caller-supplied input failed validation.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Response body could not be decoded.
	#[error(transparent)]
	Response(#[from] ResponseError),

	/// The API answered with a non-success HTTP status.
	#[error("Zuggr Cloud responded with HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Decoded error body, when the API sent a JSON object.
		body: Option<Payload>,
	},
	/// The token endpoint response lacked `access_token` or `expires_in`.
	#[error("Failed to fetch the {auth_type} token from Zuggr Cloud.")]
	AuthFetch {
		/// Principal kind whose token was being fetched.
		auth_type: AuthType,
	},
	/// No token has been registered for the requested principal.
	#[error(
		"No cached {auth_type} token for subject {}; register one before calling.",
		.subject.as_deref().unwrap_or("<none>")
	)]
	AuthCacheMiss {
		/// Principal kind that was requested.
		auth_type: AuthType,
		/// Subject identifier that was requested.
		subject: Option<String>,
	},
	/// The mock dataset response was malformed.
	#[error("Failed to fetch mock data from Zuggr Cloud: {reason}.")]
	MockFetch {
		/// What was wrong with the dataset response.
		reason: String,
	},
	/// The mock dataset has no canned response for the request.
	#[error("Could not find [{method}] {uri} in mock data.")]
	MockRouteNotFound {
		/// Requested method.
		method: Method,
		/// Canonical URI that was looked up.
		uri: String,
	},
}
impl Error {
	/// Returns the HTTP status carried by [`Error::Status`], if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Status { status, .. } => Some(*status),
			_ => None,
		}
	}
}

/// Configuration and construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// `app_id` is missing or empty.
	#[error("Required `app_id` key not supplied in config.")]
	MissingAppId,
	/// `app_secret` is missing or empty.
	#[error("Required `app_secret` key not supplied in config.")]
	MissingAppSecret,
	/// `app_id` is not a usable identifier.
	#[error("Configured `app_id` is invalid.")]
	InvalidAppId {
		/// Identifier validation failure.
		#[from]
		source: IdentifierError,
	},
	/// `client.node` is missing or empty.
	#[error("Required `node` key not supplied in client config.")]
	MissingNode,
	/// The configured endpoint could not be parsed into a URL.
	#[error("Client endpoint is invalid.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A route template in the cache table is malformed.
	#[error("Route template `{template}` is invalid: {reason}.")]
	InvalidRoute {
		/// Offending template.
		template: String,
		/// Why it was rejected.
		reason: &'static str,
	},
	/// An ally was declared for a primary template missing from the rules.
	#[error("Ally `{ally}` refers to unknown primary route `{primary}`.")]
	UnknownPrimary {
		/// Primary template named by the ally table.
		primary: String,
		/// Ally template.
		ally: String,
	},
	/// The configuration document could not be parsed.
	#[error("Config document is malformed.")]
	Parse {
		/// Structured parsing failure including the JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Caller input rejected before any network or cache access.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ValidationError {
	/// Auth type name is not one of `app`, `admin`, `passport`.
	#[error("Unknown auth type `{name}`.")]
	UnknownAuthType {
		/// Name that failed to parse.
		name: String,
	},
	/// App tokens are fetched by the client and cannot be registered.
	#[error("The {auth_type} token cannot be registered externally.")]
	NotRegistrable {
		/// Rejected auth type.
		auth_type: AuthType,
	},
	/// Subject info carries no usable `id`.
	#[error("Subject info must carry an `id`.")]
	MissingSubjectId,
	/// OAuth pair lacks `access_token` or an integer `expires_in`.
	#[error("OAuth pair must carry `access_token` and an integer `expires_in`.")]
	MalformedOAuthPair,
	/// `expires_in` does not outlast the safety margin.
	#[error("The expires_in value {expires_in} does not exceed the {margin}s safety margin.")]
	ExpiresInTooShort {
		/// Server-declared lifetime in seconds.
		expires_in: i64,
		/// Safety margin in seconds.
		margin: i64,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling Zuggr Cloud.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling Zuggr Cloud.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Response bodies that could not be turned into a [`Payload`].
#[derive(Debug, ThisError)]
pub enum ResponseError {
	/// Body was not valid JSON.
	#[error("Zuggr Cloud returned malformed JSON.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
	/// Body was valid JSON but not an object.
	#[error("Zuggr Cloud returned a JSON {kind} where an object was expected.")]
	NotAnObject {
		/// JSON kind that was received.
		kind: &'static str,
		/// HTTP status code of the response.
		status: u16,
	},
}
