//! Transport primitives for calls to Zuggr Cloud.
//!
//! The module exposes [`Transport`], the client's only dependency on an HTTP stack, together
//! with the request/response values it exchanges. [`ApiRequest`] already carries the encoded
//! data (query pairs for `GET`, form pairs otherwise) so transports only move bytes.

// std
#[cfg(feature = "reqwest")] use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	error::{ResponseError, TransportError},
	uri,
};
#[cfg(feature = "reqwest")]
use crate::{config::ClientConfig, error::ConfigError};

/// Boxed future returned by [`Transport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing one API call.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can back every
/// component of a client. Deadlines, TLS, and connection reuse are the implementation's
/// concern; the client never imposes its own timeout or socket-level retry.
pub trait Transport
where
	Self: 'static + Send + Sync,
{
	/// Executes `request`, resolving to whatever status the server answered with.
	fn send(&self, request: ApiRequest) -> TransportFuture<'_>;
}

/// HTTP verbs supported by the API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum Method {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `DELETE`
	Delete,
}
impl Method {
	/// Every supported method, in declaration order.
	pub const ALL: [Method; 4] = [Method::Get, Method::Post, Method::Put, Method::Delete];

	/// Returns the upper-case wire name.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for Method {
	type Err = UnknownMethod;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Method::ALL
			.into_iter()
			.find(|method| method.as_str().eq_ignore_ascii_case(s.trim()))
			.ok_or_else(|| UnknownMethod { name: s.to_owned() })
	}
}

impl TryFrom<String> for Method {
	type Error = UnknownMethod;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}

/// Error returned when a method name is not supported.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Unsupported HTTP method `{name}`.")]
pub struct UnknownMethod {
	/// Name that failed to parse.
	pub name: String,
}

/// Encoded request data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestBody {
	/// Pairs appended to the query string (`GET`).
	Query(Vec<(String, String)>),
	/// Pairs sent as an `application/x-www-form-urlencoded` body (every other verb).
	Form(Vec<(String, String)>),
}
impl RequestBody {
	/// Encodes `data` the way `method` expects it.
	pub fn encode(method: Method, data: &Payload) -> Self {
		let pairs = data.iter().map(|(key, value)| (key.clone(), form_value(value))).collect();

		match method {
			Method::Get => Self::Query(pairs),
			_ => Self::Form(pairs),
		}
	}

	/// Returns the encoded pairs regardless of placement.
	pub fn pairs(&self) -> &[(String, String)] {
		match self {
			Self::Query(pairs) | Self::Form(pairs) => pairs,
		}
	}
}

/// One outbound API call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiRequest {
	/// HTTP verb.
	pub method: Method,
	/// Request URI relative to the client base URL, always with a leading slash.
	pub uri: String,
	/// Encoded data.
	pub body: RequestBody,
	/// Outgoing headers.
	pub headers: BTreeMap<String, String>,
}
impl ApiRequest {
	/// Builds a request, encoding `data` according to `method`.
	pub fn new(
		method: Method,
		uri: &str,
		data: &Payload,
		headers: BTreeMap<String, String>,
	) -> Self {
		Self {
			method,
			uri: uri::with_leading_slash(uri),
			body: RequestBody::encode(method, data),
			headers,
		}
	}

	/// Returns the request path without its query string.
	pub fn path(&self) -> &str {
		uri::strip_query(&self.uri)
	}

	/// Looks up a header case-insensitively.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}

	/// Inserts or replaces a header, dropping any differently-cased duplicate.
	pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
		self.headers.retain(|key, _| !key.eq_ignore_ascii_case(name));
		self.headers.insert(name.to_owned(), value.into());
	}
}

/// Raw response returned by a [`Transport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Undecoded body bytes.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Creates a response from its parts.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, body: body.into() }
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Decodes the body into a [`Payload`]; an empty body decodes to an empty object.
	pub fn payload(&self) -> Result<Payload, ResponseError> {
		if self.body.iter().all(u8::is_ascii_whitespace) {
			return Ok(Payload::new());
		}

		let mut deserializer = serde_json::Deserializer::from_slice(&self.body);
		let value: Value = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| ResponseError::Parse { source, status: self.status })?;

		match value {
			Value::Object(map) => Ok(map),
			other => Err(ResponseError::NotAnObject { kind: json_kind(&other), status: self.status }),
		}
	}

	/// Converts the response into a payload, mapping non-2xx statuses to [`Error::Status`].
	pub fn into_result(self) -> Result<Payload> {
		if self.is_success() {
			return Ok(self.payload()?);
		}

		Err(Error::Status { status: self.status, body: self.payload().ok() })
	}
}

/// Sends `request` through `transport` and decodes the outcome.
pub(crate) async fn exchange<T>(transport: &T, request: ApiRequest) -> Result<Payload>
where
	T: ?Sized + Transport,
{
	transport.send(request).await?.into_result()
}

/// [`Transport`] backed by a shared [`ReqwestClient`] rooted at the configured base URL.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
	client: ReqwestClient,
	base_url: Url,
}
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds a transport honoring the node, domain, scheme, and timeout of `config`.
	pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.timeout(StdDuration::from_secs(config.timeout))
			.redirect(reqwest::redirect::Policy::none())
			.build()?;

		Ok(Self::with_client(client, config.base_url()?))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient, base_url: Url) -> Self {
		Self { client, base_url }
	}

	/// Base URL every request URI is resolved against.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}
}
#[cfg(feature = "reqwest")]
impl Transport for ReqwestTransport {
	fn send(&self, request: ApiRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let url = self
				.base_url
				.join(request.uri.trim_start_matches('/'))
				.map_err(TransportError::network)?;
			let method = match request.method {
				Method::Get => reqwest::Method::GET,
				Method::Post => reqwest::Method::POST,
				Method::Put => reqwest::Method::PUT,
				Method::Delete => reqwest::Method::DELETE,
			};
			let mut builder = self.client.request(method, url).header("accept", "application/json");

			for (name, value) in &request.headers {
				builder = builder.header(name.as_str(), value.as_str());
			}

			builder = match &request.body {
				RequestBody::Query(pairs) if !pairs.is_empty() => builder.query(pairs),
				RequestBody::Form(pairs) => builder.form(pairs),
				RequestBody::Query(_) => builder,
			};

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let body = response.bytes().await?.to_vec();

			Ok(ApiResponse { status, body })
		})
	}
}

fn form_value(value: &Value) -> String {
	match value {
		Value::Null => String::new(),
		Value::String(raw) => raw.clone(),
		Value::Bool(flag) => String::from(if *flag { "1" } else { "0" }),
		other => other.to_string(),
	}
}

fn json_kind(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}
