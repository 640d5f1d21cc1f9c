//! Client configuration: credentials, auth endpoints, connection parameters, and the
//! route-cache table.

// self
use crate::{
	_prelude::*,
	auth::{AppId, TokenSecret},
	error::ConfigError,
	route::RouteTable,
};

const DEFAULT_APP_AUTH_URI: &str = "/app/login";
const DEFAULT_ADMIN_AUTH_URI: &str = "/admin/login";
const DEFAULT_PASSPORT_AUTH_URI: &str = "/resource/passport/login";
const DEFAULT_MOCK_DATA_URI: &str = "/test/mock-data";
const DEFAULT_BASE_DOMAIN: &str = "cloud.zuggr.com";
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Top-level client configuration.
///
/// Deserializes from the same document shape the service hands out:
///
/// ```json
/// {
///   "app_id": "...", "app_secret": "...",
///   "client": { "node": "eu1" },
///   "routes": { "rules": { "admin/{id}": ["GET", "PUT"] } }
/// }
/// ```
///
/// Required keys are checked by [`Config::validate`] (and therefore at client construction)
/// rather than by serde, so a missing key surfaces as a typed [`ConfigError`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
	/// Application credential identifier.
	pub app_id: Option<String>,
	/// Application secret.
	pub app_secret: Option<TokenSecret>,
	/// Endpoint issuing app tokens.
	pub app_auth_uri: String,
	/// Admin login endpoint; successful logins register the admin's token.
	pub admin_auth_uri: String,
	/// Passport login endpoint; successful logins register the passport holder's token.
	pub passport_auth_uri: String,
	/// Endpoint serving the mock dataset.
	pub mock_data_uri: String,
	/// Serves every call from the mock dataset when `true`.
	pub mock: bool,
	/// Connection parameters.
	#[serde(alias = "client_config")]
	pub client: ClientConfig,
	/// Route-cache table.
	pub routes: RouteTable,
}
impl Config {
	/// Creates a configuration with the required keys and defaults for everything else.
	pub fn new(
		app_id: impl Into<String>,
		app_secret: impl Into<String>,
		node: impl Into<String>,
	) -> Self {
		Self {
			app_id: Some(app_id.into()),
			app_secret: Some(TokenSecret::new(app_secret)),
			client: ClientConfig { node: Some(node.into()), ..ClientConfig::default() },
			..Self::default()
		}
	}

	/// Parses a JSON document, reporting the path of the first offending field.
	pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
		let mut deserializer = serde_json::Deserializer::from_str(document);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| ConfigError::Parse { source })
	}

	/// Overrides the app-token endpoint.
	pub fn with_app_auth_uri(mut self, uri: impl Into<String>) -> Self {
		self.app_auth_uri = uri.into();

		self
	}

	/// Overrides the admin login endpoint.
	pub fn with_admin_auth_uri(mut self, uri: impl Into<String>) -> Self {
		self.admin_auth_uri = uri.into();

		self
	}

	/// Overrides the passport login endpoint.
	pub fn with_passport_auth_uri(mut self, uri: impl Into<String>) -> Self {
		self.passport_auth_uri = uri.into();

		self
	}

	/// Overrides the mock dataset endpoint.
	pub fn with_mock_data_uri(mut self, uri: impl Into<String>) -> Self {
		self.mock_data_uri = uri.into();

		self
	}

	/// Enables or disables mock mode.
	pub fn with_mock(mut self, mock: bool) -> Self {
		self.mock = mock;

		self
	}

	/// Replaces the connection parameters.
	pub fn with_client(mut self, client: ClientConfig) -> Self {
		self.client = client;

		self
	}

	/// Replaces the route-cache table.
	pub fn with_routes(mut self, routes: RouteTable) -> Self {
		self.routes = routes;

		self
	}

	/// Checks required keys and connection parameters.
	pub fn validate(&self) -> Result<(), ConfigError> {
		self.credentials()?;
		self.client.base_url()?;

		Ok(())
	}

	/// Returns the validated application credentials.
	pub fn credentials(&self) -> Result<Credentials, ConfigError> {
		let app_id = match self.app_id.as_deref() {
			None | Some("") => return Err(ConfigError::MissingAppId),
			Some(raw) => AppId::new(raw)?,
		};
		let app_secret = match &self.app_secret {
			Some(secret) if !secret.expose().is_empty() => secret.clone(),
			_ => return Err(ConfigError::MissingAppSecret),
		};

		Ok(Credentials { app_id, app_secret })
	}
}
impl Default for Config {
	fn default() -> Self {
		Self {
			app_id: None,
			app_secret: None,
			app_auth_uri: DEFAULT_APP_AUTH_URI.into(),
			admin_auth_uri: DEFAULT_ADMIN_AUTH_URI.into(),
			passport_auth_uri: DEFAULT_PASSPORT_AUTH_URI.into(),
			mock_data_uri: DEFAULT_MOCK_DATA_URI.into(),
			mock: false,
			client: ClientConfig::default(),
			routes: RouteTable::default(),
		}
	}
}

/// Connection parameters for the default transport.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
	/// Node subdomain, e.g. `eu1` for `https://eu1.cloud.zuggr.com`.
	pub node: Option<String>,
	/// Domain appended to the node.
	pub base_domain: String,
	/// Uses `https` when `true`, `http` otherwise.
	pub https: bool,
	/// Request timeout in seconds, enforced by the transport.
	pub timeout: u64,
	/// Full base URL replacing the node/domain composition (proxies, local servers).
	pub endpoint: Option<String>,
}
impl ClientConfig {
	/// Resolves the base URL every request URI is joined onto.
	pub fn base_url(&self) -> Result<Url, ConfigError> {
		let node = match self.node.as_deref() {
			None | Some("") => return Err(ConfigError::MissingNode),
			Some(node) => node,
		};
		let raw = match &self.endpoint {
			Some(endpoint) => endpoint.clone(),
			None => {
				let scheme = if self.https { "https" } else { "http" };

				format!("{scheme}://{node}.{}", self.base_domain)
			},
		};

		Url::parse(&raw).map_err(|source| ConfigError::InvalidEndpoint { source })
	}

	/// Overrides the base URL.
	pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.endpoint = Some(endpoint.into());

		self
	}
}
impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			node: None,
			base_domain: DEFAULT_BASE_DOMAIN.into(),
			https: true,
			timeout: DEFAULT_TIMEOUT_SECS,
			endpoint: None,
		}
	}
}

/// Validated application credentials; immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
	/// Application credential identifier.
	pub app_id: AppId,
	/// Application secret.
	pub app_secret: TokenSecret,
}
impl Credentials {
	/// Form fields sent to the app-token endpoint.
	pub fn form(&self) -> Payload {
		let mut form = Payload::new();

		form.insert("credential_id".into(), Value::from(self.app_id.to_string()));
		form.insert("secret".into(), Value::from(self.app_secret.expose()));

		form
	}
}
