//! Principal kinds, identifiers, and token models used for bearer authentication.

pub mod id;
pub mod secret;
pub mod token;

pub use id::*;
pub use secret::*;
pub use token::*;

// self
use crate::{_prelude::*, error::ValidationError};

/// Principal kinds a call can authenticate as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
	/// The application itself; the client fetches and refreshes this token on its own.
	App,
	/// An administrator whose token was registered after an admin login.
	Admin,
	/// A passport holder whose token was registered after a passport login.
	Passport,
}
impl AuthType {
	/// Returns a stable label suitable for cache keys, span fields, and messages.
	pub const fn as_str(self) -> &'static str {
		match self {
			AuthType::App => "app",
			AuthType::Admin => "admin",
			AuthType::Passport => "passport",
		}
	}

	/// Returns `true` for principal kinds whose tokens must be registered externally.
	pub const fn is_registrable(self) -> bool {
		!matches!(self, AuthType::App)
	}
}
impl Display for AuthType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for AuthType {
	type Err = ValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"app" => Ok(AuthType::App),
			"admin" => Ok(AuthType::Admin),
			"passport" => Ok(AuthType::Passport),
			_ => Err(ValidationError::UnknownAuthType { name: s.to_owned() }),
		}
	}
}
