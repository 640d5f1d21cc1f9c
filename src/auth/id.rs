//! Validated identifiers for the calling application and the subjects owning registered tokens.

// self
use crate::_prelude::*;

const MAX_LEN: usize = 128;

/// Reason an identifier was rejected.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum IdentifierError {
	/// Nothing was supplied.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Identifier kind (`App`, `Subject`).
		kind: &'static str,
	},
	/// Whitespace would corrupt cache keys and form fields.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Identifier kind (`App`, `Subject`).
		kind: &'static str,
	},
	/// Longer than [`MAX_LEN`] bytes.
	#[error("{kind} identifier exceeds {max} bytes.")]
	TooLong {
		/// Identifier kind (`App`, `Subject`).
		kind: &'static str,
		/// Maximum permitted length.
		max: usize,
	},
}

macro_rules! identifier {
	($(#[$meta:meta])* $name:ident => $kind:literal) => {
		$(#[$meta])*
		#[derive(Clone, PartialEq, Eq, Hash)]
		pub struct $name(String);
		impl $name {
			/// Validates and wraps `value`.
			pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
				let value = value.into();

				check($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
	};
}

identifier! {
	/// Credential identifier the application logs in with.
	AppId => "App"
}
identifier! {
	/// Admin or passport holder a registered token belongs to.
	SubjectId => "Subject"
}
impl SubjectId {
	/// Reads the `id` of a login or subject payload; the API sends strings or integers.
	pub fn from_value(value: &Value) -> Option<Self> {
		match value {
			Value::String(raw) => Self::new(raw.as_str()).ok(),
			Value::Number(number) => Self::new(number.to_string()).ok(),
			_ => None,
		}
	}
}

fn check(kind: &'static str, value: &str) -> Result<(), IdentifierError> {
	if value.is_empty() {
		Err(IdentifierError::Empty { kind })
	} else if value.chars().any(char::is_whitespace) {
		Err(IdentifierError::ContainsWhitespace { kind })
	} else if value.len() > MAX_LEN {
		Err(IdentifierError::TooLong { kind, max: MAX_LEN })
	} else {
		Ok(())
	}
}
