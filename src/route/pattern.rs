//! Path templates with positional placeholder segments.

// self
use crate::{_prelude::*, error::ConfigError, uri};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
	Literal(String),
	Placeholder(String),
}

/// Compiled path template such as `admin/{id}/credentials`.
///
/// Literal segments match exactly (case-sensitive); a `{name}` segment matches any single
/// non-empty segment. Templates are canonicalized like URIs, so `/admin/{id}/` and
/// `admin/{id}` compile to the same pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoutePattern {
	template: String,
	segments: Vec<Segment>,
}
impl RoutePattern {
	/// Parses and validates `template`.
	pub fn parse(template: &str) -> Result<Self, ConfigError> {
		let invalid = |reason| ConfigError::InvalidRoute { template: template.to_owned(), reason };

		if template.contains(['?', '#']) {
			return Err(invalid("query strings and fragments are not allowed"));
		}

		let canonical = uri::canonical(template, false);

		if canonical.is_empty() {
			return Err(invalid("template is empty"));
		}

		let segments = uri::segments(&canonical)
			.map(|raw| match raw.strip_prefix('{').and_then(|rest| rest.strip_suffix('}')) {
				Some(name) if !name.is_empty() && !name.contains(['{', '}']) =>
					Ok(Segment::Placeholder(name.to_owned())),
				Some(_) => Err(invalid("placeholder must be a non-empty `{name}`")),
				None if raw.contains(['{', '}']) =>
					Err(invalid("placeholder must span a whole segment")),
				None => Ok(Segment::Literal(raw.to_owned())),
			})
			.collect::<Result<Vec<_>, _>>()?;

		Ok(Self { template: canonical, segments })
	}

	/// Canonical template text.
	pub fn template(&self) -> &str {
		&self.template
	}

	/// Number of segments in the template.
	pub fn len(&self) -> usize {
		self.segments.len()
	}

	/// Always `false`; empty templates are rejected by [`RoutePattern::parse`].
	pub fn is_empty(&self) -> bool {
		self.segments.is_empty()
	}

	/// Names of the placeholder segments, in order.
	pub fn placeholders(&self) -> impl Iterator<Item = &str> {
		self.segments.iter().filter_map(|segment| match segment {
			Segment::Placeholder(name) => Some(name.as_str()),
			Segment::Literal(_) => None,
		})
	}

	/// Returns `true` when `path` (already split into segments) satisfies the template.
	pub fn matches(&self, path: &[&str]) -> bool {
		path.len() == self.segments.len()
			&& self.segments.iter().zip(path).all(|(segment, actual)| match segment {
				Segment::Literal(expected) => expected == actual,
				Segment::Placeholder(_) => !actual.is_empty(),
			})
	}
}
impl Display for RoutePattern {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.template)
	}
}
