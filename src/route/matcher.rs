//! Compiled route table: first-match lookup of primary and ally templates.

// self
use crate::{
	_prelude::*,
	error::ConfigError,
	http::Method,
	route::{MethodSet, RoutePattern, RouteTable},
	uri,
};

#[derive(Clone, Debug)]
struct CompiledAlly {
	pattern: RoutePattern,
	methods: MethodSet,
	suffix_len: usize,
}

#[derive(Clone, Debug)]
struct CompiledRoute {
	pattern: RoutePattern,
	methods: MethodSet,
	allies: Vec<CompiledAlly>,
}

/// Result of matching a request against the table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteMatch<'a> {
	/// Primary template owning the cache entry.
	pub primary: &'a str,
	/// Ally template that matched, if the primary itself did not.
	pub ally: Option<&'a str>,
	/// Canonical URI (no leading slash) whose hash is the cache key.
	pub key_path: String,
}

/// Immutable matcher compiled once from a [`RouteTable`].
///
/// Primaries are tried in table order, each immediately followed by its allies. A template only
/// matches when the path fits and the method is in its set.
#[derive(Clone, Debug, Default)]
pub struct RouteMatcher {
	routes: Vec<CompiledRoute>,
}
impl RouteMatcher {
	/// Compiles `table`, validating every template.
	pub fn compile(table: &RouteTable) -> Result<Self, ConfigError> {
		let mut routes = table
			.rules
			.iter()
			.map(|rule| {
				Ok(CompiledRoute {
					pattern: RoutePattern::parse(&rule.template)?,
					methods: non_empty(&rule.template, &rule.methods)?,
					allies: Vec::new(),
				})
			})
			.collect::<Result<Vec<_>, ConfigError>>()?;

		for group in &table.allies {
			let primary = uri::canonical(&group.primary, false);
			let route = routes
				.iter_mut()
				.find(|route| route.pattern.template() == primary)
				.ok_or_else(|| ConfigError::UnknownPrimary {
					primary: group.primary.clone(),
					ally: group.allies.first().map(|rule| rule.template.clone()).unwrap_or_default(),
				})?;

			for rule in &group.allies {
				let pattern = RoutePattern::parse(&rule.template)?;
				let suffix_len = pattern.len().saturating_sub(route.pattern.len());

				route.allies.push(CompiledAlly {
					methods: non_empty(&rule.template, &rule.methods)?,
					pattern,
					suffix_len,
				});
			}
		}

		Ok(Self { routes })
	}

	/// Returns `true` when the table has no rules.
	pub fn is_empty(&self) -> bool {
		self.routes.is_empty()
	}

	/// Finds the first template matching `method` + `uri`.
	///
	/// For an ally, the key path is the request path with the ally's trailing segments (those
	/// beyond the primary's length) stripped, so sub-resource writes land on the parent entry.
	pub fn find(&self, method: Method, uri: &str) -> Option<RouteMatch<'_>> {
		let canonical = uri::canonical(uri, false);
		let path = uri::segments(&canonical).collect::<Vec<_>>();

		for route in &self.routes {
			if route.methods.contains(&method) && route.pattern.matches(&path) {
				return Some(RouteMatch {
					primary: route.pattern.template(),
					ally: None,
					key_path: path.join("/"),
				});
			}

			for ally in &route.allies {
				if ally.methods.contains(&method) && ally.pattern.matches(&path) {
					let kept = &path[..path.len() - ally.suffix_len];

					return Some(RouteMatch {
						primary: route.pattern.template(),
						ally: Some(ally.pattern.template()),
						key_path: kept.join("/"),
					});
				}
			}
		}

		None
	}
}

fn non_empty(template: &str, methods: &MethodSet) -> Result<MethodSet, ConfigError> {
	if methods.is_empty() {
		return Err(ConfigError::InvalidRoute {
			template: template.to_owned(),
			reason: "at least one method is required",
		});
	}

	Ok(methods.clone())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn matcher() -> RouteMatcher {
		let table = RouteTable::new()
			.rule("admin/{id}", [Method::Get, Method::Put, Method::Delete])
			.ally("admin/{id}", "admin/{id}/credentials", [Method::Put])
			.ally("admin/{id}", "admin/{id}/roles/{role}", [Method::Post, Method::Delete])
			.rule("app/config", [Method::Get]);

		RouteMatcher::compile(&table).expect("Route table fixture should compile.")
	}

	#[test]
	fn primary_matches_with_canonical_key() {
		let matcher = matcher();
		let hit = matcher.find(Method::Get, "/admin/42/?expand=roles").expect("GET should match.");

		assert_eq!(hit.primary, "admin/{id}");
		assert_eq!(hit.ally, None);
		assert_eq!(hit.key_path, "admin/42");
	}

	#[test]
	fn ally_redirects_to_primary_key() {
		let matcher = matcher();
		let hit = matcher.find(Method::Put, "/admin/42/credentials").expect("PUT should match.");

		assert_eq!(hit.primary, "admin/{id}");
		assert_eq!(hit.ally, Some("admin/{id}/credentials"));
		assert_eq!(hit.key_path, "admin/42");

		let hit = matcher.find(Method::Delete, "admin/7/roles/editor").expect("DELETE should match.");

		assert_eq!(hit.key_path, "admin/7");
	}

	#[test]
	fn primary_and_ally_agree_on_key_for_doubled_slashes() {
		let matcher = matcher();
		let read = matcher.find(Method::Get, "admin//42").expect("GET should match.");
		let write = matcher.find(Method::Put, "admin/42//credentials").expect("PUT should match.");

		assert_eq!(read.key_path, "admin/42");
		assert_eq!(read.key_path, write.key_path);
	}

	#[test]
	fn method_outside_set_is_not_a_match() {
		let matcher = matcher();

		assert!(matcher.find(Method::Post, "/admin/42").is_none());
		assert!(matcher.find(Method::Get, "/admin/42/credentials").is_none());
		assert!(matcher.find(Method::Get, "/unknown/42").is_none());
		assert!(matcher.find(Method::Get, "/app/config").is_some());
	}

	#[test]
	fn first_match_wins_in_table_order() {
		let table = RouteTable::new()
			.rule("items/{id}", [Method::Get])
			.rule("items/special", [Method::Get]);
		let matcher = RouteMatcher::compile(&table).expect("Table should compile.");
		let hit = matcher.find(Method::Get, "/items/special").expect("GET should match.");

		assert_eq!(hit.primary, "items/{id}");
	}

	#[test]
	fn inconsistent_ally_naming_strips_mechanically() {
		let table = RouteTable::new()
			.rule("admin/{id}", [Method::Get])
			.ally("admin/{id}", "administrators/{id}/credentials", [Method::Put]);
		let matcher = RouteMatcher::compile(&table).expect("Table should compile.");
		let hit = matcher.find(Method::Put, "/administrators/9/credentials").expect("PUT should match.");

		assert_eq!(hit.primary, "admin/{id}");
		assert_eq!(hit.key_path, "administrators/9");
	}

	#[test]
	fn compile_rejects_unknown_primary_and_empty_methods() {
		let orphan = RouteTable::new().ally("admin/{id}", "admin/{id}/credentials", [Method::Put]);

		assert!(matches!(RouteMatcher::compile(&orphan), Err(ConfigError::UnknownPrimary { .. })));

		let empty = RouteTable::new().rule("admin/{id}", Vec::<Method>::new());

		assert!(matches!(RouteMatcher::compile(&empty), Err(ConfigError::InvalidRoute { .. })));
	}
}
