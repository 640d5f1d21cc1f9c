//! URI canonicalization shared by route matching, cache keys, and the mock dataset.

/// Canonicalizes `uri`: drops the query string and fragment, strips trailing slashes, and
/// forces (`with_slash`) or removes the leading slash.
///
/// The root path canonicalizes to `"/"` with a slash and `""` without one.
pub fn canonical(uri: &str, with_slash: bool) -> String {
	let path = strip_query(uri).trim_matches('/');

	if with_slash { format!("/{path}") } else { path.to_owned() }
}

/// Returns `uri` without its query string or fragment.
pub fn strip_query(uri: &str) -> &str {
	uri.split(['?', '#']).next().unwrap_or_default()
}

/// Ensures `uri` starts with a slash while leaving its query string untouched.
pub fn with_leading_slash(uri: &str) -> String {
	if uri.starts_with('/') { uri.to_owned() } else { format!("/{uri}") }
}

/// Splits a canonical path into its segments; the root yields none.
pub fn segments(canonical: &str) -> impl Iterator<Item = &str> {
	canonical.trim_matches('/').split('/').filter(|segment| !segment.is_empty())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn canonical_normalizes_slashes_and_query() {
		assert_eq!(canonical("/admin/42/", false), "admin/42");
		assert_eq!(canonical("admin/42", true), "/admin/42");
		assert_eq!(canonical("/admin/42?expand=roles", false), "admin/42");
		assert_eq!(canonical("admin/42#top", true), "/admin/42");
		assert_eq!(canonical("//admin//", false), "admin");
		assert_eq!(canonical("/", true), "/");
		assert_eq!(canonical("/", false), "");
	}

	#[test]
	fn leading_slash_keeps_query() {
		assert_eq!(with_leading_slash("admin/42?x=1"), "/admin/42?x=1");
		assert_eq!(with_leading_slash("/admin"), "/admin");
	}

	#[test]
	fn segments_skip_empty_parts() {
		assert_eq!(segments("admin/42").collect::<Vec<_>>(), ["admin", "42"]);
		assert_eq!(segments("").count(), 0);
		assert_eq!(segments("/a//b/").collect::<Vec<_>>(), ["a", "b"]);
	}
}
