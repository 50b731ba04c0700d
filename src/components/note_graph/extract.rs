//! Wiki-link and tag scanning over note bodies.

use std::sync::LazyLock;

use regex::Regex;

static WIKILINK_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\[\[(.*?)\]\]").expect("wikilink pattern is valid"));
static TAG_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"#(\w+)").expect("tag pattern is valid"));

/// References inside `[[...]]`, left to right, duplicates and casing kept.
/// An empty pair `[[]]` yields an empty reference.
pub fn extract_links(body: &str) -> Vec<String> {
	WIKILINK_RE
		.captures_iter(body)
		.filter_map(|c| c.get(1))
		.map(|m| m.as_str().to_string())
		.collect()
}

/// `#word` tokens without the leading `#`.
pub fn extract_tags(body: &str) -> Vec<String> {
	TAG_RE
		.captures_iter(body)
		.filter_map(|c| c.get(1))
		.map(|m| m.as_str().to_string())
		.collect()
}
