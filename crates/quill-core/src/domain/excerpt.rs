//! Plain-text excerpts derived from HTML post content.

use once_cell::sync::Lazy;
use regex::Regex;

/// Number of characters kept in an excerpt.
pub const EXCERPT_CHARS: usize = 150;

/// Appended when the stripped text was cut.
pub const ELLIPSIS: &str = "...";

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

/// Remove every `<...>` tag, leaving the text between them untouched.
///
/// A `<` with no closing `>` is kept as text.
pub fn strip_tags(html: &str) -> String {
    TAG_RE.replace_all(html, "").into_owned()
}

/// Derive the excerpt for `content`: tags stripped, cut to
/// [`EXCERPT_CHARS`] characters, with [`ELLIPSIS`] when anything was cut.
pub fn excerpt(content: &str) -> String {
    let text = strip_tags(content);

    match text.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}{}", &text[..cut], ELLIPSIS),
        None => text,
    }
}
