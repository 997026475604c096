//! Shortcode parsing.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::pattern::{
    shortcode_pattern, GROUP_ATTS, GROUP_CLOSING_TAG, GROUP_CONTENT, GROUP_TAG,
};

/// One parsed match of the tag pattern. Ephemeral, recomputed on every
/// query, never stored between operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedShortcode {
    /// Tag name, e.g. `us_btn`.
    pub tag: String,
    /// Raw attribute text, exactly as matched (leading space included).
    pub atts: String,
    /// The full matched text.
    pub input: String,
    /// Inner content, when the tag wraps content.
    pub content: String,
    /// Whether the match carried a `[/tag]` closing tag.
    pub has_closing_tag: bool,
}

fn first_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // A tag is only recognized when followed by whitespace, matching the
    // original engine: every element carries at least its usbid attribute.
    RE.get_or_init(|| Regex::new(r"^[^\n\r]*?\[(\w+)\s").unwrap())
}

fn html_wrap_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^<[^\[]+|[^\]]+$").unwrap())
}

/// Strips HTML wrapping: any `<...` run before the first `[` and any
/// non-`]` run at the end of the text.
pub fn remove_html_wrap(content: &str) -> String {
    html_wrap_re().replace_all(content, "").into_owned()
}

/// Parses the first shortcode found in `text`.
///
/// The tag to match is taken from the first `[tag ` occurrence; the
/// generated pattern for that tag is then applied and its first match
/// returned. `None` means nothing parseable was found, never an error.
pub fn parse_shortcode(text: &str) -> Option<ParsedShortcode> {
    if text.is_empty() {
        return None;
    }
    let text = remove_html_wrap(text);

    let first_tag = first_tag_re()
        .captures(&text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())?;

    let caps = shortcode_pattern(&first_tag).captures(&text)?;
    Some(ParsedShortcode {
        tag: caps[GROUP_TAG].to_string(),
        atts: caps
            .get(GROUP_ATTS)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default(),
        input: caps[0].to_string(),
        content: caps
            .get(GROUP_CONTENT)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default(),
        has_closing_tag: caps.get(GROUP_CLOSING_TAG).is_some(),
    })
}
