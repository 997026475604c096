//! Per-tag shortcode pattern generation.
//!
//! The pattern captures exactly 7 groups, in this order:
//!
//! 1. leading escape bracket (`[[` form)
//! 2. tag name
//! 3. raw attribute text
//! 4. self-closing slash
//! 5. inner content
//! 6. closing tag
//! 7. trailing escape bracket
//!
//! Callers index into groups positionally, so the order is a contract.

use regex::Regex;

/// Capture group indices of the generated pattern.
pub const GROUP_ESCAPE_OPEN: usize = 1;
pub const GROUP_TAG: usize = 2;
pub const GROUP_ATTS: usize = 3;
pub const GROUP_SELF_CLOSING: usize = 4;
pub const GROUP_CONTENT: usize = 5;
pub const GROUP_CLOSING_TAG: usize = 6;
pub const GROUP_ESCAPE_CLOSE: usize = 7;

/// Builds the matching pattern for one tag name.
///
/// The attribute run must start with a non-word character, which keeps
/// `vc_row` from matching a prefix of `vc_row_inner`. Content is lazy and
/// ends at the first `[/tag]` of the same tag; nested same-name tags are
/// therefore truncated at the inner closing tag (see the crate docs).
pub fn shortcode_pattern(tag: &str) -> Regex {
    let tag = regex::escape(tag);
    let src = format!(
        "\\[(\\[?)({tag})((?:[^\\w\\-\\]/][^\\]/]*(?:/[^\\]/]+)*/??)?)\
         (?:(/)\\]|\\](?:((?s:.)*?)(\\[/{tag}\\]))?)(\\]?)"
    );
    // The tag name is escaped above, so the source is always valid.
    Regex::new(&src).unwrap()
}
