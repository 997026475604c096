//! Shortcode serialization.

use crate::atts::{build_atts, parse_atts, Atts};
use crate::parse::ParsedShortcode;

/// Reassembles a shortcode string from its parsed parts.
///
/// When `atts_defaults` is non-empty the raw attribute text is re-tokenized
/// and default-valued attributes are dropped. The closing tag is emitted
/// only when the parsed form carried one.
pub fn build_shortcode(shortcode: &ParsedShortcode, atts_defaults: Option<&Atts>) -> String {
    if shortcode.tag.is_empty() {
        return String::new();
    }
    let mut result = format!("[{}", shortcode.tag);
    if !shortcode.atts.is_empty() || atts_defaults.is_some() {
        let atts = match atts_defaults {
            Some(defaults) if !defaults.is_empty() => {
                build_atts(&parse_atts(&shortcode.atts), defaults)
            }
            _ => shortcode.atts.clone(),
        };
        let atts = atts.trim();
        if !atts.is_empty() {
            result.push(' ');
            result.push_str(atts);
        }
    }
    result.push(']');
    result.push_str(&shortcode.content);
    if shortcode.has_closing_tag {
        result.push_str(&format!("[/{}]", shortcode.tag));
    }
    result
}
