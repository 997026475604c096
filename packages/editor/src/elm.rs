//! Element identifiers.
//!
//! An element id has the shape `"<type>:<index>"`, e.g. `us_btn:1`. Ids are
//! plain strings everywhere; the document root sentinel (`container` by
//! default) is deliberately not a valid id.

use regex::Regex;
use std::sync::OnceLock;

fn id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([\w\-]+):(\d+)$").unwrap())
}

/// True for `"<type>:<index>"`-shaped ids.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id_re().is_match(id)
}

/// The type part of an id (`us_btn:1` → `us_btn`); empty for invalid ids.
pub fn elm_type(id: &str) -> &str {
    if !is_valid_id(id) {
        return "";
    }
    id.split(':').next().unwrap_or("")
}

/// The configuration name of an id or type: the type with a leading `us_`
/// prefix stripped (`us_btn:1` → `btn`, `vc_row` → `vc_row`).
pub fn elm_name(id_or_type: &str) -> &str {
    let ty = if is_valid_id(id_or_type) {
        elm_type(id_or_type)
    } else {
        id_or_type
    };
    ty.strip_prefix("us_").unwrap_or(ty)
}
