//! # USBuilder Shortcode Text Model
//!
//! Lossless textual parse/patch of one shortcode at a time. The page
//! document is a single string of nested bracket tags, e.g.
//!
//! ```text
//! [vc_row usbid="vc_row:1"][vc_column usbid="vc_column:1"]...[/vc_column][/vc_row]
//! ```
//!
//! The document is never parsed into a persistent tree: every structural
//! query re-scans the string with a per-tag regular expression and works on
//! the first match. All parse functions return empty/neutral values on
//! failure; parsing never errors.
//!
//! ## Known limitation
//!
//! The generated tag pattern stops an element's content at the *first*
//! closing tag of the same name, so same-tag self-nesting deeper than what
//! the pattern can see is not handled. This matches the original engine and
//! is relied upon by the patching code; do not "fix" it here.

pub mod atts;
pub mod build;
pub mod parse;
pub mod pattern;
pub mod template;

pub use atts::{build_atts, parse_atts, AttValue, Atts};
pub use build::build_shortcode;
pub use parse::{parse_shortcode, remove_html_wrap, ParsedShortcode};
pub use pattern::shortcode_pattern;
pub use template::{build_string, TemplateSymbols};
