//! `{%var%}`-style template substitution for default-content generation.

use regex::Regex;
use std::collections::HashMap;

/// Placeholder delimiters. The defaults match the configuration templates,
/// e.g. `[vc_row usbid="{%vc_row%}"]{%content%}[/vc_row]`.
#[derive(Debug, Clone)]
pub struct TemplateSymbols {
    pub start: String,
    pub end: String,
}

impl Default for TemplateSymbols {
    fn default() -> Self {
        Self {
            start: "{%".into(),
            end: "%}".into(),
        }
    }
}

/// Replaces every `{%name%}` placeholder with the matching parameter value,
/// or an empty string for missing parameters.
pub fn build_string(
    template: &str,
    params: &HashMap<String, String>,
    symbols: &TemplateSymbols,
) -> String {
    let src = format!(
        "{}([A-Za-z_\\d]+){}",
        regex::escape(&symbols.start),
        regex::escape(&symbols.end)
    );
    // Delimiters are escaped, so the source is always valid.
    let re = Regex::new(&src).unwrap();
    re.replace_all(template, |caps: &regex::Captures<'_>| {
        params.get(&caps[1]).cloned().unwrap_or_default()
    })
    .into_owned()
}
