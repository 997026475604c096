//! Ordered attribute maps.
//!
//! Attributes keep their document order, so the map is a thin wrapper over
//! an ordered list of `name => value` pairs rather than a hash map.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// An attribute value.
///
/// Most values are plain text. Structured link attributes are kept as an
/// ordered field list and serialize to the `key:value|key:value` form.
/// `Null` values are dropped on serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttValue {
    Text(String),
    Fields(Vec<(String, String)>),
    Null,
}

impl AttValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for AttValue {
    fn from(s: &str) -> Self {
        AttValue::Text(s.to_string())
    }
}

impl From<String> for AttValue {
    fn from(s: String) -> Self {
        AttValue::Text(s)
    }
}

/// Ordered `name => value` attribute map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Atts {
    entries: Vec<(String, AttValue)>,
}

impl Atts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, name: &str) -> Option<&AttValue> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Text value of an attribute, `None` for missing or non-text values.
    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(AttValue::as_text)
    }

    /// Inserts or replaces a value, keeping the position of an existing key.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<AttValue> {
        let pos = self.entries.iter().position(|(k, _)| k == name)?;
        Some(self.entries.remove(pos).1)
    }

    /// Merges `other` on top of `self` (later values win).
    pub fn extend(&mut self, other: Atts) {
        for (k, v) in other.entries {
            self.set(k, v);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<AttValue>> FromIterator<(K, V)> for Atts {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut atts = Atts::new();
        for (k, v) in iter {
            atts.set(k, v);
        }
        atts
    }
}

fn att_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"([\w\-]+)="([^"]*)""#).unwrap())
}

/// Tokenizes `name="value"` pairs from a raw attribute string.
///
/// No-break and zero-width space characters are normalized to regular
/// spaces first; malformed tokens are silently skipped and values are
/// trimmed.
pub fn parse_atts(raw: &str) -> Atts {
    let mut result = Atts::new();
    if raw.is_empty() {
        return result;
    }
    let raw = raw.replace(['\u{00a0}', '\u{200b}'], " ");
    for caps in att_token_re().captures_iter(&raw) {
        result.set(&caps[1], caps[2].trim());
    }
    result
}

/// Serializes an attribute map back to `name="value"` tokens.
///
/// An attribute is omitted when its value is `Null`, the literal text
/// `undefined`, or equal to the default registered for that key. Field
/// lists flatten to `key:value|key:value`, dropping empty fields.
pub fn build_atts(atts: &Atts, defaults: &Atts) -> String {
    if atts.is_empty() {
        return String::new();
    }
    let mut result = Vec::new();
    for (name, value) in atts.iter() {
        let text = match value {
            AttValue::Null => continue,
            AttValue::Text(s) if s == "undefined" => continue,
            AttValue::Text(s) => s.clone(),
            AttValue::Fields(fields) => fields
                .iter()
                .filter(|(_, v)| !v.is_empty())
                .map(|(k, v)| format!("{k}:{v}"))
                .collect::<Vec<_>>()
                .join("|"),
        };
        if let Some(default) = defaults.get(name) {
            if default.as_text() == Some(text.as_str()) {
                continue;
            }
        }
        result.push(format!("{name}=\"{text}\""));
    }
    result.join(" ")
}
