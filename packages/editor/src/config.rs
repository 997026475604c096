//! Builder configuration.
//!
//! Loaded once at session start and read-only afterwards: the containers
//! list, the `as_child`/`as_parent` relation tables, shortcode templates,
//! default attribute values and the editable-content map.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::EditorError;

/// A nesting constraint: either an exclusive allow-list or a deny-list of
/// comma-separated type names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Only(String),
    Except(String),
}

impl Relation {
    /// Whether `name` appears in the comma-list.
    pub fn contains(&self, name: &str) -> bool {
        let list = match self {
            Relation::Only(l) | Relation::Except(l) => l,
        };
        list.split(',').any(|item| item.trim() == name)
    }

    pub fn is_only(&self) -> bool {
        matches!(self, Relation::Only(_))
    }
}

/// The two relation tables, keyed by configuration name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Relations {
    #[serde(default)]
    pub as_child: BTreeMap<String, Relation>,
    #[serde(default)]
    pub as_parent: BTreeMap<String, Relation>,
}

impl Relations {
    pub fn is_empty(&self) -> bool {
        self.as_child.is_empty() && self.as_parent.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuilderConfig {
    /// Name of the implicit root container sentinel.
    #[serde(default = "default_main_container")]
    pub main_container: String,

    /// Types allowed to hold children.
    #[serde(default)]
    pub containers: Vec<String>,

    #[serde(default)]
    pub relations: Relations,

    /// Shortcode templates with `{%var%}` placeholders, keyed by type.
    #[serde(default)]
    pub templates: BTreeMap<String, String>,

    /// Default attribute values per configuration name; a `content` key
    /// holds the default inner content.
    #[serde(default)]
    pub default_values: BTreeMap<String, BTreeMap<String, String>>,

    /// Maps a configuration name to the attribute under which its inner
    /// content is edited.
    #[serde(default)]
    pub edit_content: BTreeMap<String, String>,

    /// UI strings, e.g. the default tab section title.
    #[serde(default)]
    pub translations: BTreeMap<String, String>,
}

fn default_main_container() -> String {
    "container".to_string()
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            main_container: default_main_container(),
            containers: Vec::new(),
            relations: Relations::default(),
            templates: BTreeMap::new(),
            default_values: BTreeMap::new(),
            edit_content: BTreeMap::new(),
            translations: BTreeMap::new(),
        }
    }
}

impl BuilderConfig {
    pub fn from_json(json: &str) -> Result<Self, EditorError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn translation<'a>(&'a self, key: &'a str) -> &'a str {
        self.translations.get(key).map(String::as_str).unwrap_or(key)
    }
}
