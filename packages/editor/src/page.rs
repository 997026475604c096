//! Page data and the last-saved snapshot.

use serde::{Deserialize, Serialize};

/// Everything the save endpoint persists. `page_meta` and `fields` keep
/// their configuration order, so both are ordered pair lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageData {
    pub content: String,
    pub custom_css: String,
    pub page_meta: Vec<(String, String)>,
    pub fields: Vec<(String, String)>,
}

impl PageData {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn meta(&self, name: &str) -> Option<&str> {
        self.page_meta
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_meta(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.page_meta.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.page_meta.push((name, value)),
        }
    }
}
