//! Document graph queries.
//!
//! The shortcode text is the only model; there is no retained tree. Every
//! query re-derives structure from `page.content` by scanning with the
//! shortcode pattern, so queries can never drift out of sync with the text.

use regex::Regex;

use usbuilder_shortcode::{
    parse_atts, parse_shortcode, shortcode_pattern, ParsedShortcode,
};

use crate::elm::{elm_type, is_valid_id};
use crate::session::BuilderSession;

/// Safety cap for scans over untrusted content.
pub const ITERATION_CAP: usize = 9999;

/// `\[{type}[^\]]+usbid="{id}"` locates the opening tag of one element.
fn elm_start_regex(id: &str) -> Regex {
    let pattern = format!(
        r#"\[{}[^\]]+usbid="{}""#,
        regex::escape(elm_type(id)),
        regex::escape(id)
    );
    Regex::new(&pattern).unwrap()
}

impl BuilderSession {
    pub fn is_main_container(&self, id: &str) -> bool {
        id == self.config.main_container
    }

    pub fn does_elm_exist(&self, id: &str) -> bool {
        if !is_valid_id(id) || self.page.content.is_empty() {
            return false;
        }
        elm_start_regex(id).is_match(&self.page.content)
    }

    /// Returns the element's full shortcode text, children included, or an
    /// empty string when the id is invalid or absent.
    pub fn get_elm_shortcode(&self, id: &str) -> String {
        if !is_valid_id(id) {
            return String::new();
        }
        let needle = format!(r#"usbid="{id}""#);
        shortcode_pattern(elm_type(id))
            .find_iter(&self.page.content)
            .find(|m| m.as_str().contains(&needle))
            .map(|m| m.as_str().to_owned())
            .unwrap_or_default()
    }

    pub fn parse_elm_shortcode(&self, id: &str) -> Option<ParsedShortcode> {
        parse_shortcode(&self.get_elm_shortcode(id))
    }

    /// Resolves the direct parent: another element's id, the main container
    /// for root-level elements, or `None` when the element does not exist.
    pub fn get_elm_parent_id(&self, id: &str) -> Option<String> {
        if self.is_main_container(id) || !self.does_elm_exist(id) {
            return None;
        }
        let content = &self.page.content;
        let elm_regex = elm_start_regex(id);
        let start = elm_regex.find(content)?.start();
        let prev_content = &content[..start];
        // Strip every shortcode of this type from the tail so its closing
        // tags do not show up as parent candidates.
        let next_content =
            shortcode_pattern(elm_type(id)).replace_all(&content[start..], "");

        let closing_re = Regex::new(r"\[/(\w+)").unwrap();
        for caps in closing_re.captures_iter(&next_content) {
            let tag = &caps[1];
            let open_re =
                Regex::new(&format!(r"\[{}\s([^\]]+)", regex::escape(tag))).unwrap();
            let close_re =
                Regex::new(&format!(r"\[/{}[\s\]]", regex::escape(tag))).unwrap();
            // The candidate is the first opening tag that is never closed
            // before our element starts.
            for m in open_re.captures_iter(prev_content) {
                let end = match m.get(0) {
                    Some(whole) => whole.end(),
                    None => continue,
                };
                if close_re.is_match(&prev_content[end..]) {
                    continue;
                }
                if let Some(usbid) = parse_atts(&m[1]).get_text("usbid") {
                    if elm_regex.is_match(&self.get_elm_shortcode(usbid)) {
                        return Some(usbid.to_owned());
                    }
                }
                break;
            }
        }
        Some(self.config.main_container.clone())
    }

    /// Direct children ids in document order.
    pub fn get_elm_children(&self, id: &str) -> Vec<String> {
        let is_main = self.is_main_container(id);
        if id.is_empty() || !(is_valid_id(id) || is_main) {
            return Vec::new();
        }
        let content = if is_main {
            self.page.content.clone()
        } else {
            self.parse_elm_shortcode(id)
                .map(|parsed| parsed.content)
                .unwrap_or_default()
        };
        shortcode_sibling_ids(&content)
    }

    /// All descendant ids, depth-first. Non-containers have none.
    pub fn get_elm_all_children(&self, id: &str) -> Vec<String> {
        if !is_valid_id(id) || !self.is_elm_container(id) {
            return Vec::new();
        }
        let mut results = Vec::new();
        for child_id in self.get_elm_children(id) {
            if !is_valid_id(&child_id) {
                continue;
            }
            results.push(child_id.clone());
            if self.is_elm_container(&child_id) {
                results.extend(self.get_elm_all_children(&child_id));
            }
        }
        results
    }

    /// The element plus all elements sharing its parent, in document order.
    pub fn get_elm_siblings_id(&self, id: &str) -> Vec<String> {
        if !is_valid_id(id) || self.is_main_container(id) {
            return Vec::new();
        }
        match self.get_elm_parent_id(id) {
            Some(parent_id) => self.get_elm_children(&parent_id),
            None => Vec::new(),
        }
    }

    pub fn get_elm_next_id(&self, id: &str) -> Option<String> {
        let siblings = self.get_elm_siblings_id(id);
        let index = siblings.iter().position(|s| s == id)?;
        siblings.get(index + 1).cloned()
    }

    pub fn get_elm_prev_id(&self, id: &str) -> Option<String> {
        let siblings = self.get_elm_siblings_id(id);
        let index = siblings.iter().position(|s| s == id)?;
        index.checked_sub(1).and_then(|i| siblings.get(i).cloned())
    }

    /// Smallest `{type}:{n}` not present in the document and not already
    /// handed out this session.
    pub fn get_spare_elm_id(&mut self, elm_type: &str) -> String {
        if elm_type.is_empty() {
            return String::new();
        }
        for index in 1..=ITERATION_CAP {
            let id = format!("{elm_type}:{index}");
            if !self.does_elm_exist(&id) && !self.generated_ids.contains(&id) {
                self.generated_ids.push(id.clone());
                return id;
            }
        }
        // Unreachable for any real document size.
        format!("{elm_type}:{}", ITERATION_CAP + 1)
    }
}

/// Top-level shortcode ids inside `content`, skipping shortcodes without a
/// `usbid` attribute.
pub(crate) fn shortcode_sibling_ids(content: &str) -> Vec<String> {
    let mut content = content.to_owned();
    let mut result = Vec::new();
    let mut iterations = 0;
    while let Some(first) = parse_shortcode(&content) {
        iterations += 1;
        if iterations > ITERATION_CAP {
            break;
        }
        if let Some(usbid) = parse_atts(&first.atts).get_text("usbid") {
            result.push(usbid.to_owned());
        }
        content = content.replacen(&first.input, "", 1);
    }
    result
}
