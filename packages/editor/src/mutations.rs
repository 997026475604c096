//! Document mutations.
//!
//! All edits funnel through `add_shortcode_to_content`, which splices a
//! shortcode string into the text at a resolved `InsertPosition`. Higher
//! level operations (create, move, duplicate, remove, layout changes,
//! import) validate against the relation rules first, then splice, then
//! fire events for the host and the preview.

use std::collections::HashMap;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use usbuilder_shortcode::{
    build_atts, build_shortcode, build_string, parse_atts, parse_shortcode,
    remove_html_wrap, Atts, ParsedShortcode, TemplateSymbols,
};

use crate::config::Relation;
use crate::elm::{elm_name, elm_type, is_valid_id};
use crate::events::{BuilderEvent, NotifyLevel, PreviewAction, RenderContext};
use crate::session::BuilderSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Prepend,
    Append,
    Before,
    After,
}

/// A resolved insertion point. `parent` is either the container receiving
/// the prepend/append or, for before/after, the sibling to splice around.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertPosition {
    pub position: Position,
    pub parent: String,
}

impl BuilderSession {
    /// Resolves an index inside `parent` into a splice point. Inside
    /// containers an interior index is rewritten as "after the preceding
    /// child", so the splice only ever touches one sibling's text.
    pub fn get_insert_position(&self, parent: &str, index: usize) -> InsertPosition {
        if self.is_main_container(parent) || self.is_elm_container(parent) {
            let children = self.get_elm_children(parent);
            if index == 0 || children.is_empty() {
                InsertPosition {
                    position: Position::Prepend,
                    parent: parent.to_owned(),
                }
            } else if index > children.len() || children.len() == 1 {
                InsertPosition {
                    position: Position::Append,
                    parent: parent.to_owned(),
                }
            } else {
                InsertPosition {
                    position: Position::After,
                    parent: children[index - 1].clone(),
                }
            }
        } else {
            InsertPosition {
                position: if index < 1 { Position::Before } else { Position::After },
                parent: parent.to_owned(),
            }
        }
    }

    /// Splices `new_shortcode` into the document at `index` within `parent`.
    pub(crate) fn add_shortcode_to_content(
        &mut self,
        parent: &str,
        index: usize,
        new_shortcode: &str,
    ) -> bool {
        if new_shortcode.is_empty()
            || !(is_valid_id(parent) || self.is_main_container(parent))
        {
            return false;
        }

        let insert = self.get_insert_position(parent, index);
        let is_main = self.is_main_container(&insert.parent);
        let old_shortcode = if is_main {
            self.page.content.clone()
        } else {
            self.get_elm_shortcode(&insert.parent)
        };
        let old_shortcode = remove_html_wrap(&old_shortcode);

        // At the root only prepend keeps its meaning; every other position
        // appends, matching how the preview lays out root-level rows.
        let insert_shortcode = if is_main {
            match insert.position {
                Position::Prepend => format!("{new_shortcode}{old_shortcode}"),
                _ => format!("{old_shortcode}{new_shortcode}"),
            }
        } else {
            let parent_type = elm_type(&insert.parent);
            match insert.position {
                Position::Before => format!("{new_shortcode}{old_shortcode}"),
                Position::Prepend => {
                    let re = Regex::new(&format!(
                        r"^(\[{}[^\]]*\])",
                        regex::escape(parent_type)
                    ))
                    .unwrap();
                    re.replace(&old_shortcode, |caps: &Captures<'_>| {
                        format!("{}{}", &caps[1], new_shortcode)
                    })
                    .into_owned()
                }
                Position::Append => {
                    let has_closing_tag = parse_shortcode(&old_shortcode)
                        .map(|p| p.has_closing_tag)
                        .unwrap_or(false);
                    if has_closing_tag {
                        let re = Regex::new(&format!(
                            r"(\[/{}\])$",
                            regex::escape(parent_type)
                        ))
                        .unwrap();
                        re.replace(&old_shortcode, |caps: &Captures<'_>| {
                            format!("{}{}", new_shortcode, &caps[1])
                        })
                        .into_owned()
                    } else {
                        format!("{old_shortcode}{new_shortcode}")
                    }
                }
                Position::After => format!("{old_shortcode}{new_shortcode}"),
            }
        };

        self.page.content = self
            .page
            .content
            .replacen(&old_shortcode, &insert_shortcode, 1);
        true
    }

    /// Wraps loose content in a row/column pair so the root only ever holds
    /// rows.
    fn add_row_wrapper(&mut self, content: &str) -> String {
        let template = self
            .config
            .templates
            .get("vc_row")
            .cloned()
            .unwrap_or_default();
        let params = HashMap::from([
            ("vc_row".to_owned(), self.get_spare_elm_id("vc_row")),
            ("vc_column".to_owned(), self.get_spare_elm_id("vc_column")),
            ("content".to_owned(), content.to_owned()),
        ]);
        build_string(&template, &params, &TemplateSymbols::default())
    }

    /// Default inner content for a new element: a required child container
    /// when the relations demand one, the configured default content
    /// otherwise.
    fn default_content(&mut self, name: &str) -> String {
        fn configured(session: &BuilderSession, name: &str) -> String {
            let att = match session.config.edit_content.get(name) {
                Some(att) => att,
                None => return String::new(),
            };
            session
                .config
                .default_values
                .get(name)
                .and_then(|values| values.get(att))
                .cloned()
                .unwrap_or_default()
        }

        let child = self
            .config
            .relations
            .as_child
            .iter()
            .find(|(_, relation)| {
                matches!(relation, Relation::Only(_)) && relation.contains(name)
            })
            .map(|(child, _)| child.clone());

        let child = match child {
            Some(child) => child,
            None => return configured(self, name),
        };

        if self.is_elm_tta(&child) {
            let title = self.config.translation("section").to_owned();
            let template = self
                .config
                .templates
                .get("vc_tta_section")
                .cloned()
                .unwrap_or_default();
            let params = HashMap::from([
                ("title_1".to_owned(), format!("{title} 1")),
                ("title_2".to_owned(), format!("{title} 2")),
                (
                    "vc_column_text".to_owned(),
                    self.get_spare_elm_id("vc_column_text"),
                ),
                (
                    "vc_column_text_content".to_owned(),
                    configured(self, "vc_column_text"),
                ),
                (
                    "vc_tta_section_1".to_owned(),
                    self.get_spare_elm_id("vc_tta_section"),
                ),
                (
                    "vc_tta_section_2".to_owned(),
                    self.get_spare_elm_id("vc_tta_section"),
                ),
            ]);
            build_string(&template, &params, &TemplateSymbols::default())
        } else {
            let id = self.get_spare_elm_id(&child);
            format!(r#"[{child} usbid="{id}"][/{child}]"#)
        }
    }

    /// Creates a new element of `elm_type` at `index` inside `parent` and
    /// returns its id. Loose elements dropped on the root are wrapped in a
    /// fresh row/column pair.
    pub fn create_elm(
        &mut self,
        elm_ty: &str,
        parent: &str,
        index: usize,
        values: Atts,
    ) -> Option<String> {
        let is_main = self.is_main_container(parent);
        if elm_ty.is_empty() || parent.is_empty() || !(is_valid_id(parent) || is_main) {
            debug!(elm_ty, parent, "create rejected, invalid params");
            return None;
        }
        if self.has_same_type_parent(elm_ty, parent) {
            debug!(elm_ty, parent, "create rejected, same type ancestor");
            return None;
        }

        self.notify(BuilderEvent::Preview(PreviewAction::HideHighlight));

        let (parent, index) = if !is_main && !self.does_elm_exist(parent) {
            (self.config.main_container.clone(), 0)
        } else {
            (parent.to_owned(), index)
        };

        let elm_id = self.get_spare_elm_id(elm_ty);
        let name = elm_name(&elm_id).to_owned();
        let insert = self.get_insert_position(&parent, index);

        let mut values = values;
        if values.is_empty() {
            if let Some(defaults) = self.config.default_values.get(&name) {
                for (attr, value) in defaults {
                    if attr != "content" {
                        values.set(attr.clone(), value.as_str());
                    }
                }
            }
        }

        let mut atts = Atts::new();
        atts.set("usbid", elm_id.as_str());
        atts.extend(values);

        let parsed = ParsedShortcode {
            tag: elm_ty.to_owned(),
            atts: format!(" {}", build_atts(&atts, &Atts::new())),
            input: String::new(),
            content: self.default_content(&name),
            has_closing_tag: self.is_elm_container(&name)
                || self.config.edit_content.contains_key(&name),
        };
        let mut shortcode = build_shortcode(&parsed, None);

        // The root only holds rows; anything else gets a wrapper.
        if self.is_main_container(&parent)
            && !self.is_second_elm_container(&elm_id)
            && name != "vc_row"
        {
            shortcode = self.add_row_wrapper(&shortcode);
        }

        if !self.add_shortcode_to_content(&parent, index, &shortcode) {
            return None;
        }

        let is_container = self.is_elm_container(elm_ty);
        self.notify(BuilderEvent::Preview(PreviewAction::ShowPreloader {
            insert: insert.clone(),
            is_container,
        }));
        let request_id = self.next_request_id();
        self.notify(BuilderEvent::RenderRequest {
            request_id,
            content: shortcode,
            context: RenderContext::Create {
                elm_id: elm_id.clone(),
                insert,
            },
        });
        self.select_elm(elm_id.clone());
        self.notify(BuilderEvent::ContentChange);
        Some(elm_id)
    }

    /// Moves an existing element under `new_parent` at `new_index`.
    pub fn move_elm(&mut self, move_id: &str, new_parent: &str, new_index: usize) -> bool {
        if self.is_main_container(move_id) {
            debug!(move_id, "move rejected, cannot move the root");
            return false;
        }
        if self.has_same_type_parent(move_id, new_parent) {
            debug!(move_id, new_parent, "move rejected, same type ancestor");
            return false;
        }
        let is_main = self.is_main_container(new_parent);
        if !is_valid_id(move_id) || !(is_valid_id(new_parent) || is_main) {
            debug!(move_id, new_parent, "move rejected, invalid id");
            return false;
        }
        if !self.does_elm_exist(move_id) || !(self.does_elm_exist(new_parent) || is_main) {
            debug!(move_id, new_parent, "move rejected, element missing");
            return false;
        }

        self.notify(BuilderEvent::Preview(PreviewAction::HideHighlight));

        let (new_parent, new_index) = if !is_main && !self.does_elm_exist(new_parent) {
            (self.config.main_container.clone(), 0)
        } else {
            (new_parent.to_owned(), new_index)
        };

        let old_shortcode = self.get_elm_shortcode(move_id);
        self.page.content = self.page.content.replacen(&old_shortcode, "", 1);

        let insert = self.get_insert_position(&new_parent, new_index);
        if !self.add_shortcode_to_content(&new_parent, new_index, &old_shortcode) {
            return false;
        }

        self.notify(BuilderEvent::Preview(PreviewAction::MoveElm {
            parent_id: insert.parent,
            position: insert.position,
            elm_id: move_id.to_owned(),
        }));
        self.notify(BuilderEvent::ContentChange);
        true
    }

    /// Duplicates an element in place, as the next sibling of the source.
    /// Every id inside the copied subtree is remapped to a spare id; the
    /// returned id is the copy's own.
    pub fn duplicate_elm(&mut self, id: &str) -> Option<String> {
        if !is_valid_id(id) {
            return None;
        }
        let is_tta_section = elm_type(id) == "vc_tta_section";
        let parent_id = self.get_elm_parent_id(id)?;
        let shortcode = self.get_elm_shortcode(id);
        if shortcode.is_empty() {
            return None;
        }

        // Anchor ids must not travel with the copy.
        let el_id_re = Regex::new(r#"(?i)(\s?el_id="[^"]+")"#).unwrap();
        let shortcode = el_id_re.replace_all(&shortcode, "").into_owned();

        let usbid_re = Regex::new(r#"(?i)usbid="([^"]+)""#).unwrap();
        let mut new_id: Option<String> = None;
        let mut remapped = String::with_capacity(shortcode.len());
        let mut last = 0;
        for caps in usbid_re.captures_iter(&shortcode) {
            let whole = match caps.get(0) {
                Some(m) => m,
                None => continue,
            };
            let spare = self.get_spare_elm_id(elm_type(&caps[1]));
            if new_id.is_none() {
                new_id = Some(spare.clone());
            }
            remapped.push_str(&shortcode[last..whole.start()]);
            remapped.push_str(&format!(r#"usbid="{spare}""#));
            last = whole.end();
        }
        remapped.push_str(&shortcode[last..]);
        let new_id = new_id?;

        let siblings = self.get_elm_siblings_id(id);
        let index = siblings
            .iter()
            .position(|s| s == id)
            .map(|i| i + 1)
            .unwrap_or(0);

        if !self.add_shortcode_to_content(&parent_id, index, &remapped) {
            return None;
        }
        self.notify(BuilderEvent::ContentChange);

        let is_container = self.is_elm_container(elm_type(id));
        self.notify(BuilderEvent::Preview(PreviewAction::ShowPreloader {
            insert: InsertPosition {
                position: Position::After,
                parent: id.to_owned(),
            },
            is_container,
        }));
        // Section headers live in the parent's tab strip, so a duplicated
        // section re-renders the whole group.
        let content = if is_tta_section {
            self.get_elm_shortcode(&parent_id)
        } else {
            remapped
        };
        let request_id = self.next_request_id();
        self.notify(BuilderEvent::RenderRequest {
            request_id,
            content,
            context: RenderContext::Duplicate {
                new_id: new_id.clone(),
                rerender_id: if is_tta_section { parent_id } else { id.to_owned() },
            },
        });
        Some(new_id)
    }

    /// Removes an element and its subtree without any safeguards.
    pub fn remove_elm(&mut self, remove_id: &str) -> bool {
        if !is_valid_id(remove_id) {
            return false;
        }
        self.notify(BuilderEvent::Preview(PreviewAction::RemoveElm(
            remove_id.to_owned(),
        )));
        let selected = self.selected_elm_id.clone();
        let name = elm_name(remove_id).to_owned();
        let all_children = self.get_elm_all_children(remove_id);
        let row_id = if name == "vc_column" || name == "vc_column_inner" {
            self.get_elm_parent_id(remove_id)
        } else {
            None
        };

        let shortcode = self.get_elm_shortcode(remove_id);
        self.page.content = self.page.content.replacen(&shortcode, "", 1);
        self.notify(BuilderEvent::ContentChange);

        if let Some(row_id) = row_id {
            self.notify(BuilderEvent::ColumnChange { row_id });
        }
        if let Some(selected) = selected {
            if selected == remove_id || all_children.contains(&selected) {
                self.selected_elm_id = None;
                self.notify(BuilderEvent::ShowAddPanel);
            }
        }
        true
    }

    /// User-facing removal: asks `confirm` before dropping a non-empty
    /// container, and removes the parent row instead when deleting the last
    /// remaining column or section.
    pub fn delete_elm(&mut self, remove_id: &str, confirm: impl FnOnce(&str) -> bool) -> bool {
        if !is_valid_id(remove_id) {
            return false;
        }
        let children = if self.is_elm_container(remove_id) {
            self.get_elm_children(remove_id)
        } else {
            Vec::new()
        };
        if !children.is_empty() && !confirm(self.config.translation("all_inner_elms_del")) {
            return false;
        }

        let remove_id = if self.is_second_elm_container(remove_id)
            && self.get_elm_siblings_id(remove_id).len() == 1
        {
            match self.get_elm_parent_id(remove_id) {
                Some(parent_id) => parent_id,
                None => remove_id.to_owned(),
            }
        } else {
            remove_id.to_owned()
        };
        self.remove_elm(&remove_id)
    }

    /// The element's attributes, plus its inner content under the
    /// configured edit attribute.
    pub fn get_elm_values(&self, id: &str) -> Atts {
        if !self.does_elm_exist(id) {
            return Atts::new();
        }
        match self.parse_elm_shortcode(id) {
            Some(parsed) => {
                let mut result = parse_atts(&parsed.atts);
                if let Some(att) = self.config.edit_content.get(elm_name(id)) {
                    result.set(att.clone(), parsed.content.as_str());
                }
                result
            }
            None => Atts::new(),
        }
    }

    /// Merges `values` into the element's attributes. A value keyed by the
    /// configured edit attribute replaces the inner content instead.
    pub fn set_elm_values(&mut self, id: &str, values: Atts) {
        if !self.does_elm_exist(id) || values.is_empty() {
            return;
        }
        let shortcode_text = self.get_elm_shortcode(id);
        let mut parsed = match parse_shortcode(&shortcode_text) {
            Some(parsed) => parsed,
            None => return,
        };
        let edit_att = self.config.edit_content.get(elm_name(id)).cloned();
        let mut atts = parse_atts(&parsed.atts);
        for (name, value) in values.iter() {
            if Some(name) == edit_att.as_deref() {
                if let Some(text) = value.as_text() {
                    parsed.content = text.to_owned();
                }
                continue;
            }
            atts.set(name.to_owned(), value.clone());
        }
        parsed.atts = format!(" {}", build_atts(&atts, &Atts::new()));
        let rebuilt = build_shortcode(&parsed, None);
        self.page.content = self.page.content.replacen(&shortcode_text, &rebuilt, 1);
        self.notify(BuilderEvent::ContentChange);
    }

    /// Applies a column layout like `"3"` or `"1-2-1"` to a row: adds
    /// columns, drops empty surplus ones, and rewrites width attributes.
    /// Widths are simplified where possible (`2/4` becomes `1/2`).
    pub fn update_columns_layout(&mut self, row_id: &str, layout: &str) {
        let mut columns = self.get_elm_children(row_id);
        let mut columns_count = columns.len();
        let mut render_needed = false;
        let column_type = if elm_type(row_id) == "vc_row_inner" {
            "vc_column_inner"
        } else {
            "vc_column"
        };

        let mut new_widths: Vec<String> = Vec::new();
        let new_count: usize;
        if layout.contains('-') {
            let parts: Vec<&str> = layout.split('-').collect();
            new_count = parts.len();
            let base: u32 = parts.iter().filter_map(|p| p.parse::<u32>().ok()).sum();
            for part in &parts {
                let width: u32 = part.parse().unwrap_or(0);
                if width > 0 && base % width == 0 {
                    new_widths.push(format!("1/{}", base / width));
                } else {
                    new_widths.push(format!("{part}/{base}"));
                }
            }
        } else {
            new_count = layout.parse().unwrap_or(0);
            for _ in 0..new_count {
                new_widths.push(format!("1/{layout}"));
            }
        }
        if new_count == 0 {
            return;
        }

        if columns_count < new_count {
            for i in columns_count..new_count {
                let new_column_id = self.get_spare_elm_id(column_type);
                let column = format!(r#"[{column_type} usbid="{new_column_id}"][/{column_type}]"#);
                self.add_shortcode_to_content(row_id, i, &column);
            }
            columns_count = new_count;
            render_needed = true;
        } else if columns_count > new_count {
            // Only empty columns are dropped, scanning from the end.
            let mut surplus = columns_count - new_count;
            for i in (0..columns_count).rev() {
                if surplus == 0 {
                    break;
                }
                if self.get_elm_children(&columns[i]).is_empty() {
                    self.remove_elm(&columns[i]);
                    surplus -= 1;
                }
            }
            columns_count = new_count + surplus;
        }

        columns = self.get_elm_children(row_id);
        self.notify(BuilderEvent::ContentChange);

        for i in 0..columns_count {
            if let Some(column_id) = columns.get(i).cloned() {
                let mut values = Atts::new();
                values.set("width", new_widths[i % new_widths.len()].as_str());
                self.set_elm_values(&column_id, values);
            }
        }

        if render_needed {
            self.notify(BuilderEvent::Preview(PreviewAction::ShowPreloader {
                insert: InsertPosition {
                    position: Position::Append,
                    parent: row_id.to_owned(),
                },
                is_container: true,
            }));
            let content = self.get_elm_shortcode(row_id);
            let request_id = self.next_request_id();
            self.notify(BuilderEvent::RenderRequest {
                request_id,
                content,
                context: RenderContext::Columns {
                    row_id: row_id.to_owned(),
                },
            });
        }
    }

    /// Appends pasted shortcode text to the document. The paste must be a
    /// row-wrapped document containing columns; any ids it carries are
    /// discarded and every shortcode gets a fresh one.
    pub fn import_content(&mut self, pasted: &str) -> bool {
        let pasted = remove_html_wrap(pasted);
        let valid_re = Regex::new(r"(?sm)^\[vc_row(.*)/vc_row\]$").unwrap();
        let is_valid = valid_re.is_match(&pasted) && pasted.contains("[vc_column");
        if !is_valid {
            let message = self.config.translation("invalid_data").to_owned();
            self.notify(BuilderEvent::Notify {
                level: NotifyLevel::Error,
                message,
            });
            return false;
        }

        let usbid_re = Regex::new(r#"\s?usbid="[^"]*""#).unwrap();
        let pasted = usbid_re.replace_all(&pasted, "").into_owned();

        let tag_re = Regex::new(r"\[(\w+)").unwrap();
        let mut result = String::with_capacity(pasted.len());
        let mut last = 0;
        for caps in tag_re.captures_iter(&pasted) {
            let whole = match caps.get(0) {
                Some(m) => m,
                None => continue,
            };
            let spare = self.get_spare_elm_id(&caps[1]);
            result.push_str(&pasted[last..whole.end()]);
            result.push_str(&format!(r#" usbid="{spare}""#));
            last = whole.end();
        }
        result.push_str(&pasted[last..]);

        self.page.content.push_str(&result);
        self.notify(BuilderEvent::ContentChange);
        let request_id = self.next_request_id();
        self.notify(BuilderEvent::RenderRequest {
            request_id,
            content: result,
            context: RenderContext::Import,
        });
        true
    }
}
