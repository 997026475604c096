//! Placement rules.
//!
//! Containers come in two levels: root containers (`vc_row`, `vc_tta_tabs`)
//! accept a single fixed child type via an `as_parent: only` rule, and
//! second-level containers (`vc_column`, `vc_tta_section`) are locked to
//! fixed parents via an `as_child: only` rule. Everything else is a plain
//! element. `can_be_child_of` consults both rule tables and is the single
//! gate every insert and move goes through.

use tracing::debug;

use crate::config::Relation;
use crate::elm::{elm_name, elm_type, is_valid_id};
use crate::session::{BuilderSession, Mode};

impl BuilderSession {
    /// Accepts an id (`vc_row:1`) or a bare configuration name (`vc_row`).
    pub fn is_elm_container(&self, id_or_name: &str) -> bool {
        let name = elm_name(id_or_name);
        !name.is_empty() && self.config.containers.iter().any(|c| c == name)
    }

    /// Root containers hold a fixed child type, e.g. `vc_row`, `vc_tta_tabs`.
    pub fn is_root_elm_container(&self, id_or_name: &str) -> bool {
        let name = elm_name(id_or_name);
        self.is_elm_container(name)
            && matches!(
                self.config.relations.as_parent.get(name),
                Some(Relation::Only(_))
            )
    }

    /// Second-level containers live only inside fixed parents, e.g.
    /// `vc_column`, `vc_tta_section`.
    pub fn is_second_elm_container(&self, id_or_name: &str) -> bool {
        let name = elm_name(id_or_name);
        !name.is_empty()
            && self.is_elm_container(name)
            && !self.is_root_elm_container(name)
            && matches!(
                self.config.relations.as_child.get(name),
                Some(Relation::Only(_))
            )
    }

    /// The tabs/tour/accordion family, sections included.
    pub fn is_elm_tta(&self, id_or_name: &str) -> bool {
        let name = elm_name(id_or_name);
        !name.is_empty() && self.is_elm_container(name) && name.starts_with("vc_tta_")
    }

    /// Tab-styled TTA containers, where section headers render as a button
    /// strip instead of stacked headers.
    pub fn is_elm_tab(&self, id_or_name: &str) -> bool {
        if !self.is_elm_tta(id_or_name) {
            return false;
        }
        let ty = if is_valid_id(id_or_name) {
            elm_type(id_or_name)
        } else {
            id_or_name
        };
        matches!(ty, "vc_tta_tabs" | "vc_tta_tour")
    }

    /// Whether `id` may become a direct child of `parent`.
    ///
    /// In strict mode second-level containers are additionally pinned to
    /// their current parent, so a column can be reordered inside its row but
    /// never dragged into another row.
    pub fn can_be_child_of(&mut self, id: &str, parent: &str, strict: bool) -> bool {
        let parent_is_main = self.is_main_container(parent);
        if self.is_main_container(id)
            || !is_valid_id(id)
            || !(is_valid_id(parent) || parent_is_main)
        {
            return false;
        }

        if self.config.relations.is_empty() {
            debug!(id, parent, "no relations configured, movement allowed");
            return true;
        }

        let target_name = elm_name(id).to_owned();
        let parent_name = if parent_is_main {
            parent.to_owned()
        } else {
            elm_name(parent).to_owned()
        };

        // Adding a plain element to the main container is always allowed,
        // the auto row wrap takes care of the structure.
        let skip_rules = self.mode() == Mode::DragAdd
            && parent_name == self.config.main_container
            && !self.is_second_elm_container(id);

        if !skip_rules {
            let tables = [
                (&self.config.relations.as_child, &target_name, &parent_name),
                (&self.config.relations.as_parent, &parent_name, &target_name),
            ];
            for (table, key, candidate) in tables {
                if let Some(relation) = table.get(key.as_str()) {
                    let found = relation.contains(candidate);
                    let denied = match relation {
                        Relation::Only(_) => !found,
                        Relation::Except(_) => found,
                    };
                    if denied {
                        return false;
                    }
                }
            }
        }

        if strict && self.is_second_elm_container(id) {
            // A snapshot is held mid-move with the dragged shortcode excised;
            // parent resolution needs the intact document.
            let excised = (self.mode() == Mode::DragMove && !self.is_empty_temp_content())
                .then(|| self.page.content.clone());
            if excised.is_some() {
                self.restore_temp_content();
            }
            let elm_parent_id = self.get_elm_parent_id(id);
            if let Some(excised) = excised {
                self.save_temp_content();
                self.page.content = excised;
            }
            return elm_parent_id.as_deref() == Some(parent);
        }

        true
    }

    /// True when `type_or_id` already occurs in `parent`'s ancestor chain
    /// (parent itself included). Guards against same-type nesting.
    pub fn has_same_type_parent(&self, type_or_id: &str, parent: &str) -> bool {
        if self.is_main_container(type_or_id)
            || self.is_main_container(parent)
            || !is_valid_id(parent)
        {
            return false;
        }
        let ty = if is_valid_id(type_or_id) {
            elm_type(type_or_id)
        } else {
            type_or_id
        };
        if ty == elm_type(parent) {
            return true;
        }
        let mut current = parent.to_owned();
        for _ in 0..crate::document::ITERATION_CAP {
            match self.get_elm_parent_id(&current) {
                Some(next) => {
                    if elm_type(&next) == ty {
                        return true;
                    }
                    if self.is_main_container(&next) {
                        return false;
                    }
                    current = next;
                }
                None => return false,
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuilderConfig;
    use crate::page::PageData;

    fn test_config() -> BuilderConfig {
        let json = r#"{
            "main_container": "container",
            "containers": [
                "vc_row", "vc_row_inner", "vc_column", "vc_column_inner",
                "vc_tta_tabs", "vc_tta_accordion", "vc_tta_tour", "vc_tta_section",
                "hwrapper", "vwrapper"
            ],
            "relations": {
                "as_child": {
                    "vc_row": { "only": "container" },
                    "vc_column": { "only": "vc_row" },
                    "vc_row_inner": { "only": "vc_column" },
                    "vc_column_inner": { "only": "vc_row_inner" },
                    "vc_tta_section": { "only": "vc_tta_tabs,vc_tta_accordion,vc_tta_tour" }
                },
                "as_parent": {
                    "vc_row": { "only": "vc_column" },
                    "vc_row_inner": { "only": "vc_column_inner" },
                    "vc_tta_tabs": { "only": "vc_tta_section" },
                    "vc_tta_accordion": { "only": "vc_tta_section" },
                    "vc_tta_tour": { "only": "vc_tta_section" },
                    "hwrapper": { "except": "vc_row,vc_column,hwrapper" }
                }
            }
        }"#;
        BuilderConfig::from_json(json).unwrap()
    }

    fn session_with(content: &str) -> BuilderSession {
        let mut session = BuilderSession::new(test_config(), false);
        session.load_page(PageData {
            content: content.to_owned(),
            ..PageData::default()
        });
        session
    }

    const DOC: &str = concat!(
        r#"[vc_row usbid="vc_row:1"]"#,
        r#"[vc_column usbid="vc_column:1"]"#,
        r#"[us_btn usbid="us_btn:1"]"#,
        r#"[/vc_column]"#,
        r#"[vc_column usbid="vc_column:2"][/vc_column]"#,
        r#"[/vc_row]"#,
        r#"[vc_row usbid="vc_row:2"][vc_column usbid="vc_column:3"][/vc_column][/vc_row]"#,
    );

    #[test]
    fn container_levels_classify_by_name() {
        let session = session_with("");
        assert!(session.is_elm_container("vc_row:1"));
        assert!(session.is_elm_container("vc_column"));
        assert!(!session.is_elm_container("us_btn:1"));

        assert!(session.is_root_elm_container("vc_row:1"));
        assert!(session.is_root_elm_container("vc_tta_tabs"));
        assert!(!session.is_root_elm_container("vc_column:1"));

        assert!(session.is_second_elm_container("vc_column:1"));
        assert!(session.is_second_elm_container("vc_tta_section"));
        assert!(!session.is_second_elm_container("vc_row:1"));
        assert!(!session.is_second_elm_container("hwrapper"));
    }

    #[test]
    fn tta_and_tab_classification() {
        let session = session_with("");
        assert!(session.is_elm_tta("vc_tta_tabs:1"));
        assert!(session.is_elm_tta("vc_tta_section"));
        assert!(!session.is_elm_tta("vc_row:1"));

        assert!(session.is_elm_tab("vc_tta_tabs:1"));
        assert!(session.is_elm_tab("vc_tta_tour"));
        assert!(!session.is_elm_tab("vc_tta_accordion:1"));
        assert!(!session.is_elm_tab("vc_tta_section:1"));
    }

    #[test]
    fn rules_gate_parent_child_pairs() {
        let mut session = session_with(DOC);
        assert!(session.can_be_child_of("vc_column:1", "vc_row:2", false));
        assert!(!session.can_be_child_of("vc_column:1", "container", false));
        assert!(!session.can_be_child_of("us_btn:1", "vc_row:1", false));
        assert!(session.can_be_child_of("us_btn:1", "vc_column:2", false));
        assert!(session.can_be_child_of("vc_row:1", "container", false));
        assert!(!session.can_be_child_of("vc_row:1", "vc_column:1", false));
    }

    #[test]
    fn main_container_never_moves() {
        let mut session = session_with(DOC);
        assert!(!session.can_be_child_of("container", "vc_row:1", false));
        assert!(!session.can_be_child_of("us_btn:1", "nope", false));
    }

    #[test]
    fn empty_relations_fail_open() {
        let mut session = session_with(DOC);
        session.config.relations = Default::default();
        assert!(session.can_be_child_of("us_btn:1", "vc_row:1", false));
    }

    #[test]
    fn drag_add_relaxes_root_placement_for_plain_elements() {
        let mut session = session_with(DOC);
        session.set_mode(Mode::DragAdd);
        assert!(session.can_be_child_of("us_btn:1", "container", false));
        // Columns stay locked out of the root even while adding.
        assert!(!session.can_be_child_of("vc_column:1", "container", false));
    }

    #[test]
    fn strict_mode_pins_second_containers_to_their_parent() {
        let mut session = session_with(DOC);
        assert!(session.can_be_child_of("vc_column:1", "vc_row:1", true));
        assert!(!session.can_be_child_of("vc_column:1", "vc_row:2", true));
        // Non-container elements are unaffected by strict mode.
        assert!(session.can_be_child_of("us_btn:1", "vc_column:3", true));
    }

    #[test]
    fn strict_mode_resolves_parents_through_the_move_snapshot() {
        let mut session = session_with(DOC);
        session.set_mode(Mode::DragMove);
        session.save_temp_content();
        let shortcode = session.get_elm_shortcode("vc_column:1");
        session.page.content = session.page.content.replacen(&shortcode, "", 1);

        assert!(session.can_be_child_of("vc_column:1", "vc_row:1", true));
        assert!(!session.can_be_child_of("vc_column:1", "vc_row:2", true));
        // The excised state is left untouched.
        assert!(!session.page.content.contains("vc_column:1"));
        assert!(!session.is_empty_temp_content());
    }

    #[test]
    fn except_rules_deny_listed_children() {
        let mut session = session_with(concat!(
            r#"[vc_row usbid="vc_row:1"][vc_column usbid="vc_column:1"]"#,
            r#"[hwrapper usbid="hwrapper:1"][/hwrapper]"#,
            r#"[us_btn usbid="us_btn:1"]"#,
            r#"[/vc_column][/vc_row]"#,
        ));
        assert!(session.can_be_child_of("us_btn:1", "hwrapper:1", false));
        assert!(!session.can_be_child_of("vc_column:1", "hwrapper:1", false));
    }

    #[test]
    fn same_type_ancestry_is_detected() {
        let session = session_with(concat!(
            r#"[vc_row usbid="vc_row:1"][vc_column usbid="vc_column:1"]"#,
            r#"[vc_row_inner usbid="vc_row_inner:1"]"#,
            r#"[vc_column_inner usbid="vc_column_inner:1"][/vc_column_inner]"#,
            r#"[/vc_row_inner]"#,
            r#"[/vc_column][/vc_row]"#,
        ));
        assert!(session.has_same_type_parent("vc_row:9", "vc_row:1"));
        assert!(session.has_same_type_parent("vc_row", "vc_column_inner:1"));
        assert!(!session.has_same_type_parent("vc_row_inner", "vc_column:1"));
        assert!(!session.has_same_type_parent("us_btn:1", "container"));
    }
}
