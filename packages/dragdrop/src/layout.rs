//! Preview layout snapshot.
//!
//! The preview reports its rendered boxes as a tree of nodes. A node either
//! carries an element id (`us_btn:1`), the main container sentinel, or an
//! empty id for plain markup the pointer can land on. Tab strips report
//! their section buttons as nodes with `tab_button_for` set, since the
//! buttons render outside the sections they stand for.

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

pub type NodeId = usize;

/// Upper bound for ancestor walks over untrusted node data.
const WALK_CAP: usize = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutNode {
    /// Element id, the main container sentinel, or empty for plain markup.
    pub elm_id: String,
    pub rect: Rect,
    pub parent: Option<NodeId>,
    /// Set on tab-strip buttons: the section the button stands for.
    pub tab_button_for: Option<String>,
}

/// An index of layout nodes; node 0 is always the main container.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutTree {
    nodes: Vec<LayoutNode>,
}

impl LayoutTree {
    /// Creates a tree whose root covers the whole page.
    pub fn new(main_container: impl Into<String>, rect: Rect) -> Self {
        Self {
            nodes: vec![LayoutNode {
                elm_id: main_container.into(),
                rect,
                parent: None,
                tab_button_for: None,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        0
    }

    pub fn add_node(
        &mut self,
        elm_id: impl Into<String>,
        rect: Rect,
        parent: NodeId,
    ) -> NodeId {
        self.nodes.push(LayoutNode {
            elm_id: elm_id.into(),
            rect,
            parent: Some(parent),
            tab_button_for: None,
        });
        self.nodes.len() - 1
    }

    pub fn add_tab_button(
        &mut self,
        section_id: impl Into<String>,
        rect: Rect,
        parent: NodeId,
    ) -> NodeId {
        let node = self.add_node("", rect, parent);
        self.nodes[node].tab_button_for = Some(section_id.into());
        node
    }

    pub fn node(&self, id: NodeId) -> Option<&LayoutNode> {
        self.nodes.get(id)
    }

    pub fn elm_id(&self, id: NodeId) -> &str {
        self.nodes.get(id).map(|n| n.elm_id.as_str()).unwrap_or("")
    }

    pub fn rect(&self, id: NodeId) -> Rect {
        self.nodes.get(id).map(|n| n.rect).unwrap_or_default()
    }

    pub fn find_by_elm_id(&self, elm_id: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.elm_id == elm_id)
    }

    /// Walks from `start` towards the root and returns the first node whose
    /// layout node passes `filter`.
    pub fn nearest(
        &self,
        start: NodeId,
        filter: impl Fn(&LayoutNode) -> bool,
    ) -> Option<NodeId> {
        let mut current = start;
        for _ in 0..WALK_CAP {
            let node = self.node(current)?;
            if filter(node) {
                return Some(current);
            }
            current = node.parent?;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_walks_ancestors() {
        let mut tree = LayoutTree::new("container", Rect::new(0.0, 0.0, 1000.0, 1000.0));
        let row = tree.add_node("vc_row:1", Rect::new(0.0, 0.0, 1000.0, 200.0), tree.root());
        let column = tree.add_node("vc_column:1", Rect::new(0.0, 0.0, 500.0, 200.0), row);
        let wrapper = tree.add_node("", Rect::new(10.0, 10.0, 480.0, 180.0), column);
        let btn = tree.add_node("us_btn:1", Rect::new(20.0, 20.0, 100.0, 40.0), wrapper);

        assert_eq!(
            tree.nearest(btn, |n| !n.elm_id.is_empty()),
            Some(btn)
        );
        assert_eq!(
            tree.nearest(wrapper, |n| !n.elm_id.is_empty()),
            Some(column)
        );
        assert_eq!(
            tree.nearest(btn, |n| n.elm_id.starts_with("vc_row")),
            Some(row)
        );
        assert_eq!(tree.nearest(btn, |n| n.elm_id == "nope"), None);
    }

    #[test]
    fn tab_buttons_remember_their_section() {
        let mut tree = LayoutTree::new("container", Rect::default());
        let tabs = tree.add_node("vc_tta_tabs:1", Rect::default(), tree.root());
        let button = tree.add_tab_button("vc_tta_section:2", Rect::default(), tabs);
        assert_eq!(
            tree.node(button).and_then(|n| n.tab_button_for.as_deref()),
            Some("vc_tta_section:2")
        );
        assert_eq!(tree.find_by_elm_id("vc_tta_tabs:1"), Some(tabs));
    }
}
