//! Drag state machine and drop resolution.

use serde::{Deserialize, Serialize};
use tracing::debug;

use usbuilder_editor::{
    elm_name, elm_type, is_valid_id, BuilderSession, InsertPosition, Mode,
};
use usbuilder_shortcode::Atts;

use crate::geometry::{
    border_under_mouse, mouse_direction_x, mouse_direction_y, Direction, Point,
};
use crate::layout::{LayoutTree, NodeId};

/// Pointer movement below this distance never starts a drag, so clicks
/// stay clicks.
pub const DRAG_START_DISTANCE: f64 = 5.0;

/// One pointer event from the preview. `client` and `page` coincide when
/// the preview is not scrolled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerSample {
    pub client: Point,
    pub page: Point,
    /// The layout node under the pointer.
    pub target: Option<NodeId>,
}

/// Where the drop indicator belongs for the latest pointer sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropPlace {
    pub insert: InsertPosition,
    /// Styled as a container-wide drop zone rather than an insertion line.
    pub in_container: bool,
}

/// Tracks one drag from start to drop, resolving each pointer sample into
/// a [`DropPlace`] and applying the create or move on release.
#[derive(Debug, Default)]
pub struct DragEngine {
    start: Option<Point>,
    target: Option<NodeId>,
    dragging: bool,
    is_parent_tab: bool,
    current_id: Option<String>,
    parent_id: Option<String>,
    current_index: usize,
    last_insert: Option<InsertPosition>,
}

impl DragEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Begins dragging a new element of `new_elm_type` out of the add
    /// panel. The reserved id is only used for placement decisions; the
    /// real element is created on drop.
    pub fn start_add(&mut self, session: &mut BuilderSession, new_elm_type: &str, page: Point) {
        self.reset();
        session.set_mode(Mode::DragAdd);
        self.current_id = Some(session.get_spare_elm_id(new_elm_type));
        self.start = Some(page);
        self.dragging = true;
    }

    /// Begins watching a pointer press on an existing element. The drag
    /// only commits once the pointer travels past the start distance.
    pub fn start_move(&mut self, target: NodeId, page: Point) {
        self.reset();
        self.target = Some(target);
        self.start = Some(page);
    }

    /// Feeds a pointer sample. Returns a new drop place when the indicator
    /// should move, `None` when nothing changed or no drop is legal here.
    pub fn maybe_drag(
        &mut self,
        session: &mut BuilderSession,
        tree: &LayoutTree,
        sample: &PointerSample,
    ) -> Option<DropPlace> {
        if session.mode() == Mode::DragAdd {
            return self.maybe_drop(session, tree, sample);
        }

        let start = self.start?;
        let target = self.target?;
        if (start.x - sample.page.x).abs() < DRAG_START_DISTANCE
            && (start.y - sample.page.y).abs() < DRAG_START_DISTANCE
        {
            return None;
        }

        if session.mode() == Mode::Editor {
            session.set_mode(Mode::DragMove);
            self.dragging = true;
            let elm_id = tree.elm_id(target).to_owned();
            self.is_parent_tab = session
                .get_elm_parent_id(&elm_id)
                .map(|parent| session.is_elm_tab(&parent))
                .unwrap_or(false);
            self.current_id = Some(elm_id);
        }
        if session.mode() != Mode::DragMove {
            return None;
        }

        // Take the dragged element out of the document so placement
        // queries do not see it; the snapshot comes back on drop.
        if session.is_empty_temp_content() {
            if let Some(current_id) = self.current_id.clone() {
                session.save_temp_content();
                let shortcode = session.get_elm_shortcode(&current_id);
                session.page.content = session.page.content.replacen(&shortcode, "", 1);
            }
        }

        self.maybe_drop(session, tree, sample)
    }

    fn maybe_drop(
        &mut self,
        session: &mut BuilderSession,
        tree: &LayoutTree,
        sample: &PointerSample,
    ) -> Option<DropPlace> {
        if !matches!(session.mode(), Mode::DragAdd | Mode::DragMove) {
            return None;
        }
        let current_id = self.current_id.clone()?;
        let is_current_tta = session.is_elm_tta(&current_id);
        let main = session.config.main_container.clone();

        // Tab-strip buttons stand in for sections rendered elsewhere, so a
        // drop on a button resolves against its section. The direction is
        // still measured against the button itself.
        let real_target = sample.target?;
        let mut data_target = real_target;
        if self.is_parent_tab {
            if let Some(section_id) = tree
                .node(real_target)
                .and_then(|node| node.tab_button_for.clone())
            {
                if let Some(section_node) = tree.find_by_elm_id(&section_id) {
                    data_target = section_node;
                }
            }
        }

        // Second-level containers only ever land in root containers.
        let target_container = if session.is_second_elm_container(&current_id) {
            tree.nearest(data_target, |n| session.is_root_elm_container(&n.elm_id))
        } else {
            tree.nearest(data_target, |n| session.is_elm_container(&n.elm_id))
        }
        .unwrap_or_else(|| tree.root());

        let target_node = tree
            .nearest(data_target, |n| {
                is_valid_id(&n.elm_id) || n.elm_id == main
            })
            .unwrap_or_else(|| tree.root());
        let mut target_id = tree.elm_id(target_node).to_owned();
        let mut target_container_id = tree.elm_id(target_container).to_owned();
        let current_type = elm_type(&current_id).to_owned();

        // On a container border the drop retargets to a neighbor of the
        // container instead of its inside.
        let border = if target_container == tree.root() {
            Direction::Unknown
        } else {
            border_under_mouse(tree.rect(target_container), sample.page)
        };
        if border != Direction::Unknown
            && (!session.is_elm_container(&current_id)
                || is_current_tta
                || (current_type == "vc_row_inner"
                    && elm_type(&target_container_id) == "vc_column_inner"))
        {
            let mut parent_id = session
                .get_elm_parent_id(&target_container_id)
                .unwrap_or_else(|| main.clone());
            if border == Direction::Top && !session.is_second_elm_container(&parent_id) {
                target_id = parent_id.clone();
            }
            if !session.is_second_elm_container(&parent_id) {
                parent_id = session.get_elm_parent_id(&parent_id).unwrap_or_default();
            }
            target_container_id = if parent_id.is_empty() { main.clone() } else { parent_id };
        }

        // Columns and TTA elements must stay inside their current parent.
        let strict = is_current_tta || current_id.starts_with("vc_column");

        if current_type == "vc_row" && elm_type(&target_container_id) == "vc_row" {
            target_container_id = main.clone();
        }

        // A column hovering its own row produces no indicator movement.
        if session.is_second_elm_container(&current_id) && target_container_id == target_id {
            return None;
        }
        if session.has_same_type_parent(&current_id, &target_container_id) {
            return None;
        }
        if !session.can_be_child_of(&current_id, &target_container_id, strict) {
            debug!(%current_id, %target_container_id, "drop rejected by relations");
            return None;
        }

        // Tab sections reorder horizontally in a tab strip, vertically in
        // accordions; columns always reorder horizontally.
        let along_x = if is_current_tta {
            self.parent_id.as_deref().map(elm_type) == Some("vc_tta_tabs")
        } else {
            session.is_second_elm_container(&current_id)
        };
        let real_rect = tree.rect(real_target);
        let direction = if along_x {
            mouse_direction_x(real_rect, sample.client)
        } else {
            mouse_direction_y(real_rect, sample.client)
        };

        let children = session.get_elm_children(&target_container_id);
        let target_child_id = if session.is_second_elm_container(&current_id)
            && !session.is_elm_container(&target_id)
        {
            tree.nearest(data_target, |n| session.is_second_elm_container(&n.elm_id))
                .map(|node| tree.elm_id(node).to_owned())
                .unwrap_or_default()
        } else {
            target_id.clone()
        };

        let mut current_index = children
            .iter()
            .position(|child| *child == target_child_id)
            .unwrap_or(0);
        if direction == Direction::Bottom || direction == Direction::Right {
            current_index += 1;
        }

        // Near the end of a container the box scan beats the angle: any
        // child whose top-left corner is above and left of the pointer
        // pushes the index past it.
        if !is_current_tta
            && !current_id.contains("vc_column")
            && (session.is_second_elm_container(&target_id)
                || (session.mode() == Mode::DragAdd
                    && session.is_main_container(&target_container_id)))
        {
            for (i, child_id) in children.iter().enumerate() {
                let node = match tree.find_by_elm_id(child_id) {
                    Some(node) => node,
                    None => continue,
                };
                let rect = tree.rect(node);
                if sample.page.y > rect.y.abs().floor() && sample.page.x > rect.x.abs().floor() {
                    current_index = i + 1;
                }
            }
        }

        self.parent_id = Some(target_container_id.clone());
        self.current_index = current_index;

        let insert = session.get_insert_position(&target_container_id, current_index);
        if self.last_insert.as_ref() == Some(&insert) {
            return None;
        }
        self.last_insert = Some(insert.clone());

        let in_container = session.is_root_elm_container(&target_container_id)
            || elm_name(&target_container_id) == "hwrapper"
            || self.is_parent_tab;
        Some(DropPlace { insert, in_container })
    }

    /// Finishes the drag: creates or moves the element at the last
    /// resolved place and returns the affected element id.
    pub fn end_drag(&mut self, session: &mut BuilderSession) -> Option<String> {
        let mode = session.mode();
        session.set_mode(Mode::Editor);
        let result = match mode {
            Mode::DragAdd => match (self.parent_id.clone(), self.current_id.clone()) {
                (Some(parent_id), Some(current_id)) => session.create_elm(
                    elm_type(&current_id),
                    &parent_id,
                    self.current_index,
                    Atts::new(),
                ),
                _ => None,
            },
            Mode::DragMove => {
                // The document must be whole again before the move.
                session.restore_temp_content();
                match (self.parent_id.clone(), self.current_id.clone()) {
                    (Some(parent_id), Some(current_id)) => session
                        .move_elm(&current_id, &parent_id, self.current_index)
                        .then_some(current_id),
                    _ => None,
                }
            }
            _ => None,
        };
        self.reset();
        result
    }

    /// Abandons the drag, restoring the document.
    pub fn cancel(&mut self, session: &mut BuilderSession) {
        session.restore_temp_content();
        session.set_mode(Mode::Editor);
        self.reset();
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}
