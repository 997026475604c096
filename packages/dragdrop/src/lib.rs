//! Drag and drop placement engine.
//!
//! The preview window reports pointer samples against a [`LayoutTree`], a
//! snapshot of element bounding boxes keyed by element id. The
//! [`DragEngine`] turns each sample into a [`DropPlace`] (where the drop
//! indicator belongs right now) and, on release, applies the create or move
//! through the editor session. All placement legality comes from the
//! session's relation rules; this crate only adds geometry.

pub mod drag;
pub mod geometry;
pub mod layout;

pub use drag::{DragEngine, DropPlace, PointerSample};
pub use geometry::{border_under_mouse, mouse_angle, mouse_direction_x, mouse_direction_y, Direction, Point, Rect};
pub use layout::{LayoutNode, LayoutTree, NodeId};
