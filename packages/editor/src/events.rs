//! Change notifications.
//!
//! Every mutation that changes the document fires exactly one
//! `ContentChange`; render work and preview DOM patching are requested
//! through events as well, so the session itself stays synchronous and the
//! host decides how to deliver them (message bus, debounced persistence
//! checks, endpoint calls).

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::mutations::InsertPosition;
use crate::session::Mode;

/// Why a render round-trip was requested; carried back to the preview once
/// the rendered HTML arrives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderContext {
    /// A freshly created element; `insert` is where its HTML lands.
    Create { elm_id: String, insert: InsertPosition },
    /// A duplicated element (or its whole tab group for TTA sections).
    Duplicate { new_id: String, rerender_id: String },
    /// A row whose column set changed.
    Columns { row_id: String },
    /// Imported full-document content.
    Import,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifyLevel {
    Info,
    Success,
    Error,
}

/// Messages the preview window consumes to keep its DOM in sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreviewAction {
    HideHighlight,
    RemoveElm(String),
    MoveElm {
        parent_id: String,
        position: crate::mutations::Position,
        elm_id: String,
    },
    ShowPreloader {
        insert: InsertPosition,
        is_container: bool,
    },
    HidePreloader {
        target_id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuilderEvent {
    ContentChange,
    ModeChange { new_mode: Mode, old_mode: Mode },
    ElmSelected(String),
    /// A column was added/removed under this row; consumers rebalance.
    ColumnChange { row_id: String },
    /// The selected element (or an ancestor) was removed; show the default
    /// add-element panel.
    ShowAddPanel,
    Notify { level: NotifyLevel, message: String },
    Preview(PreviewAction),
    RenderRequest {
        request_id: String,
        content: String,
        context: RenderContext,
    },
}

/// Receiver for session notifications.
pub trait EventSink: Send {
    fn notify(&mut self, event: BuilderEvent);
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn notify(&mut self, _event: BuilderEvent) {}
}

/// Queues events for a host (or a test) to drain.
#[derive(Debug, Clone, Default)]
pub struct QueueSink {
    queue: Arc<Mutex<VecDeque<BuilderEvent>>>,
}

impl QueueSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<BuilderEvent> {
        self.queue.lock().expect("event queue poisoned").drain(..).collect()
    }

    pub fn count_content_changes(&self) -> usize {
        self.queue
            .lock()
            .expect("event queue poisoned")
            .iter()
            .filter(|e| matches!(e, BuilderEvent::ContentChange))
            .count()
    }
}

impl EventSink for QueueSink {
    fn notify(&mut self, event: BuilderEvent) {
        self.queue.lock().expect("event queue poisoned").push_back(event);
    }
}
