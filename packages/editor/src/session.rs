//! Builder session state.
//!
//! `BuilderSession` owns the page being edited plus everything the editor
//! panels need to know about it: the active mode, the current selection,
//! the ledger of handed-out element ids, and the temporarily excised
//! shortcode during a move drag. All document queries and mutations are
//! methods on this type, split across `document`, `relations` and
//! `mutations` by concern.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::BuilderConfig;
use crate::events::{BuilderEvent, EventSink, NullSink};
use crate::page::PageData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Editor,
    Preview,
    DragAdd,
    DragMove,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "editor" => Ok(Mode::Editor),
            "preview" => Ok(Mode::Preview),
            "drag:add" => Ok(Mode::DragAdd),
            "drag:move" => Ok(Mode::DragMove),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Editor => "editor",
            Mode::Preview => "preview",
            Mode::DragAdd => "drag:add",
            Mode::DragMove => "drag:move",
        };
        f.write_str(name)
    }
}

pub struct BuilderSession {
    pub config: BuilderConfig,
    pub page: PageData,
    saved: PageData,
    mode: Mode,
    pub selected_elm_id: Option<String>,
    pub hovered_elm_id: Option<String>,
    /// Ids handed out since the last render, so repeated creates within one
    /// render round-trip never collide.
    pub(crate) generated_ids: Vec<String>,
    temp_content: Option<String>,
    sink: Box<dyn EventSink>,
    request_seq: u64,
}

impl BuilderSession {
    /// Starts a session over `config`. When the editor panel is hidden the
    /// session opens in preview mode.
    pub fn new(config: BuilderConfig, panel_hidden: bool) -> Self {
        Self {
            config,
            page: PageData::default(),
            saved: PageData::default(),
            mode: if panel_hidden { Mode::Preview } else { Mode::Editor },
            selected_elm_id: None,
            hovered_elm_id: None,
            generated_ids: Vec::new(),
            temp_content: None,
            sink: Box::new(NullSink),
            request_seq: 0,
        }
    }

    pub fn with_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Loads page data and treats it as the saved baseline.
    pub fn load_page(&mut self, page: PageData) {
        self.saved = page.clone();
        self.page = page;
        self.generated_ids.clear();
        self.temp_content = None;
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switches the mode, notifying listeners. Returns false when the mode
    /// is already active.
    pub fn set_mode(&mut self, mode: Mode) -> bool {
        if mode == self.mode {
            return false;
        }
        let old_mode = self.mode;
        self.mode = mode;
        self.notify(BuilderEvent::ModeChange {
            new_mode: mode,
            old_mode,
        });
        true
    }

    pub fn select_elm(&mut self, id: impl Into<String>) {
        let id = id.into();
        self.selected_elm_id = Some(id.clone());
        self.notify(BuilderEvent::ElmSelected(id));
    }

    pub fn is_page_changed(&self) -> bool {
        self.page != self.saved
    }

    /// Marks the current page state as persisted.
    pub fn commit_saved(&mut self) {
        self.saved = self.page.clone();
    }

    /// The page state as of the last save, for building field-level diffs.
    pub fn saved_page(&self) -> &PageData {
        &self.saved
    }

    /// Snapshots the full document text. Move drags snapshot before excising
    /// the dragged shortcode so placement queries see the document without it
    /// and the original can be restored on drop or cancel.
    pub fn save_temp_content(&mut self) {
        self.temp_content = Some(self.page.content.clone());
    }

    /// Swaps the snapshot back in. Returns false when none is held.
    pub fn restore_temp_content(&mut self) -> bool {
        match self.temp_content.take() {
            Some(snapshot) => {
                self.page.content = snapshot;
                true
            }
            None => false,
        }
    }

    pub fn is_empty_temp_content(&self) -> bool {
        self.temp_content.is_none()
    }

    pub(crate) fn notify(&mut self, event: BuilderEvent) {
        self.sink.notify(event);
    }

    pub(crate) fn next_request_id(&mut self) -> String {
        self.request_seq += 1;
        format!("render:{}", self.request_seq)
    }
}

impl fmt::Debug for BuilderSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuilderSession")
            .field("mode", &self.mode)
            .field("selected_elm_id", &self.selected_elm_id)
            .field("content_len", &self.page.content.len())
            .finish()
    }
}
