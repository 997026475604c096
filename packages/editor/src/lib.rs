//! # USBuilder Editor
//!
//! Core document editing engine for the builder.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ shortcode: document text → parsed matches   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: session + graph queries + mutations │
//! │  - element graph derived by re-parsing      │
//! │  - relation/placement rules                 │
//! │  - create/move/duplicate/remove/set-values  │
//! │  - mode machine + dirty tracking            │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ workspace: bus + render/save endpoints      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core principles
//!
//! 1. **The string is the source of truth**: no parse tree survives between
//!    operations; every query re-scans the document.
//! 2. **Defensive returns**: malformed input and vetoed placements return
//!    empty/false results and log to the debug channel; nothing throws.
//! 3. **One notification per logical mutation**: each content-changing
//!    operation fires `ContentChange` exactly once.

mod config;
mod document;
mod elm;
mod errors;
mod events;
mod mutations;
mod page;
mod relations;
mod session;

pub use config::{BuilderConfig, Relation, Relations};
pub use document::ITERATION_CAP;
pub use elm::{elm_name, elm_type, is_valid_id};
pub use errors::EditorError;
pub use events::{
    BuilderEvent, EventSink, NotifyLevel, NullSink, PreviewAction, QueueSink, RenderContext,
};
pub use mutations::{InsertPosition, Position};
pub use page::PageData;
pub use session::{BuilderSession, Mode};
