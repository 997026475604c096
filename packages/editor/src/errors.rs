//! Error types for the editor.
//!
//! Document operations use defensive returns (`Option`/`bool`); this type
//! covers the genuinely fallible edges: configuration parsing and endpoint
//! plumbing.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid content: {0}")]
    InvalidContent(String),
}
