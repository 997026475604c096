//! # USBuilder Workspace
//!
//! Glue between the editor window and the preview window: the JSON
//! message bus both sides talk over, the render/save endpoint contracts
//! with single-flight-per-id abort semantics, burst debouncing, and the
//! `EditorHost` that wires a builder session and drag engine onto all of
//! it.

pub mod bus;
pub mod debounce;
pub mod host;
pub mod requests;

pub use bus::{decode_message, encode_message, Message, PortSender, WindowPort, NAMESPACE};
pub use debounce::Debouncer;
pub use host::EditorHost;
pub use requests::{
    BoxFuture, RenderEndpoint, RenderPayload, RenderRequest, RenderResponse, RequestError,
    RequestManager, SaveData, SaveEndpoint, SaveRequest, SaveResponse,
};

/// Installs the process-wide tracing subscriber, reading the filter from
/// `RUST_LOG`. Safe to call more than once.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
