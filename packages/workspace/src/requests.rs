//! Render/save endpoint contracts and in-flight request tracking.
//!
//! At most one request per logical request id is in flight. Submitting a
//! new request under an id that is already running aborts the previous
//! one: its completion handler never fires, its abort handler does. There
//! is no retry policy; failures surface to the caller's handler once.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::debug;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Request to the render endpoint. Content may be a full document or a
/// single element's fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub content: String,
    /// Ask the endpoint to echo back the normalized shortcode text.
    #[serde(rename = "isReturnContent", default)]
    pub is_return_content: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderResponse {
    pub success: bool,
    pub data: RenderPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RenderPayload {
    Rendered {
        html: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },
    Failure {
        message: String,
    },
}

/// Request to the save endpoint; only changed fields are carried.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_status: Option<String>,
    #[serde(rename = "pageMeta", default)]
    pub page_meta: std::collections::BTreeMap<String, String>,
    #[serde(flatten)]
    pub fields: std::collections::BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<SaveData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    pub message: String,
}

/// Renders shortcode text to preview HTML.
pub trait RenderEndpoint: Send + Sync {
    fn render(&self, request: RenderRequest) -> BoxFuture<Result<RenderResponse, RequestError>>;
}

/// Persists page data.
pub trait SaveEndpoint: Send + Sync {
    fn save(&self, request: SaveRequest) -> BoxFuture<Result<SaveResponse, RequestError>>;
}

struct Inflight {
    handle: JoinHandle<()>,
    on_abort: Option<Box<dyn FnOnce() + Send>>,
    generation: u64,
}

#[derive(Default)]
struct Inner {
    inflight: HashMap<String, Inflight>,
    generation: u64,
}

/// Tracks in-flight requests by id and enforces the single-flight rule.
#[derive(Clone, Default)]
pub struct RequestManager {
    inner: Arc<Mutex<Inner>>,
}

impl RequestManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `future` under `request_id`, aborting any request already in
    /// flight under the same id. `on_done` fires with the outcome unless
    /// this request is itself superseded, in which case `on_abort` fires
    /// instead.
    pub fn submit<T: Send + 'static>(
        &self,
        request_id: &str,
        future: BoxFuture<Result<T, RequestError>>,
        on_done: impl FnOnce(Result<T, RequestError>) + Send + 'static,
        on_abort: impl FnOnce() + Send + 'static,
    ) {
        let mut inner = self.inner.lock().expect("request table poisoned");
        inner.generation += 1;
        let generation = inner.generation;

        if let Some(previous) = inner.inflight.remove(request_id) {
            previous.handle.abort();
            if let Some(abort) = previous.on_abort {
                abort();
            }
            debug!(request_id, "aborted superseded request");
        }

        let table = Arc::clone(&self.inner);
        let id = request_id.to_owned();
        let handle = tokio::spawn(async move {
            let result = future.await;
            {
                let mut inner = table.lock().expect("request table poisoned");
                let finished = inner
                    .inflight
                    .get(&id)
                    .map(|entry| entry.generation == generation)
                    .unwrap_or(false);
                if finished {
                    inner.inflight.remove(&id);
                }
            }
            on_done(result);
        });
        inner.inflight.insert(
            request_id.to_owned(),
            Inflight {
                handle,
                on_abort: Some(Box::new(on_abort)),
                generation,
            },
        );
    }

    /// Explicitly aborts the request under `request_id`, firing its abort
    /// handler. Returns false when nothing was in flight.
    pub fn abort(&self, request_id: &str) -> bool {
        let mut inner = self.inner.lock().expect("request table poisoned");
        match inner.inflight.remove(request_id) {
            Some(previous) => {
                previous.handle.abort();
                if let Some(abort) = previous.on_abort {
                    abort();
                }
                true
            }
            None => false,
        }
    }

    pub fn is_inflight(&self, request_id: &str) -> bool {
        self.inner
            .lock()
            .expect("request table poisoned")
            .inflight
            .contains_key(request_id)
    }
}
