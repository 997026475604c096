//! Editor-window host.
//!
//! `EditorHost` owns the session, the drag engine and the editor end of
//! the message bus. It drains session notifications into bus envelopes
//! for the preview window, dispatches preview envelopes back into the
//! session and the drag engine, and drives the render/save endpoints
//! through the single-flight request manager.

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::debug;

use usbuilder_dragdrop::{DragEngine, LayoutTree, PointerSample};
use usbuilder_editor::{
    BuilderConfig, BuilderEvent, BuilderSession, Mode, NotifyLevel, PageData, PreviewAction,
    QueueSink, RenderContext,
};

use crate::bus::{Message, PortSender, WindowPort};
use crate::requests::{
    RenderEndpoint, RenderPayload, RenderRequest, RequestError, RequestManager, SaveEndpoint,
    SaveRequest,
};

/// The save endpoint runs under one fixed request id, so a save issued
/// while another is in flight supersedes it.
const SAVE_REQUEST_ID: &str = "save";

pub struct EditorHost {
    pub session: BuilderSession,
    pub engine: DragEngine,
    layout: Option<LayoutTree>,
    events: QueueSink,
    port: WindowPort,
    render: Arc<dyn RenderEndpoint>,
    save: Arc<dyn SaveEndpoint>,
    requests: RequestManager,
    save_committed: Arc<AtomicBool>,
}

impl EditorHost {
    pub fn new(
        config: BuilderConfig,
        panel_hidden: bool,
        port: WindowPort,
        render: Arc<dyn RenderEndpoint>,
        save: Arc<dyn SaveEndpoint>,
    ) -> Self {
        let events = QueueSink::new();
        let session = BuilderSession::new(config, panel_hidden).with_sink(events.clone());
        Self {
            session,
            engine: DragEngine::new(),
            layout: None,
            events,
            port,
            render,
            save,
            requests: RequestManager::new(),
            save_committed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn load_page(&mut self, page: PageData) {
        self.session.load_page(page);
        self.port
            .post("pageData", json!(self.session.page.content));
    }

    /// One host turn: apply async completions, dispatch everything the
    /// preview sent, then forward the session's notifications.
    pub fn poll(&mut self) {
        if self.save_committed.swap(false, Ordering::SeqCst) {
            self.session.commit_saved();
        }
        while let Some(message) = self.port.try_recv() {
            self.dispatch(message);
        }
        self.flush_events();
    }

    fn dispatch(&mut self, message: Message) {
        let Message { event, args } = message;
        match event.as_str() {
            "layout" => match serde_json::from_value::<LayoutTree>(args) {
                Ok(tree) => self.layout = Some(tree),
                Err(error) => debug!(%error, "dropped undecodable layout"),
            },
            "selectElm" => {
                if let Some(id) = args.as_str() {
                    self.session.select_elm(id);
                }
            }
            "hoverElm" => {
                self.session.hovered_elm_id = args.as_str().map(str::to_owned);
            }
            "setMode" => {
                if let Some(mode) = args.as_str().and_then(|s| Mode::from_str(s).ok()) {
                    self.session.set_mode(mode);
                }
            }
            "startAdd" => {
                let elm_type = args.get("type").and_then(Value::as_str).map(str::to_owned);
                let page = args.get("page").cloned().and_then(|v| serde_json::from_value(v).ok());
                if let (Some(elm_type), Some(page)) = (elm_type, page) {
                    self.engine.start_add(&mut self.session, &elm_type, page);
                }
            }
            "startMove" => {
                let node = args.get("node").and_then(Value::as_u64).map(|n| n as usize);
                let page = args.get("page").cloned().and_then(|v| serde_json::from_value(v).ok());
                if let (Some(node), Some(page)) = (node, page) {
                    self.engine.start_move(node, page);
                }
            }
            "pointerMove" => {
                let sample: Option<PointerSample> = serde_json::from_value(args).ok();
                if let (Some(sample), Some(tree)) = (sample, self.layout.as_ref()) {
                    if let Some(place) =
                        self.engine.maybe_drag(&mut self.session, tree, &sample)
                    {
                        let args = serde_json::to_value(&place).unwrap_or_default();
                        self.port.post("dropPlace", args);
                    }
                }
            }
            "endDrag" => {
                let affected = self.engine.end_drag(&mut self.session);
                self.port.post("dragEnd", json!(affected));
            }
            "cancelDrag" => {
                self.engine.cancel(&mut self.session);
                self.port.post("dragEnd", Value::Null);
            }
            "save" => self.save_page(),
            other => debug!(event = other, "unhandled preview event"),
        }
    }

    /// Forwards queued session notifications to the preview and turns
    /// render requests into endpoint calls.
    pub fn flush_events(&mut self) {
        for event in self.events.drain() {
            match event {
                BuilderEvent::ContentChange => {
                    self.port.post("contentChange", Value::Null);
                }
                BuilderEvent::ModeChange { new_mode, old_mode } => {
                    self.port.post(
                        "modeChange",
                        json!([new_mode.to_string(), old_mode.to_string()]),
                    );
                }
                BuilderEvent::ElmSelected(id) => {
                    self.port.post("elmSelected", json!(id));
                }
                BuilderEvent::ColumnChange { row_id } => {
                    self.port.post("columnChange", json!(row_id));
                }
                BuilderEvent::ShowAddPanel => {
                    self.port.post("showAddPanel", Value::Null);
                }
                BuilderEvent::Notify { level, message } => {
                    self.notify(level, &message);
                }
                BuilderEvent::Preview(action) => self.forward_preview_action(action),
                BuilderEvent::RenderRequest { request_id, content, context } => {
                    self.submit_render(request_id, content, context);
                }
            }
        }
    }

    fn forward_preview_action(&mut self, action: PreviewAction) {
        match action {
            PreviewAction::HideHighlight => {
                self.port.post("hideHighlight", Value::Null);
            }
            PreviewAction::RemoveElm(id) => {
                self.port.post("removeElm", json!(id));
            }
            PreviewAction::MoveElm { parent_id, position, elm_id } => {
                self.port.post(
                    "moveElm",
                    json!({
                        "parentId": parent_id,
                        "position": serde_json::to_value(position).unwrap_or_default(),
                        "elmId": elm_id,
                    }),
                );
            }
            PreviewAction::ShowPreloader { insert, is_container } => {
                self.port.post(
                    "showPreloader",
                    json!({
                        "insert": serde_json::to_value(&insert).unwrap_or_default(),
                        "isContainer": is_container,
                    }),
                );
            }
            PreviewAction::HidePreloader { target_id } => {
                self.port.post("hidePreloader", json!(target_id));
            }
        }
    }

    fn submit_render(&mut self, request_id: String, content: String, context: RenderContext) {
        let request = RenderRequest {
            content,
            is_return_content: matches!(context, RenderContext::Import),
        };
        let sender = self.port.sender();
        let context_value = serde_json::to_value(&context).unwrap_or_default();
        let id = request_id.clone();
        let superseded = request_id.clone();
        self.requests.submit(
            &request_id,
            self.render.render(request),
            move |result| render_done(&sender, &id, context_value, result),
            move || debug!(request_id = %superseded, "render superseded"),
        );
    }

    /// Builds a save request out of the fields that differ from the last
    /// saved snapshot and submits it. A save already in flight is aborted.
    pub fn save_page(&mut self) {
        if !self.session.is_page_changed() {
            return;
        }
        let saved = self.session.saved_page();
        let page = &self.session.page;

        let mut request = SaveRequest::default();
        if page.content != saved.content {
            request.post_content = Some(page.content.clone());
        }
        if page.custom_css != saved.custom_css {
            request
                .fields
                .insert("custom_css".to_owned(), page.custom_css.clone());
        }
        for (name, value) in &page.page_meta {
            if saved.meta(name) != Some(value.as_str()) {
                request.page_meta.insert(name.clone(), value.clone());
            }
        }
        for (name, value) in &page.fields {
            if saved.field(name) == Some(value.as_str()) {
                continue;
            }
            match name.as_str() {
                "post_title" => request.post_title = Some(value.clone()),
                "post_status" => request.post_status = Some(value.clone()),
                _ => {
                    request.fields.insert(name.clone(), value.clone());
                }
            }
        }

        let sender = self.port.sender();
        let committed = Arc::clone(&self.save_committed);
        self.requests.submit(
            SAVE_REQUEST_ID,
            self.save.save(request),
            move |result| match result {
                Ok(response) if response.success => {
                    committed.store(true, Ordering::SeqCst);
                    let message = response
                        .data
                        .map(|data| data.message)
                        .unwrap_or_else(|| "Saved".to_owned());
                    post_notify(&sender, NotifyLevel::Success, &message);
                }
                Ok(response) => {
                    let message = response
                        .data
                        .map(|data| data.message)
                        .unwrap_or_else(|| "Save failed".to_owned());
                    post_notify(&sender, NotifyLevel::Error, &message);
                }
                Err(error) => post_notify(&sender, NotifyLevel::Error, &error.to_string()),
            },
            || debug!("save superseded"),
        );
    }

    fn notify(&self, level: NotifyLevel, message: &str) {
        post_notify(&self.port.sender(), level, message);
    }
}

fn level_name(level: NotifyLevel) -> &'static str {
    match level {
        NotifyLevel::Info => "info",
        NotifyLevel::Success => "success",
        NotifyLevel::Error => "error",
    }
}

fn post_notify(sender: &PortSender, level: NotifyLevel, message: &str) {
    sender.post(
        "notify",
        json!({ "level": level_name(level), "message": message }),
    );
}

fn render_done(
    sender: &PortSender,
    request_id: &str,
    context: Value,
    result: Result<crate::requests::RenderResponse, RequestError>,
) {
    match result {
        Ok(response) if response.success => {
            if let RenderPayload::Rendered { html, content } = response.data {
                sender.post(
                    "elmRender",
                    json!({
                        "requestId": request_id,
                        "context": context,
                        "html": html,
                        "content": content,
                    }),
                );
            }
        }
        Ok(response) => {
            let message = match response.data {
                RenderPayload::Failure { message } => message,
                RenderPayload::Rendered { .. } => "Render failed".to_owned(),
            };
            post_notify(sender, NotifyLevel::Error, &message);
        }
        Err(error) => post_notify(sender, NotifyLevel::Error, &error.to_string()),
    }
}
