//! Cross-window message bus.
//!
//! The editor shell and the embedded preview run as separate windows and
//! talk only through JSON envelopes of the shape `["usb", event, args]`.
//! Decoding is defensive: anything that is not a well-formed envelope in
//! our namespace is silently dropped. Delivery is FIFO per channel; there
//! is no ordering guarantee across the two directions.

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

/// Envelope namespace token; foreign messages are ignored.
pub const NAMESPACE: &str = "usb";

/// A decoded envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub event: String,
    pub args: Value,
}

/// Encodes an envelope to its wire form.
pub fn encode_message(event: &str, args: Value) -> String {
    let envelope = Value::Array(vec![NAMESPACE.into(), event.into(), args]);
    serde_json::to_string(&envelope).unwrap_or_default()
}

/// Decodes a raw payload, returning `None` for anything malformed or
/// outside the namespace.
pub fn decode_message(raw: &str) -> Option<Message> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let parts = value.as_array()?;
    if parts.first()?.as_str()? != NAMESPACE {
        return None;
    }
    let event = parts.get(1)?.as_str()?.to_owned();
    let args = parts.get(2).cloned().unwrap_or(Value::Null);
    Some(Message { event, args })
}

/// Sending half of a window's channel, cloneable into async tasks.
#[derive(Debug, Clone)]
pub struct PortSender {
    tx: mpsc::UnboundedSender<String>,
}

impl PortSender {
    /// Posts an envelope to the opposite window. Returns false once the
    /// other side is gone.
    pub fn post(&self, event: &str, args: Value) -> bool {
        self.tx.send(encode_message(event, args)).is_ok()
    }

    /// Posts an already-encoded payload as-is.
    pub fn post_raw(&self, raw: impl Into<String>) -> bool {
        self.tx.send(raw.into()).is_ok()
    }
}

/// One window's end of the bridge.
#[derive(Debug)]
pub struct WindowPort {
    sender: PortSender,
    rx: mpsc::UnboundedReceiver<String>,
}

impl WindowPort {
    /// Creates the two connected ends, editor side first.
    pub fn pair() -> (WindowPort, WindowPort) {
        let (editor_tx, editor_rx) = mpsc::unbounded_channel();
        let (preview_tx, preview_rx) = mpsc::unbounded_channel();
        (
            WindowPort {
                sender: PortSender { tx: preview_tx },
                rx: editor_rx,
            },
            WindowPort {
                sender: PortSender { tx: editor_tx },
                rx: preview_rx,
            },
        )
    }

    pub fn sender(&self) -> PortSender {
        self.sender.clone()
    }

    pub fn post(&self, event: &str, args: Value) -> bool {
        self.sender.post(event, args)
    }

    /// Waits for the next decodable envelope, skipping foreign payloads.
    pub async fn recv(&mut self) -> Option<Message> {
        loop {
            let raw = self.rx.recv().await?;
            match decode_message(&raw) {
                Some(message) => return Some(message),
                None => debug!(raw, "dropped undecodable message"),
            }
        }
    }

    /// Drains one decodable envelope without waiting.
    pub fn try_recv(&mut self) -> Option<Message> {
        while let Ok(raw) = self.rx.try_recv() {
            match decode_message(&raw) {
                Some(message) => return Some(message),
                None => debug!(raw, "dropped undecodable message"),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelopes_round_trip() {
        let raw = encode_message("contentChange", json!(["vc_row:1", 2]));
        let message = decode_message(&raw).unwrap();
        assert_eq!(message.event, "contentChange");
        assert_eq!(message.args, json!(["vc_row:1", 2]));
    }

    #[test]
    fn foreign_and_malformed_payloads_decode_to_none() {
        assert_eq!(decode_message("not json"), None);
        assert_eq!(decode_message(r#"{"usb": "object"}"#), None);
        assert_eq!(decode_message(r#"["other", "event", null]"#), None);
        assert_eq!(decode_message(r#"["usb"]"#), None);
        // A missing args slot defaults to null.
        let message = decode_message(r#"["usb", "ping"]"#).unwrap();
        assert_eq!(message.args, Value::Null);
    }

    #[tokio::test]
    async fn delivery_is_fifo_and_skips_garbage() {
        let (editor, mut preview) = WindowPort::pair();
        editor.post("first", Value::Null);
        editor.sender().post_raw("garbage");
        editor.post("second", json!(2));

        assert_eq!(preview.recv().await.unwrap().event, "first");
        assert_eq!(preview.recv().await.unwrap().event, "second");
        assert!(preview.try_recv().is_none());
    }

    #[tokio::test]
    async fn the_two_directions_are_independent_channels() {
        let (mut editor, mut preview) = WindowPort::pair();
        editor.post("toPreview", Value::Null);
        preview.post("toEditor", Value::Null);

        assert_eq!(preview.recv().await.unwrap().event, "toPreview");
        assert_eq!(editor.recv().await.unwrap().event, "toEditor");
    }
}
