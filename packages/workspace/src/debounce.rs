//! Burst coalescing.
//!
//! Field edits, search input and highlight repositioning fire far faster
//! than a render round-trip can absorb. A `Debouncer` collapses a burst
//! of calls into one callback invocation carrying the last value, with
//! explicit cancel and flush controls. This is a correctness primitive,
//! not a smoothing detail: downstream handlers assume at most one change
//! event per settle window.

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Duration, Instant};

enum Cmd<T> {
    Call(T),
    Cancel,
    Flush,
}

/// Coalesces calls into the last value seen within `delay`.
#[derive(Debug)]
pub struct Debouncer<T> {
    tx: mpsc::UnboundedSender<Cmd<T>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new(delay: Duration, mut callback: impl FnMut(T) + Send + 'static) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let mut pending: Option<T> = None;
            let mut deadline: Option<Instant> = None;
            loop {
                let cmd = match deadline {
                    Some(at) => tokio::select! {
                        cmd = rx.recv() => match cmd {
                            Some(cmd) => Some(cmd),
                            None => break,
                        },
                        _ = sleep_until(at) => None,
                    },
                    None => match rx.recv().await {
                        Some(cmd) => Some(cmd),
                        None => break,
                    },
                };
                match cmd {
                    Some(Cmd::Call(value)) => {
                        pending = Some(value);
                        deadline = Some(Instant::now() + delay);
                    }
                    Some(Cmd::Cancel) => {
                        pending = None;
                        deadline = None;
                    }
                    // A flush and an expired deadline fire the same way.
                    Some(Cmd::Flush) | None => {
                        deadline = None;
                        if let Some(value) = pending.take() {
                            callback(value);
                        }
                    }
                }
            }
        });
        Self { tx }
    }

    /// Schedules `value`, replacing any pending one and restarting the
    /// settle window.
    pub fn call(&self, value: T) {
        let _ = self.tx.send(Cmd::Call(value));
    }

    /// Drops the pending invocation, if any.
    pub fn cancel(&self) {
        let _ = self.tx.send(Cmd::Cancel);
    }

    /// Fires the pending invocation immediately.
    pub fn flush(&self) {
        let _ = self.tx.send(Cmd::Flush);
    }
}
