//! JSON-lines rendering surface.
//!
//! Writes one JSON object per state change to a writer (stdout in practice),
//! which lets status bars such as waybar or i3blocks display the indicator.
//!
//! Rendering only enqueues. A dedicated writer thread owns the output, so a
//! reader that stops draining the pipe stalls that thread and never the
//! listener.

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use udpbar_core::{IconCatalog, RenderBridge, VisualState};

#[derive(Debug, Serialize)]
struct RenderLine {
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<VisualState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Render bridge emitting JSON lines through a writer thread.
pub struct JsonLinesRenderer {
    tx: mpsc::Sender<RenderLine>,
    catalog: Arc<IconCatalog>,
}

/// Handle on the writer thread behind a [`JsonLinesRenderer`].
pub struct JsonWriter<W> {
    done: mpsc::Receiver<W>,
}

impl JsonLinesRenderer {
    /// Start the writer thread for `out`.
    pub fn spawn<W>(out: W, catalog: Arc<IconCatalog>) -> io::Result<(Self, JsonWriter<W>)>
    where
        W: Write + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let (done_tx, done) = mpsc::sync_channel(1);
        // Detached: the thread ends when the last sender is dropped.
        let _ = thread::Builder::new()
            .name("udpbar-json".to_string())
            .spawn(move || {
                let out = write_lines(out, rx);
                let _ = done_tx.send(out);
            })?;
        Ok((Self { tx, catalog }, JsonWriter { done }))
    }

    fn enqueue(&self, line: RenderLine) {
        if let Err(mpsc::SendError(line)) = self.tx.send(line) {
            warn!(?line, "JSON writer has stopped, render dropped");
        }
    }
}

impl<W> JsonWriter<W> {
    /// Wait up to `timeout` for the writer to finish, returning the output.
    ///
    /// The writer finishes once every renderer is dropped and the queue is
    /// drained, or after a write error.
    pub fn wait(self, timeout: Duration) -> Option<W> {
        self.done.recv_timeout(timeout).ok()
    }
}

fn write_lines<W: Write>(mut out: W, rx: mpsc::Receiver<RenderLine>) -> W {
    for line in rx {
        let result = serde_json::to_writer(&mut out, &line)
            .map_err(io::Error::from)
            .and_then(|()| out.write_all(b"\n"))
            .and_then(|()| out.flush());
        if let Err(e) = result {
            warn!(error = %e, "Failed to write render line, JSON output stopped");
            return out;
        }
    }
    debug!("JSON writer drained");
    out
}

impl RenderBridge for JsonLinesRenderer {
    fn on_state_changed(&self, state: VisualState) {
        let image = match state {
            VisualState::Image(index) => self.catalog.image(index).map(str::to_string),
            _ => None,
        };
        self.enqueue(RenderLine {
            state: Some(state),
            image,
            error: None,
        });
    }

    fn on_fatal(&self, message: &str) {
        self.enqueue(RenderLine {
            state: None,
            image: None,
            error: Some(message.to_string()),
        });
    }
}
