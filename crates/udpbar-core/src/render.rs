//! Render bridge — the boundary between the state machine and whatever
//! draws the icon.
//!
//! The store calls [`RenderBridge::on_state_changed`] after every update, from
//! the listener's task. Implementations must return quickly and marshal to
//! their own thread if they need one; the core never waits on rendering and
//! never retries a failed render.

use std::sync::mpsc;
use std::sync::Arc;

use tracing::{error, info, trace};

use crate::catalog::IconCatalog;
use crate::state::VisualState;

/// Receives visual updates from the core.
pub trait RenderBridge: Send + Sync {
    /// Display `state`.
    fn on_state_changed(&self, state: VisualState);

    /// Surface a fatal failure (e.g. the port could not be bound) before the
    /// process exits.
    fn on_fatal(&self, _message: &str) {}
}

impl<F> RenderBridge for F
where
    F: Fn(VisualState) + Send + Sync,
{
    fn on_state_changed(&self, state: VisualState) {
        self(state)
    }
}

/// A bridge that only logs.
///
/// Used when running headless, where the log is the rendering surface.
#[derive(Debug, Clone)]
pub struct TracingRenderer {
    catalog: Arc<IconCatalog>,
}

impl TracingRenderer {
    pub fn new(catalog: Arc<IconCatalog>) -> Self {
        Self { catalog }
    }
}

impl RenderBridge for TracingRenderer {
    fn on_state_changed(&self, state: VisualState) {
        match state {
            VisualState::Image(index) => {
                let name = self.catalog.image(index).unwrap_or("?");
                info!(state = %state, image = name, "Icon updated");
            }
            _ => info!(state = %state, "Icon updated"),
        }
    }

    fn on_fatal(&self, message: &str) {
        error!(message, "Indicator failed");
    }
}

/// Events handed from the core to a UI thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderEvent {
    StateChanged(VisualState),
    Fatal(String),
}

/// A bridge that forwards events over a channel to a thread that owns the
/// real tray icon.
///
/// Sends never block. Events sent after the receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelRenderer {
    tx: mpsc::Sender<RenderEvent>,
}

impl ChannelRenderer {
    /// Create a renderer and the receiver the UI thread should drain.
    pub fn new() -> (Self, mpsc::Receiver<RenderEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: RenderEvent) {
        if self.tx.send(event).is_err() {
            trace!("Render receiver gone, dropping event");
        }
    }
}

impl RenderBridge for ChannelRenderer {
    fn on_state_changed(&self, state: VisualState) {
        self.send(RenderEvent::StateChanged(state));
    }

    fn on_fatal(&self, message: &str) {
        self.send(RenderEvent::Fatal(message.to_string()));
    }
}
