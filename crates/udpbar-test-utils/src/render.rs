//! A render bridge that records everything it is asked to draw.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use udpbar_core::{RenderBridge, VisualState};

/// Records every state change and fatal report, in order.
///
/// Clones share the same recording, so a test can keep one clone and hand
/// another to the store.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    states: Arc<Mutex<Vec<VisualState>>>,
    fatal: Arc<Mutex<Vec<String>>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all rendered states.
    pub fn states(&self) -> Vec<VisualState> {
        self.states.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Snapshot of all fatal messages.
    pub fn fatal_messages(&self) -> Vec<String> {
        self.fatal.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.states.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Poll until at least `n` states have been rendered or `timeout` elapses.
    /// Returns whether the count was reached.
    pub async fn wait_for(&self, n: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if self.len() >= n {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.len() >= n
    }
}

impl RenderBridge for RecordingRenderer {
    fn on_state_changed(&self, state: VisualState) {
        if let Ok(mut states) = self.states.lock() {
            states.push(state);
        }
    }

    fn on_fatal(&self, message: &str) {
        if let Ok(mut fatal) = self.fatal.lock() {
            fatal.push(message.to_string());
        }
    }
}
