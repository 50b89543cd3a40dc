//! Icon state store — the single authoritative [`VisualState`].
//!
//! Backed by a `tokio::sync::watch` channel: readers always see a whole
//! value, writers replace it atomically, and subscribers observe the latest
//! state with intermediate updates coalesced.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

use crate::render::RenderBridge;
use crate::state::VisualState;

/// Holds the current visual state and notifies the render bridge on change.
pub struct IconStore {
    state: watch::Sender<VisualState>,
    bridge: Arc<dyn RenderBridge>,
}

impl IconStore {
    pub fn new(initial: VisualState, bridge: Arc<dyn RenderBridge>) -> Self {
        let (state, _) = watch::channel(initial);
        Self { state, bridge }
    }

    /// The current state. Never blocks on a writer for longer than a copy.
    pub fn get(&self) -> VisualState {
        *self.state.borrow()
    }

    /// Replace the current state and notify the render bridge once.
    ///
    /// Returns the previous state.
    pub fn set(&self, next: VisualState) -> VisualState {
        let previous = self.state.send_replace(next);
        self.bridge.on_state_changed(next);
        previous
    }

    /// Re-send the current state to the render bridge without changing it.
    pub fn refresh(&self) {
        self.bridge.on_state_changed(self.get());
    }

    /// Subscribe to state changes. The receiver starts at the current state.
    pub fn subscribe(&self) -> watch::Receiver<VisualState> {
        self.state.subscribe()
    }

    pub fn bridge(&self) -> &Arc<dyn RenderBridge> {
        &self.bridge
    }
}

impl fmt::Debug for IconStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IconStore")
            .field("state", &self.get())
            .finish_non_exhaustive()
    }
}
