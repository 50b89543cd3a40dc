#![deny(unsafe_code)]

//! udpbar core — a status indicator driven by UDP datagrams.
//!
//! External processes send short text commands (`red`, `3`, `quit`) to a UDP
//! port. The core decodes each datagram, resolves it against the icon catalog,
//! stores the resulting visual state, and notifies a render bridge.
//!
//! ```text
//! datagram ─▶ Decoder ─▶ Command ─▶ Resolver ─▶ VisualState ─▶ IconStore ─▶ RenderBridge
//!                           ▲
//!            CommandSender ─┘ (in-process producers share the same path)
//! ```

/// Compile-time build metadata (version, git hash, profile).
pub mod build_info;
/// Static table of color tokens and indexed images.
pub mod catalog;
/// Datagram decoding into typed commands.
pub mod command;
/// Daemon wiring, startup, and shutdown.
pub mod daemon;
/// Type-state UDP listener.
pub mod listener;
/// Typed command producers (in-process and UDP client).
pub mod producer;
/// Render bridge trait and stock bridges.
pub mod render;
/// Command to visual state resolution.
pub mod resolver;
/// The visual state model.
pub mod state;
/// The single authoritative state holder.
pub mod store;

pub use catalog::{IconCatalog, IconColor};
pub use command::{Command, Decoder, decode};
pub use daemon::{Daemon, DaemonError, ShutdownHandle, ShutdownSignal};
pub use listener::{ListenerError, ListenerPhase, ShutdownReason, UdpListener};
pub use producer::{CommandSender, CommandSink, SubmitError, UdpCommandClient};
pub use render::{ChannelRenderer, RenderBridge, RenderEvent, TracingRenderer};
pub use resolver::{Resolution, resolve};
pub use state::VisualState;
pub use store::IconStore;
