#![deny(unsafe_code)]

//! Shared test utilities for the udpbar workspace.
//!
//! Provides config builders, a recording render bridge, a spawned-listener
//! harness, and tracing helpers so that individual crate tests stay concise.
//!
//! Add this crate as a `[dev-dependency]` in any workspace member:
//!
//! ```toml
//! [dev-dependencies]
//! udpbar-test-utils = { workspace = true }
//! ```

pub mod config;
pub mod daemon;
pub mod listener;
pub mod render;
pub mod tracing_setup;

pub use config::TestConfigBuilder;
pub use daemon::TestDaemon;
pub use listener::TestListener;
pub use render::RecordingRenderer;
