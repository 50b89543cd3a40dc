//! Daemon test helpers.
//!
//! Helpers for constructing [`Daemon`] instances in tests from temporary
//! config files, with a [`RecordingRenderer`] attached.

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;
use udpbar_config::AppConfig;
use udpbar_core::Daemon;

use crate::render::RecordingRenderer;
use crate::tracing_setup::init_test_tracing;

/// A test-scoped daemon with an owned temp directory for config files.
///
/// The temp directory is deleted automatically when this value is dropped,
/// guaranteeing cleanup even on panic.
pub struct TestDaemon {
    pub daemon: Daemon,
    pub renderer: RecordingRenderer,
    pub config_path: PathBuf,
    _temp_dir: TempDir,
}

impl TestDaemon {
    /// Create a daemon backed by a temporary config file containing the given
    /// TOML string.
    pub async fn with_toml(toml_content: &str) -> Self {
        init_test_tracing();
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("udpbar.toml");
        tokio::fs::write(&config_path, toml_content)
            .await
            .expect("failed to write test config");

        let config = AppConfig::load(&config_path)
            .await
            .expect("failed to parse test config");

        let renderer = RecordingRenderer::new();
        let daemon = Daemon::new(config, Arc::new(renderer.clone()));

        Self {
            daemon,
            renderer,
            config_path,
            _temp_dir: temp_dir,
        }
    }

    /// Create a daemon with default config in a temp directory.
    pub async fn default_config() -> Self {
        Self::with_toml("").await
    }
}
