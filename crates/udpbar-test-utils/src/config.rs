//! Configuration builders for tests.

use std::path::PathBuf;

use udpbar_config::AppConfig;

/// Fluent builder for [`AppConfig`] in tests.
///
/// Defaults to an ephemeral loopback port so tests never collide. The result
/// is not validated, which is what allows port 0.
///
/// # Example
///
/// ```ignore
/// let config = TestConfigBuilder::new()
///     .quit_token("bye")
///     .images(&["a", "b"])
///     .build();
/// ```
pub struct TestConfigBuilder {
    config: AppConfig,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.listener.port = 0;
        Self { config }
    }

    pub fn max_datagram_len(mut self, len: usize) -> Self {
        self.config.listener.max_datagram_len = len;
        self
    }

    pub fn quit_token(mut self, token: &str) -> Self {
        self.config.listener.quit_token = token.to_string();
        self
    }

    pub fn initial(mut self, token: &str) -> Self {
        self.config.icon.initial = token.to_string();
        self
    }

    pub fn images(mut self, images: &[&str]) -> Self {
        self.config.icon.images = images.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.icon.image_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
