#![deny(unsafe_code)]

//! Configuration loading, environment overrides, and validation for udpbar.
//!
//! Loads TOML configuration files and validates them. Provides the
//! [`AppConfig`] type as the central configuration structure. A handful of
//! `UDPBAR_*` environment variables may override the file so that scripts can
//! start an indicator on a different port without writing a config file.
//!
//! ## TOML Example
//!
//! ```toml
//! [listener]
//! bind_addr = "127.0.0.1"
//! port = 1738
//! max_datagram_len = 256
//! quit_token = "quit"
//!
//! [icon]
//! initial = "white"
//! images = ["hollow", "filled", "check", "cross", "clock", "bell"]
//! image_dir = "/home/me/.udpbar"
//!
//! [logging]
//! level = "info"
//! ```

use std::collections::HashSet;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Environment variable overriding `listener.port`.
pub const ENV_PORT: &str = "UDPBAR_PORT";

/// Environment variable overriding `listener.bind_addr`.
pub const ENV_BIND: &str = "UDPBAR_BIND";

/// Environment variable overriding `icon.initial`.
pub const ENV_INIT: &str = "UDPBAR_INIT";

/// Largest payload a single UDP datagram can carry over IPv4.
pub const MAX_UDP_PAYLOAD: usize = 65_507;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("invalid value {value:?} in environment variable {var}")]
    Env { var: &'static str, value: String },
}

/// Top-level application configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// UDP listener configuration.
    #[serde(default)]
    pub listener: ListenerConfig,

    /// Icon catalog and initial state.
    #[serde(default)]
    pub icon: IconConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Configuration for the UDP command listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerConfig {
    /// Address the listener binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// UDP port the listener binds to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Datagrams longer than this are dropped without decoding.
    #[serde(default = "default_max_datagram_len")]
    pub max_datagram_len: usize,

    /// Token that asks the indicator to exit.
    #[serde(default = "default_quit_token")]
    pub quit_token: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            max_datagram_len: default_max_datagram_len(),
            quit_token: default_quit_token(),
        }
    }
}

fn default_bind_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    1738
}

fn default_max_datagram_len() -> usize {
    256
}

fn default_quit_token() -> String {
    "quit".to_string()
}

/// Icon catalog configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconConfig {
    /// Command token applied before the first datagram arrives.
    #[serde(default = "default_initial")]
    pub initial: String,

    /// Ordered identifiers of the bundled images, addressed by index.
    #[serde(default = "default_images")]
    pub images: Vec<String>,

    /// Optional directory of extra `*.png` images appended to `images`.
    #[serde(default)]
    pub image_dir: Option<PathBuf>,
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            initial: default_initial(),
            images: default_images(),
            image_dir: None,
        }
    }
}

fn default_initial() -> String {
    "white".to_string()
}

/// The bundled image set, in index order.
pub fn default_images() -> Vec<String> {
    ["hollow", "filled", "check", "cross", "clock", "bell"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug", "trace").
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file at the given path using async I/O.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `UDPBAR_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_overrides(|var| std::env::var(var).ok())
    }

    /// Apply `UDPBAR_*` overrides using `lookup` to read variables, then
    /// re-validate.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_PORT) {
            self.listener.port = value.trim().parse().map_err(|_| ConfigError::Env {
                var: ENV_PORT,
                value: value.clone(),
            })?;
            debug!(port = self.listener.port, "Port overridden from environment");
        }
        if let Some(value) = lookup(ENV_BIND) {
            let addr = value.trim();
            if addr.parse::<IpAddr>().is_err() {
                return Err(ConfigError::Env {
                    var: ENV_BIND,
                    value,
                });
            }
            self.listener.bind_addr = addr.to_string();
            debug!(addr = %self.listener.bind_addr, "Bind address overridden from environment");
        }
        if let Some(value) = lookup(ENV_INIT) {
            let initial = value.trim();
            if initial.is_empty() {
                return Err(ConfigError::Env {
                    var: ENV_INIT,
                    value,
                });
            }
            self.icon.initial = initial.to_string();
            debug!(initial = %self.icon.initial, "Initial icon overridden from environment");
        }
        self.validate()
    }

    /// The socket address string the listener binds to.
    pub fn listen_addr(&self) -> String {
        match self.listener.bind_addr.parse::<IpAddr>() {
            Ok(IpAddr::V6(v6)) => format!("[{v6}]:{}", self.listener.port),
            _ => format!("{}:{}", self.listener.bind_addr, self.listener.port),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listener.port == 0 {
            return Err(ConfigError::Validation(
                "listener.port must be non-zero".to_string(),
            ));
        }
        if self.listener.bind_addr.parse::<IpAddr>().is_err() {
            return Err(ConfigError::Validation(format!(
                "listener.bind_addr must be an IP address, got {:?}",
                self.listener.bind_addr
            )));
        }
        if self.listener.max_datagram_len == 0 || self.listener.max_datagram_len > MAX_UDP_PAYLOAD
        {
            return Err(ConfigError::Validation(format!(
                "listener.max_datagram_len must be in 1..={MAX_UDP_PAYLOAD}, got {}",
                self.listener.max_datagram_len
            )));
        }

        let quit = &self.listener.quit_token;
        if quit.is_empty() || quit.chars().any(char::is_whitespace) {
            return Err(ConfigError::Validation(format!(
                "listener.quit_token must be a single non-empty word, got {quit:?}"
            )));
        }
        if quit.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ConfigError::Validation(format!(
                "listener.quit_token must not be numeric, got {quit:?}"
            )));
        }

        if self.icon.initial.trim().is_empty() {
            return Err(ConfigError::Validation(
                "icon.initial must not be empty".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for (i, image) in self.icon.images.iter().enumerate() {
            if image.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "icon.images[{i}] must not be empty"
                )));
            }
            if !seen.insert(image.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "icon.images[{i}] duplicates {image:?}"
                )));
            }
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.level must be one of {:?}, got {:?}",
                valid_levels, self.logging.level
            )));
        }

        Ok(())
    }
}
