//! Indicator daemon — startup, shutdown, and wiring of the command path.
//!
//! The daemon owns the catalog, the store, the in-process command queue and
//! the shutdown broadcast, and hands explicit references to the listener.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};

use udpbar_config::AppConfig;

use crate::catalog::IconCatalog;
use crate::command::{Command, Decoder};
use crate::listener::{ListenerError, ShutdownReason, UdpListener};
use crate::producer::{CommandSender, command_channel};
use crate::render::RenderBridge;
use crate::resolver::resolve_initial;
use crate::store::IconStore;

/// Shutdown signal sent via broadcast channel.
#[derive(Debug, Clone)]
pub struct ShutdownSignal;

/// Cloneable handle that asks a running daemon to stop.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: broadcast::Sender<ShutdownSignal>,
}

impl ShutdownHandle {
    /// Request a graceful shutdown. Safe to call before the daemon runs.
    pub fn shutdown(&self) {
        let _ = self.tx.send(ShutdownSignal);
    }
}

/// The udpbar daemon.
pub struct Daemon {
    config: AppConfig,
    decoder: Decoder,
    catalog: Arc<IconCatalog>,
    store: Arc<IconStore>,
    command_tx: CommandSender,
    command_rx: mpsc::Receiver<Command>,
    shutdown_tx: broadcast::Sender<ShutdownSignal>,
    shutdown_rx: broadcast::Receiver<ShutdownSignal>,
}

impl Daemon {
    /// Create a daemon whose catalog is built from `config`.
    pub fn new(config: AppConfig, bridge: Arc<dyn RenderBridge>) -> Self {
        let catalog = Arc::new(IconCatalog::from_config(&config.icon));
        Self::with_catalog(config, catalog, bridge)
    }

    /// Create a daemon around an existing catalog, typically one the render
    /// bridge also holds.
    pub fn with_catalog(
        config: AppConfig,
        catalog: Arc<IconCatalog>,
        bridge: Arc<dyn RenderBridge>,
    ) -> Self {
        let decoder = Decoder::from_config(&config.listener);
        let initial = resolve_initial(&config.icon.initial, &decoder, &catalog);
        let store = Arc::new(IconStore::new(initial, bridge));
        let (command_tx, command_rx) = command_channel();
        // Subscribe now so that a shutdown requested before `run` is not lost.
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        Self {
            config,
            decoder,
            catalog,
            store,
            command_tx,
            command_rx,
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Bind the listener and process commands until a quit command, a
    /// shutdown request, or Ctrl-C.
    ///
    /// Fatal errors are reported to the render bridge before being returned.
    pub async fn run(self) -> Result<ShutdownReason, DaemonError> {
        let addr = self.config.listen_addr();
        info!(
            addr = %addr,
            version = %crate::build_info::version_string(),
            images = self.catalog.image_count(),
            "udpbar daemon starting"
        );

        let bridge = Arc::clone(self.store.bridge());
        let bound = UdpListener::new(addr, self.catalog, Arc::clone(&self.store))
            .with_decoder(self.decoder)
            .with_commands(self.command_rx)
            .with_shutdown(self.shutdown_rx)
            .bind()
            .await;
        let listener = match bound {
            Ok(listener) => listener,
            Err(e) => {
                error!(error = %e, "Cannot start listener");
                bridge.on_fatal(&e.to_string());
                return Err(e.into());
            }
        };
        self.store.refresh();

        let shutdown_tx = self.shutdown_tx.clone();
        let ctrl_c = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Ctrl-C received, initiating graceful shutdown");
                let _ = shutdown_tx.send(ShutdownSignal);
            }
        });

        let result = listener.run().await;
        ctrl_c.abort();

        match result {
            Ok(closed) => {
                info!(reason = ?closed.reason(), "Daemon stopped");
                Ok(closed.reason())
            }
            Err(e) => {
                bridge.on_fatal(&e.to_string());
                Err(e.into())
            }
        }
    }

    /// The single authoritative icon state.
    pub fn store(&self) -> Arc<IconStore> {
        Arc::clone(&self.store)
    }

    pub fn catalog(&self) -> Arc<IconCatalog> {
        Arc::clone(&self.catalog)
    }

    /// A producer for in-process commands. Commands go through the same
    /// resolve and store path as datagrams.
    pub fn command_sender(&self) -> CommandSender {
        self.command_tx.clone()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.shutdown_tx.clone(),
        }
    }

    /// Get a reference to the daemon's configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Errors from the daemon runtime.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error(transparent)]
    Listener(#[from] ListenerError),
}

impl DaemonError {
    /// Whether the daemon failed to acquire its port.
    pub fn is_bind_failure(&self) -> bool {
        matches!(self, DaemonError::Listener(ListenerError::Bind { .. }))
    }
}
