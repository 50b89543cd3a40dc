//! Spawned-listener harness.
//!
//! [`TestListener`] binds a [`UdpListener`] on an ephemeral loopback port,
//! runs it on a tokio task, and keeps a client socket for sending datagrams.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use udpbar_config::AppConfig;
use udpbar_core::listener::phase::Closed;
use udpbar_core::producer::command_channel;
use udpbar_core::resolver::resolve_initial;
use udpbar_core::{
    CommandSender, Decoder, IconCatalog, IconStore, ListenerError, ShutdownSignal, UdpListener,
};

use crate::config::TestConfigBuilder;
use crate::render::RecordingRenderer;
use crate::tracing_setup::init_test_tracing;

/// How long harness helpers wait before declaring a test hung.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

type ListenerTask = JoinHandle<Result<UdpListener<Closed>, ListenerError>>;

/// A running listener plus handles to everything around it.
pub struct TestListener {
    pub addr: SocketAddr,
    pub store: Arc<IconStore>,
    pub catalog: Arc<IconCatalog>,
    pub renderer: RecordingRenderer,
    pub sender: CommandSender,
    shutdown_tx: broadcast::Sender<ShutdownSignal>,
    client: UdpSocket,
    task: ListenerTask,
}

impl TestListener {
    /// Spawn a listener with the default test configuration.
    pub async fn spawn() -> Self {
        Self::spawn_with(&TestConfigBuilder::new().build()).await
    }

    /// Spawn a listener configured by `config` (its port is usually 0).
    pub async fn spawn_with(config: &AppConfig) -> Self {
        init_test_tracing();
        let catalog = Arc::new(IconCatalog::from_config(&config.icon));
        let decoder = Decoder::from_config(&config.listener);
        let initial = resolve_initial(&config.icon.initial, &decoder, &catalog);
        let renderer = RecordingRenderer::new();
        let store = Arc::new(IconStore::new(initial, Arc::new(renderer.clone())));
        let (sender, commands) = command_channel();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let listener = UdpListener::new(config.listen_addr(), Arc::clone(&catalog), Arc::clone(&store))
            .with_decoder(decoder)
            .with_commands(commands)
            .with_shutdown(shutdown_rx)
            .bind()
            .await
            .expect("failed to bind test listener");
        let addr = listener.local_addr();
        let task = tokio::spawn(listener.run());

        let client = UdpSocket::bind("127.0.0.1:0")
            .await
            .expect("failed to bind test client");

        Self {
            addr,
            store,
            catalog,
            renderer,
            sender,
            shutdown_tx,
            client,
            task,
        }
    }

    /// Send one datagram to the listener.
    pub async fn send(&self, payload: &[u8]) {
        self.client
            .send_to(payload, self.addr)
            .await
            .expect("failed to send datagram");
    }

    /// Wait until `n` states have been rendered, panicking on timeout.
    pub async fn wait_for_renders(&self, n: usize) {
        assert!(
            self.renderer.wait_for(n, TEST_TIMEOUT).await,
            "expected {n} renders, saw {:?}",
            self.renderer.states()
        );
    }

    /// Broadcast an external shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(ShutdownSignal);
    }

    /// Whether the listener task has finished.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the listener task to finish, panicking on timeout.
    pub async fn join(self) -> Result<UdpListener<Closed>, ListenerError> {
        tokio::time::timeout(TEST_TIMEOUT, self.task)
            .await
            .expect("listener did not stop in time")
            .expect("listener task panicked")
    }
}
