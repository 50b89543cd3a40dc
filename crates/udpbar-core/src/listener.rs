//! Type-state UDP listener — enforces `Unbound → Listening → Closed`.
//!
//! The listening task is the only writer to the [`IconStore`]. Each datagram
//! runs decode → resolve → set synchronously; the task suspends only while
//! waiting for the next datagram, in-process command, or shutdown signal.
//! The transient `ShuttingDown` phase happens inside [`UdpListener::run`].

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info};

use crate::catalog::IconCatalog;
use crate::command::{Command, Decoder};
use crate::daemon::ShutdownSignal;
use crate::resolver::{Resolution, resolve};
use crate::store::IconStore;

/// Listener lifecycle states.
pub mod phase {
    use super::*;

    /// Configured but not yet bound.
    pub struct Unbound {
        pub(super) addr: String,
        pub(super) parts: super::Parts,
    }

    /// Bound and ready to receive.
    pub struct Listening {
        pub(super) socket: UdpSocket,
        pub(super) local_addr: SocketAddr,
        pub(super) parts: super::Parts,
    }

    /// Socket released.
    pub struct Closed {
        pub(super) local_addr: SocketAddr,
        pub(super) reason: ShutdownReason,
    }
}

/// Runtime view of the listener lifecycle, for logging and status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerPhase {
    Unbound,
    Listening,
    ShuttingDown,
    Closed,
}

/// Why a listener stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// A quit command arrived over the network or in-process.
    QuitCommand,
    /// The owner requested shutdown (signal handler, UI, test).
    External,
}

/// Errors from the listener.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("failed to bind UDP socket on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("UDP socket failed while listening: {0}")]
    Receive(#[source] io::Error),
}

/// Everything the listening loop needs besides the socket.
pub(crate) struct Parts {
    decoder: Decoder,
    catalog: Arc<IconCatalog>,
    store: Arc<IconStore>,
    commands: Option<mpsc::Receiver<Command>>,
    shutdown: Option<broadcast::Receiver<ShutdownSignal>>,
}

/// The UDP command listener.
///
/// Generic over its lifecycle phase `S`; a `Listening` listener can only be
/// obtained by binding, and a `Closed` one only by running to completion.
pub struct UdpListener<S> {
    state: S,
}

impl UdpListener<phase::Unbound> {
    /// Create a listener that will bind `addr` and apply commands to `store`.
    pub fn new(addr: impl Into<String>, catalog: Arc<IconCatalog>, store: Arc<IconStore>) -> Self {
        Self {
            state: phase::Unbound {
                addr: addr.into(),
                parts: Parts {
                    decoder: Decoder::default(),
                    catalog,
                    store,
                    commands: None,
                    shutdown: None,
                },
            },
        }
    }

    pub fn with_decoder(mut self, decoder: Decoder) -> Self {
        self.state.parts.decoder = decoder;
        self
    }

    /// Also accept in-process commands from the matching
    /// [`CommandSender`](crate::producer::CommandSender).
    pub fn with_commands(mut self, commands: mpsc::Receiver<Command>) -> Self {
        self.state.parts.commands = Some(commands);
        self
    }

    /// Stop when a [`ShutdownSignal`] is broadcast.
    pub fn with_shutdown(mut self, shutdown: broadcast::Receiver<ShutdownSignal>) -> Self {
        self.state.parts.shutdown = Some(shutdown);
        self
    }

    pub fn phase(&self) -> ListenerPhase {
        ListenerPhase::Unbound
    }

    /// Bind the socket. Failure is fatal and is not retried.
    pub async fn bind(self) -> Result<UdpListener<phase::Listening>, ListenerError> {
        let phase::Unbound { addr, parts } = self.state;
        let bind_err = |source: io::Error| ListenerError::Bind {
            addr: addr.clone(),
            source,
        };
        let socket = UdpSocket::bind(addr.as_str()).await.map_err(bind_err)?;
        let local_addr = socket.local_addr().map_err(bind_err)?;
        info!(addr = %local_addr, "UDP listener bound");
        Ok(UdpListener {
            state: phase::Listening {
                socket,
                local_addr,
                parts,
            },
        })
    }
}

impl UdpListener<phase::Listening> {
    pub fn local_addr(&self) -> SocketAddr {
        self.state.local_addr
    }

    pub fn phase(&self) -> ListenerPhase {
        ListenerPhase::Listening
    }

    /// Receive and apply commands until a quit command or shutdown signal.
    ///
    /// Malformed datagrams are dropped. Only a non-transient socket error ends
    /// the loop with an error.
    pub async fn run(self) -> Result<UdpListener<phase::Closed>, ListenerError> {
        let phase::Listening {
            socket,
            local_addr,
            mut parts,
        } = self.state;

        // One spare byte so that truncated oversized datagrams are detectable.
        let mut buf = vec![0u8; parts.decoder.max_len() + 1];
        info!(addr = %local_addr, "Listening for icon commands");

        let reason = loop {
            tokio::select! {
                biased;

                signal = next_shutdown(&mut parts.shutdown) => {
                    if signal {
                        break ShutdownReason::External;
                    }
                    debug!("Shutdown channel closed, only quit commands will stop the listener");
                    parts.shutdown = None;
                }

                command = next_command(&mut parts.commands) => match command {
                    Some(command) => {
                        if parts.apply(&command, "in-process") == Resolution::Quit {
                            break ShutdownReason::QuitCommand;
                        }
                    }
                    None => {
                        debug!("All in-process producers dropped");
                        parts.commands = None;
                    }
                },

                received = socket.recv_from(&mut buf) => match received {
                    Ok((len, peer)) => {
                        let command = parts.decoder.decode(&buf[..len]);
                        if command == Command::Unknown {
                            debug!(%peer, len, "Dropping unrecognized datagram");
                            continue;
                        }
                        debug!(%peer, len, ?command, "Datagram received");
                        if parts.apply(&command, "udp") == Resolution::Quit {
                            break ShutdownReason::QuitCommand;
                        }
                    }
                    Err(e) if is_transient(&e) => {
                        debug!(error = %e, "Transient receive error, continuing");
                    }
                    Err(e) => {
                        error!(addr = %local_addr, error = %e, "UDP socket failed");
                        return Err(ListenerError::Receive(e));
                    }
                },
            }
        };

        info!(?reason, phase = ?ListenerPhase::ShuttingDown, "Listener shutting down");
        drop(socket);
        info!(addr = %local_addr, "Listener closed");

        Ok(UdpListener {
            state: phase::Closed { local_addr, reason },
        })
    }
}

impl UdpListener<phase::Closed> {
    pub fn reason(&self) -> ShutdownReason {
        self.state.reason
    }

    /// The address the listener was bound to before closing.
    pub fn local_addr(&self) -> SocketAddr {
        self.state.local_addr
    }

    pub fn phase(&self) -> ListenerPhase {
        ListenerPhase::Closed
    }
}

impl Parts {
    fn apply(&self, command: &Command, origin: &'static str) -> Resolution {
        let resolution = resolve(command, &self.catalog);
        match resolution {
            Resolution::Change(state) => {
                self.store.set(state);
                debug!(origin, %state, "Icon state changed");
            }
            Resolution::NoChange => {
                debug!(origin, ?command, "Command does not change the icon");
            }
            Resolution::Quit => {
                info!(origin, "Quit requested");
            }
        }
        resolution
    }
}

/// Resolves to `true` on a shutdown signal, `false` if the channel closed.
/// Never resolves when there is no channel.
async fn next_shutdown(rx: &mut Option<broadcast::Receiver<ShutdownSignal>>) -> bool {
    match rx {
        Some(rx) => match rx.recv().await {
            Ok(ShutdownSignal) | Err(broadcast::error::RecvError::Lagged(_)) => true,
            Err(broadcast::error::RecvError::Closed) => false,
        },
        None => std::future::pending().await,
    }
}

/// Never resolves when there is no channel.
async fn next_command(rx: &mut Option<mpsc::Receiver<Command>>) -> Option<Command> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

fn is_transient(e: &io::Error) -> bool {
    // Windows reports an ICMP port-unreachable from an earlier send as a
    // reset, and an oversized datagram as WSAEMSGSIZE.
    if cfg!(windows) && e.raw_os_error() == Some(10040) {
        return true;
    }
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
    )
}
