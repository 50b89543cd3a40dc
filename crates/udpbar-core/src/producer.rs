//! Command producers — the typed `submit(Command)` interface.
//!
//! In-process sources (an automation bridge, a test, the UI thread) use a
//! [`CommandSender`], which feeds the listener's own loop so the listener stays
//! the only writer to the store. Out-of-process callers use a
//! [`UdpCommandClient`], which speaks the datagram protocol.

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};

use tokio::sync::mpsc;
use tracing::debug;

use crate::command::{Command, DEFAULT_QUIT_TOKEN};

/// Capacity of the in-process command queue.
pub const COMMAND_QUEUE_CAPACITY: usize = 64;

/// Anything that accepts commands for the indicator.
pub trait CommandSink {
    /// Queue `command` for processing. Never blocks.
    fn submit(&self, command: Command) -> Result<(), SubmitError>;
}

/// Errors from submitting a command.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("listener is no longer accepting commands")]
    Closed,

    #[error("command queue is full, command dropped")]
    Full,

    #[error("command {0:?} has no wire form")]
    Unencodable(Command),

    #[error("failed to send datagram: {0}")]
    Io(#[from] io::Error),
}

/// Create a connected sender/receiver pair for in-process commands.
///
/// The receiver is handed to the listener.
pub fn command_channel() -> (CommandSender, mpsc::Receiver<Command>) {
    let (tx, rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
    (CommandSender { tx }, rx)
}

/// Cloneable in-process producer feeding the listener loop.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: mpsc::Sender<Command>,
}

impl CommandSink for CommandSender {
    fn submit(&self, command: Command) -> Result<(), SubmitError> {
        self.tx.try_send(command).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SubmitError::Full,
            mpsc::error::TrySendError::Closed(_) => SubmitError::Closed,
        })
    }
}

/// Sends commands to a listener as UDP datagrams.
#[derive(Debug)]
pub struct UdpCommandClient {
    socket: UdpSocket,
    target: SocketAddr,
    quit_token: String,
}

impl UdpCommandClient {
    /// Create a client aimed at `target`, bound to an ephemeral local port of
    /// the same address family.
    pub fn connect(target: impl ToSocketAddrs) -> io::Result<Self> {
        let target = target.to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "no address to send to")
        })?;
        let local: SocketAddr = match target {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(local)?;
        socket.connect(target)?;
        Ok(Self {
            socket,
            target,
            quit_token: DEFAULT_QUIT_TOKEN.to_string(),
        })
    }

    /// Use a non-default quit token when encoding [`Command::QuitRequest`].
    pub fn with_quit_token(mut self, quit_token: impl Into<String>) -> Self {
        self.quit_token = quit_token.into();
        self
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

impl CommandSink for UdpCommandClient {
    fn submit(&self, command: Command) -> Result<(), SubmitError> {
        let wire = command
            .to_wire(&self.quit_token)
            .ok_or(SubmitError::Unencodable(command))?;
        self.socket.send(wire.as_bytes())?;
        debug!(addr = %self.target, payload = %wire, "Command sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::IconColor;
    use crate::command::decode;
    use std::time::Duration;

    #[tokio::test]
    async fn test_sender_delivers_in_order() {
        let (sender, mut rx) = command_channel();
        sender.submit(Command::color(IconColor::Red)).unwrap();
        sender.submit(Command::IndexedImage(3)).unwrap();

        assert_eq!(rx.recv().await, Some(Command::color(IconColor::Red)));
        assert_eq!(rx.recv().await, Some(Command::IndexedImage(3)));
    }

    #[test]
    fn test_sender_reports_closed_listener() {
        let (sender, rx) = command_channel();
        drop(rx);
        assert!(matches!(
            sender.submit(Command::QuitRequest),
            Err(SubmitError::Closed)
        ));
    }

    #[test]
    fn test_sender_reports_full_queue() {
        let (sender, _rx) = command_channel();
        for _ in 0..COMMAND_QUEUE_CAPACITY {
            sender.submit(Command::IndexedImage(0)).unwrap();
        }
        assert!(matches!(
            sender.submit(Command::IndexedImage(0)),
            Err(SubmitError::Full)
        ));
    }

    #[test]
    fn test_udp_client_sends_wire_text() {
        let server = UdpSocket::bind("127.0.0.1:0").unwrap();
        server
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let client = UdpCommandClient::connect(server.local_addr().unwrap())
            .unwrap()
            .with_quit_token("bye");

        let mut buf = [0u8; 64];
        for (command, expected) in [
            (Command::color(IconColor::Cyan), "cyan"),
            (Command::IndexedImage(4), "4"),
            (Command::QuitRequest, "bye"),
        ] {
            client.submit(command.clone()).unwrap();
            let (len, _) = server.recv_from(&mut buf).unwrap();
            assert_eq!(&buf[..len], expected.as_bytes());
            if command != Command::QuitRequest {
                assert_eq!(decode(&buf[..len]), command);
            }
        }
    }

    #[test]
    fn test_udp_client_rejects_unknown() {
        let server = UdpSocket::bind("127.0.0.1:0").unwrap();
        let client = UdpCommandClient::connect(server.local_addr().unwrap()).unwrap();
        assert!(matches!(
            client.submit(Command::Unknown),
            Err(SubmitError::Unencodable(Command::Unknown))
        ));
    }
}
