use async_trait::async_trait;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::shared::AppError;

/// Outbound side of one client's transport
///
/// Implementations only need to accept text frames and report whether the
/// client is still reachable, so tests can stand in for real sockets.
#[async_trait]
pub trait ClientConnection: Send + Sync {
    /// Queue a text frame for the client. Fails with `TransportClosed` once the client is gone.
    async fn send(&self, message: String) -> Result<(), AppError>;

    /// Whether the transport has already gone away
    fn is_closed(&self) -> bool;
}

/// Identity of a connection, assigned when the socket is accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shared handle to a live connection. Compares by identity, never by contents.
#[derive(Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    connection: Arc<dyn ClientConnection>,
}

impl ConnectionHandle {
    pub fn new(connection: Arc<dyn ClientConnection>) -> Self {
        Self {
            id: ConnectionId::new(),
            connection,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub async fn send(&self, message: String) -> Result<(), AppError> {
        self.connection.send(message).await
    }

    pub fn is_closed(&self) -> bool {
        self.connection.is_closed()
    }
}

impl PartialEq for ConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ConnectionHandle {}

impl Hash for ConnectionHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// ClientConnection backed by a bounded queue drained by the socket task
///
/// A full queue makes `send` wait, which pushes back on the broadcaster
/// instead of buffering without limit.
pub struct ChannelConnection {
    sender: mpsc::Sender<String>,
}

impl ChannelConnection {
    /// Creates the connection together with the receiver the socket task should drain
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl ClientConnection for ChannelConnection {
    async fn send(&self, message: String) -> Result<(), AppError> {
        self.sender
            .send(message)
            .await
            .map_err(|_| AppError::TransportClosed)
    }

    fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
