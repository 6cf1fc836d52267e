// Public API
pub use connection::{ChannelConnection, ClientConnection, ConnectionHandle, ConnectionId};
pub use dispatcher::BroadcastDispatcher;
pub use handler::websocket_handler;
pub use messages::{ClientCommand, CommandType, ResponseType, ServerMessage};
pub use registry::{ConnectionRegistry, InMemoryConnectionRegistry};
pub use socket::{Connection, MessageHandler, SocketError, SocketWrapper};

// Internal modules
mod connection;
mod dispatcher;
mod handler;
mod messages;
mod registry;
mod socket;
