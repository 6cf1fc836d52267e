// Library crate for the chat relay server
// This file exposes the public API for integration tests

pub mod chat;
pub mod config;
pub mod logger;
pub mod persistence;
pub mod server;
pub mod shared;
pub mod websockets;

// Re-export commonly used types for easier access in tests
pub use chat::{ChatStore, InMemoryChatStore, Message, RoomRecord, Snapshot, SYSTEM_USERNAME};
pub use config::{AppConfig, ConfigError};
pub use persistence::{
    FileSnapshotStorage, InMemorySnapshotStorage, PersistenceConfig, PersistenceScheduler,
    SnapshotStorage,
};
pub use shared::{AppError, AppState};
pub use websockets::{
    BroadcastDispatcher, ClientCommand, ClientConnection, CommandType, ConnectionHandle,
    ConnectionRegistry, InMemoryConnectionRegistry, MessageHandler, ResponseType, ServerMessage,
};
