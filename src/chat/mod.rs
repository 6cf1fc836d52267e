// Public API - what other modules can use
pub use handlers::{list_rooms, room_messages};
pub use models::{Message, RoomRecord, Snapshot, SYSTEM_USERNAME};
pub use store::{ChatStore, InMemoryChatStore};

// Internal modules
mod handlers;
pub mod models;
pub mod store;
