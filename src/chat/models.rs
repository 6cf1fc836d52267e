use serde::{Deserialize, Serialize};

/// Username used for messages generated by the server itself
pub const SYSTEM_USERNAME: &str = "system";

/// A single chat message. Immutable once appended to a room's log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub username: String,
    pub room: String,
    pub value: String,
    /// Caller-supplied, stored as-is
    pub timestamp: String,
}

impl Message {
    pub fn new(
        username: impl Into<String>,
        room: impl Into<String>,
        value: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            room: room.into(),
            value: value.into(),
            timestamp: timestamp.into(),
        }
    }

    /// Builds the notice broadcast when a user joins a room
    pub fn joined_notice(room: &str, username: &str) -> Self {
        Self::new(
            SYSTEM_USERNAME,
            room,
            format!("{} has joined the chat", username),
            chrono::Utc::now().to_rfc3339(),
        )
    }
}

/// Persisted form of one room: its name and full ordered log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRecord {
    pub name: String,
    pub messages: Vec<Message>,
}

/// Full copy of every room and its log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub rooms: Vec<RoomRecord>,
}

impl Snapshot {
    pub fn room(&self, name: &str) -> Option<&RoomRecord> {
        self.rooms.iter().find(|r| r.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
