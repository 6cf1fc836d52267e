use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::chat::Message;
use crate::shared::AppError;

/// Commands a client may send
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CommandType {
    Create,
    Join,
    Leave,
    Send,
    Fetch,
    GetRooms,
}

impl CommandType {
    /// Wire name, echoed back in success acks
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandType::Create => "create",
            CommandType::Join => "join",
            CommandType::Leave => "leave",
            CommandType::Send => "send",
            CommandType::Fetch => "fetch",
            CommandType::GetRooms => "getRooms",
        }
    }
}

/// Client -> Server envelope
///
/// Only `type` is required; the rest default to empty strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientCommand {
    #[serde(rename = "type")]
    pub command_type: CommandType,
    #[serde(default)]
    pub room: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub timestamp: String,
}

impl ClientCommand {
    pub fn new(command_type: CommandType, room: impl Into<String>) -> Self {
        Self {
            command_type,
            room: room.into(),
            username: String::new(),
            value: String::new(),
            timestamp: String::new(),
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    /// Decodes a text frame. Unknown types and wrong field casing are rejected.
    pub fn parse(frame: &str) -> Result<Self, AppError> {
        serde_json::from_str(frame).map_err(|e| AppError::MalformedInput(e.to_string()))
    }

    /// The message this command carries when it is a `send`
    pub fn to_message(&self) -> Message {
        Message::new(
            self.username.clone(),
            self.room.clone(),
            self.value.clone(),
            self.timestamp.clone(),
        )
    }
}

/// Kinds of server responses
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    Success,
    Error,
    Info,
}

/// Server -> Client envelope
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerMessage {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub message: Value,
}

impl ServerMessage {
    pub fn new(response_type: ResponseType, message: Value) -> Self {
        Self {
            response_type,
            message,
        }
    }

    /// Ack carrying the name of the command that succeeded
    pub fn success(command: CommandType) -> Self {
        Self::new(ResponseType::Success, Value::from(command.as_str()))
    }

    pub fn error(error: &AppError) -> Self {
        Self::new(ResponseType::Error, Value::from(error.to_string()))
    }

    /// A room's message log
    pub fn messages(messages: &[Message]) -> Self {
        let payload = serde_json::to_value(messages).unwrap_or_else(|_| Value::Array(vec![]));
        Self::new(ResponseType::Info, payload)
    }

    /// The list of room names
    pub fn rooms(rooms: Vec<String>) -> Self {
        Self::new(ResponseType::Info, Value::from(rooms))
    }

    pub fn to_json(&self) -> Result<String, AppError> {
        serde_json::to_string(self).map_err(|_| AppError::Internal)
    }
}
