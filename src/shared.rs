use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::chat::store::ChatStore;
use crate::websockets::{BroadcastDispatcher, ConnectionRegistry};

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub chat_store: Arc<dyn ChatStore>,
    pub connection_registry: Arc<dyn ConnectionRegistry>,
    pub dispatcher: Arc<BroadcastDispatcher>,
    /// Capacity of each connection's outbound queue
    pub outbound_queue_capacity: usize,
}

impl AppState {
    pub fn new(
        chat_store: Arc<dyn ChatStore>,
        connection_registry: Arc<dyn ConnectionRegistry>,
        outbound_queue_capacity: usize,
    ) -> Self {
        let dispatcher = Arc::new(BroadcastDispatcher::new(
            chat_store.clone(),
            connection_registry.clone(),
        ));

        Self {
            chat_store,
            connection_registry,
            dispatcher,
            outbound_queue_capacity,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("chat room {0} does not exist")]
    RoomNotFound(String),

    #[error("chat room {0} already exists")]
    AlreadyExists(String),

    #[error("user already in the chat")]
    AlreadyJoined(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Connection closed")]
    TransportClosed,

    #[error("Failed to write snapshot: {0}")]
    PersistenceWriteFailed(String),

    #[error("Failed to read snapshot: {0}")]
    PersistenceReadFailed(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::RoomNotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyExists(_) | AppError::AlreadyJoined(_) => StatusCode::CONFLICT,
            AppError::MalformedInput(_) => StatusCode::BAD_REQUEST,
            AppError::TransportClosed
            | AppError::PersistenceWriteFailed(_)
            | AppError::PersistenceReadFailed(_)
            | AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}
