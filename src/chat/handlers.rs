use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use super::models::Message;
use crate::shared::{AppError, AppState};

/// GET /rooms
pub async fn list_rooms(State(state): State<AppState>) -> Json<Vec<String>> {
    let mut rooms = state.chat_store.list_rooms().await;
    rooms.sort();

    info!(room_count = rooms.len(), "Rooms listed successfully");
    Json(rooms)
}

/// GET /rooms/:room/messages
pub async fn room_messages(
    Path(room): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Message>>, AppError> {
    let messages = state.chat_store.messages(&room).await?;

    info!(room = %room, message_count = messages.len(), "Room messages fetched");
    Ok(Json(messages))
}
