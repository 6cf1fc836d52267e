use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::chat::{list_rooms, room_messages};
use crate::config::ConfigError;
use crate::shared::AppState;
use crate::websockets::websocket_handler;

/// Builds the HTTP router: the WebSocket endpoint plus read-only room views
pub fn build_router(app_state: AppState, allowed_origin: &str) -> Result<Router, ConfigError> {
    let origin =
        HeaderValue::from_str(allowed_origin).map_err(|_| ConfigError::InvalidValue {
            key: "CHAT_ALLOWED_ORIGIN",
            value: allowed_origin.to_string(),
        })?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_headers([header::CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS]);

    Ok(Router::new()
        .route("/", get(|| async { "Chat relay is running" }))
        .route("/ws", get(websocket_handler))
        .route("/rooms", get(list_rooms))
        .route("/rooms/:room/messages", get(room_messages))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state))
}
