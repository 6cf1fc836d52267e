use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::shared::AppState;

use super::connection::{ChannelConnection, ConnectionHandle};
use super::socket::Connection;

/// WebSocket endpoint for chat clients
/// GET /ws
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
) -> Response {
    info!("WebSocket connection requested");
    ws.on_upgrade(move |socket| handle_websocket_connection(socket, app_state))
}

/// Handle the upgraded WebSocket connection
async fn handle_websocket_connection(socket: axum::extract::ws::WebSocket, app_state: AppState) {
    // Create the bounded outbound queue (app -> client)
    let (channel, outbound_receiver) = ChannelConnection::new(app_state.outbound_queue_capacity);
    let handle = ConnectionHandle::new(Arc::new(channel));
    let connection_id = handle.id();

    info!(connection_id = %connection_id, "WebSocket connection established");

    let connection = Connection::new(
        handle.clone(),
        Box::new(socket),
        outbound_receiver,
        app_state.dispatcher.clone(),
    );

    // Run the connection until disconnect
    match connection.run().await {
        Ok(()) => {
            info!(connection_id = %connection_id, "WebSocket connection closed cleanly");
        }
        Err(e) => {
            warn!(
                connection_id = %connection_id,
                error = ?e,
                "WebSocket connection error"
            );
        }
    }

    // Cleanup: stale membership must not outlive the socket
    let rooms = app_state.connection_registry.forget(&handle).await;
    info!(
        connection_id = %connection_id,
        rooms_left = rooms.len(),
        "Connection removed from registry"
    );
}
