use serde_json::json;

use chat_relay::{ClientCommand, CommandType, MessageHandler};

use super::setup::TestSetup;

// ============================================================================
// Action Helpers
// ============================================================================

#[allow(dead_code)]
impl TestSetup {
    /// Feed a raw text frame from a client through the dispatcher
    pub async fn send_frame(&self, client: &str, frame: &str) {
        let handle = &self.client(client).handle;
        self.dispatcher
            .handle_message(handle, frame.to_string())
            .await;
    }

    /// Encode and send a command from a client
    pub async fn send_command(&self, client: &str, command: ClientCommand) {
        let frame = serde_json::to_string(&command).unwrap();
        self.send_frame(client, &frame).await;
    }

    /// Clear all recorded frames for every client
    pub async fn clear_messages(&self) {
        for client in self.clients.values() {
            client.connection.clear_messages().await;
        }
    }

    // ============================================================================
    // Convenience Action Methods
    // ============================================================================

    pub async fn create_room(&self, client: &str, room: &str) {
        self.send_command(client, ClientCommand::new(CommandType::Create, room))
            .await;
    }

    pub async fn join(&self, client: &str, room: &str) {
        self.send_command(
            client,
            ClientCommand::new(CommandType::Join, room).with_username(client),
        )
        .await;
    }

    pub async fn leave(&self, client: &str, room: &str) {
        self.send_command(client, ClientCommand::new(CommandType::Leave, room))
            .await;
    }

    pub async fn send_chat(&self, client: &str, room: &str, value: &str) {
        let frame = json!({
            "type": "send",
            "room": room,
            "username": client,
            "value": value,
            "timestamp": "2024-01-01T00:00:00Z",
        });
        self.send_frame(client, &frame.to_string()).await;
    }

    pub async fn fetch(&self, client: &str, room: &str) {
        self.send_command(client, ClientCommand::new(CommandType::Fetch, room))
            .await;
    }

    pub async fn get_rooms(&self, client: &str) {
        self.send_frame(client, r#"{"type":"getRooms"}"#).await;
    }
}
