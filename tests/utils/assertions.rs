//! Test assertion helpers - fluent API for verifying test expectations
#![allow(dead_code)] // Test utilities may not all be used in every test

use chat_relay::{Message, ResponseType, ServerMessage};

use super::setup::TestSetup;

// ============================================================================
// Assertion Helpers
// ============================================================================

pub struct MessageAssertion<'a> {
    setup: &'a TestSetup,
    clients: Vec<&'a str>,
}

impl<'a> MessageAssertion<'a> {
    /// Create an assertion for every client in the setup
    pub fn for_all_clients(setup: &'a TestSetup) -> Self {
        let clients = setup.client_names();
        Self { setup, clients }
    }

    /// Create an assertion for specific clients
    pub fn for_clients(setup: &'a TestSetup, clients: Vec<&'a str>) -> Self {
        Self { setup, clients }
    }

    /// Consume the next frame for each client and check its response type
    async fn next_of_type(&self, expected_type: ResponseType) -> Vec<ServerMessage> {
        let mut responses = vec![];

        for client in &self.clients {
            let frame = self.setup.client(client).connection.consume_message().await;
            assert!(frame.is_some(), "{} should have received a message", client);

            let response: ServerMessage = serde_json::from_str(&frame.unwrap()).unwrap();
            assert_eq!(
                response.response_type, expected_type,
                "{} received wrong response type: {:?}",
                client, response
            );
            responses.push(response);
        }

        responses
    }

    /// Assert that clients received a success ack for `command`
    pub async fn received_success(self, command: &str) {
        for response in self.next_of_type(ResponseType::Success).await {
            assert_eq!(response.message, command);
        }
    }

    /// Assert that clients received an error with the given text
    pub async fn received_error(self, expected: &str) {
        for response in self.next_of_type(ResponseType::Error).await {
            assert_eq!(response.message, expected);
        }
    }

    /// Assert that clients received the same message log, and return it
    pub async fn received_log(self) -> Vec<Message> {
        let responses = self.next_of_type(ResponseType::Info).await;
        let first = &responses[0].message;
        for (i, response) in responses.iter().enumerate().skip(1) {
            assert_eq!(
                &response.message, first,
                "Client {} log differs from client {}",
                self.clients[i], self.clients[0]
            );
        }

        serde_json::from_value(first.clone()).expect("info payload should be a message log")
    }

    /// Assert that clients received a room list, and return the first one sorted
    pub async fn received_rooms(self) -> Vec<String> {
        let responses = self.next_of_type(ResponseType::Info).await;
        let mut rooms: Vec<String> = serde_json::from_value(responses[0].message.clone())
            .expect("info payload should be a room list");
        rooms.sort();
        rooms
    }

    /// Assert that clients have no pending messages
    pub async fn received_no_messages(self) {
        for client in &self.clients {
            let messages = self.setup.client(client).connection.get_messages().await;
            assert!(
                messages.is_empty(),
                "{} should not have received any messages, got {:?}",
                client,
                messages
            );
        }
    }
}
