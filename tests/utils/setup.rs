use std::collections::HashMap;
use std::sync::Arc;

use chat_relay::{
    BroadcastDispatcher, ChatStore, ConnectionHandle, InMemoryChatStore,
    InMemoryConnectionRegistry,
};

use super::mocks::MockConnection;

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

/// A connected client: its registry handle plus the mock transport behind it
pub struct TestClient {
    pub handle: ConnectionHandle,
    pub connection: MockConnection,
}

pub struct TestSetup {
    pub chat_store: Arc<InMemoryChatStore>,
    pub registry: Arc<InMemoryConnectionRegistry>,
    pub dispatcher: BroadcastDispatcher,
    pub clients: HashMap<String, TestClient>,
}

pub struct TestSetupBuilder {
    clients: Vec<String>,
    rooms: Vec<String>,
}

#[allow(dead_code)]
impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            clients: vec![],
            rooms: vec![],
        }
    }

    pub fn with_clients(mut self, clients: Vec<&str>) -> Self {
        self.clients = clients.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_two_clients(self) -> Self {
        self.with_clients(vec!["alice", "bob"])
    }

    pub fn with_three_clients(self) -> Self {
        self.with_clients(vec!["alice", "bob", "charlie"])
    }

    /// Rooms created in the store before the test starts
    pub fn with_rooms(mut self, rooms: Vec<&str>) -> Self {
        self.rooms = rooms.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub async fn build(self) -> TestSetup {
        let chat_store = Arc::new(InMemoryChatStore::new());
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let dispatcher = BroadcastDispatcher::new(chat_store.clone(), registry.clone());

        for room in &self.rooms {
            chat_store.create_room(room).await.unwrap();
        }

        let clients = self
            .clients
            .into_iter()
            .map(|name| {
                let connection = MockConnection::new();
                let handle = ConnectionHandle::new(Arc::new(connection.clone()));
                (name, TestClient { handle, connection })
            })
            .collect();

        TestSetup {
            chat_store,
            registry,
            dispatcher,
            clients,
        }
    }
}

#[allow(dead_code)]
impl TestSetup {
    pub fn client(&self, name: &str) -> &TestClient {
        self.clients
            .get(name)
            .unwrap_or_else(|| panic!("unknown test client {}", name))
    }

    pub fn client_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.clients.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }
}
