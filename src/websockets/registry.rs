use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use super::connection::ConnectionHandle;
use crate::shared::AppError;

/// Tracks which connections are subscribed to which room's broadcasts
///
/// Membership is independent of the chat store: a room can have members
/// without a message log and vice versa.
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// Adds `connection` to `room`. Fails with `AlreadyJoined` if it is already a member.
    async fn join(&self, room: &str, connection: &ConnectionHandle) -> Result<(), AppError>;

    /// Removes `connection` from `room` if present. Empty rooms are dropped.
    async fn leave(&self, room: &str, connection: &ConnectionHandle);

    /// Snapshot of the room's current members
    async fn members_of(&self, room: &str) -> Vec<ConnectionHandle>;

    /// Removes `connection` from every room, returning the rooms it was in
    async fn forget(&self, connection: &ConnectionHandle) -> Vec<String>;
}

pub struct InMemoryConnectionRegistry {
    // room name -> members in join order
    memberships: RwLock<HashMap<String, Vec<ConnectionHandle>>>,
}

impl Default for InMemoryConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryConnectionRegistry {
    pub fn new() -> Self {
        Self {
            memberships: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    #[instrument(skip(self, connection), fields(connection_id = %connection.id()))]
    async fn join(&self, room: &str, connection: &ConnectionHandle) -> Result<(), AppError> {
        let mut memberships = self.memberships.write().await;
        let members = memberships.entry(room.to_string()).or_default();

        if members.contains(connection) {
            debug!(room = %room, "Connection already in room");
            return Err(AppError::AlreadyJoined(room.to_string()));
        }
        members.push(connection.clone());

        info!(room = %room, member_count = members.len(), "Connection joined room");
        Ok(())
    }

    #[instrument(skip(self, connection), fields(connection_id = %connection.id()))]
    async fn leave(&self, room: &str, connection: &ConnectionHandle) {
        let mut memberships = self.memberships.write().await;

        let Some(members) = memberships.get_mut(room) else {
            debug!(room = %room, "Leave for room without members");
            return;
        };

        members.retain(|member| member != connection);
        if members.is_empty() {
            info!(room = %room, "Last member left, dropping membership entry");
            memberships.remove(room);
        }
    }

    async fn members_of(&self, room: &str) -> Vec<ConnectionHandle> {
        let memberships = self.memberships.read().await;
        memberships.get(room).cloned().unwrap_or_default()
    }

    #[instrument(skip(self, connection), fields(connection_id = %connection.id()))]
    async fn forget(&self, connection: &ConnectionHandle) -> Vec<String> {
        let mut memberships = self.memberships.write().await;
        let mut left = Vec::new();

        memberships.retain(|room, members| {
            let before = members.len();
            members.retain(|member| member != connection);
            if members.len() != before {
                left.push(room.clone());
            }
            !members.is_empty()
        });

        if !left.is_empty() {
            info!(rooms = ?left, "Connection forgotten");
        }
        left
    }
}
