use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use super::models::{Message, RoomRecord, Snapshot};
use crate::shared::AppError;

/// Trait for chat room storage operations
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Creates an empty room. Fails with `AlreadyExists` if the name is taken;
    /// the existing log is never replaced.
    async fn create_room(&self, name: &str) -> Result<(), AppError>;

    /// Appends a message to the end of a room's log
    async fn append(&self, room: &str, message: Message) -> Result<(), AppError>;

    /// Names of all known rooms, in no particular order
    async fn list_rooms(&self) -> Vec<String>;

    /// Copy of a room's full ordered log
    async fn messages(&self, room: &str) -> Result<Vec<Message>, AppError>;

    /// Copies every room and its log
    async fn snapshot(&self) -> Snapshot;

    /// Seeds the store from a snapshot, returning how many rooms were added.
    /// Rooms that already exist keep their current log.
    async fn restore(&self, snapshot: Snapshot) -> usize;
}

type RoomLog = Arc<Mutex<Vec<Message>>>;

/// In-memory implementation of ChatStore
///
/// The room map sits behind a RwLock and each room's log behind its own Mutex,
/// so appends to different rooms only contend on the shared read lock.
pub struct InMemoryChatStore {
    rooms: RwLock<HashMap<String, RoomLog>>,
}

impl Default for InMemoryChatStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryChatStore {
    /// Creates a new empty store
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
        }
    }

    async fn room_log(&self, room: &str) -> Result<RoomLog, AppError> {
        let rooms = self.rooms.read().await;
        rooms
            .get(room)
            .cloned()
            .ok_or_else(|| AppError::RoomNotFound(room.to_string()))
    }
}

#[async_trait]
impl ChatStore for InMemoryChatStore {
    #[instrument(skip(self))]
    async fn create_room(&self, name: &str) -> Result<(), AppError> {
        let mut rooms = self.rooms.write().await;
        if rooms.contains_key(name) {
            warn!(room = %name, "Chat room already exists");
            return Err(AppError::AlreadyExists(name.to_string()));
        }
        rooms.insert(name.to_string(), Arc::new(Mutex::new(Vec::new())));

        info!(room = %name, "Chat room created");
        Ok(())
    }

    #[instrument(skip(self, message))]
    async fn append(&self, room: &str, message: Message) -> Result<(), AppError> {
        let log = self.room_log(room).await?;

        let mut messages = log.lock().await;
        messages.push(message);

        debug!(room = %room, log_len = messages.len(), "Message appended");
        Ok(())
    }

    async fn list_rooms(&self) -> Vec<String> {
        let rooms = self.rooms.read().await;
        rooms.keys().cloned().collect()
    }

    #[instrument(skip(self))]
    async fn messages(&self, room: &str) -> Result<Vec<Message>, AppError> {
        let log = self.room_log(room).await?;
        let messages = log.lock().await;
        Ok(messages.clone())
    }

    async fn snapshot(&self) -> Snapshot {
        // Collect handles under the read lock, copy each log after releasing it
        let logs: Vec<(String, RoomLog)> = {
            let rooms = self.rooms.read().await;
            rooms
                .iter()
                .map(|(name, log)| (name.clone(), log.clone()))
                .collect()
        };

        let mut records = Vec::with_capacity(logs.len());
        for (name, log) in logs {
            let messages = log.lock().await.clone();
            records.push(RoomRecord { name, messages });
        }

        debug!(room_count = records.len(), "Snapshot taken");
        Snapshot { rooms: records }
    }

    #[instrument(skip(self, snapshot), fields(room_count = snapshot.rooms.len()))]
    async fn restore(&self, snapshot: Snapshot) -> usize {
        let mut rooms = self.rooms.write().await;
        let mut restored = 0;

        for record in snapshot.rooms {
            if rooms.contains_key(&record.name) {
                warn!(room = %record.name, "Room already present, keeping in-memory log");
                continue;
            }
            rooms.insert(record.name, Arc::new(Mutex::new(record.messages)));
            restored += 1;
        }

        info!(restored = restored, "Chat rooms restored");
        restored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(username: &str, room: &str, value: &str) -> Message {
        Message::new(username, room, value, "2024-01-01T00:00:00Z")
    }

    #[tokio::test]
    async fn test_append_to_missing_room_fails() {
        let store = InMemoryChatStore::new();

        let result = store.append("general", message("alice", "general", "hi")).await;
        assert_eq!(result, Err(AppError::RoomNotFound("general".to_string())));

        let result = store.messages("general").await;
        assert_eq!(result, Err(AppError::RoomNotFound("general".to_string())));
    }

    #[tokio::test]
    async fn test_create_room_starts_empty() {
        let store = InMemoryChatStore::new();
        store.create_room("general").await.unwrap();

        assert!(store.messages("general").await.unwrap().is_empty());
        assert_eq!(store.list_rooms().await, vec!["general".to_string()]);
    }

    #[tokio::test]
    async fn test_create_duplicate_room_keeps_log() {
        let store = InMemoryChatStore::new();
        store.create_room("general").await.unwrap();
        store
            .append("general", message("alice", "general", "hi"))
            .await
            .unwrap();

        let result = store.create_room("general").await;
        assert_eq!(result, Err(AppError::AlreadyExists("general".to_string())));
        assert_eq!(store.messages("general").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_append_preserves_order() {
        let store = InMemoryChatStore::new();
        store.create_room("general").await.unwrap();

        let m1 = message("alice", "general", "first");
        let m2 = message("bob", "general", "second");
        store.append("general", m1.clone()).await.unwrap();
        store.append("general", m2.clone()).await.unwrap();

        assert_eq!(store.messages("general").await.unwrap(), vec![m1, m2]);
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_not_lost() {
        let store = Arc::new(InMemoryChatStore::new());
        store.create_room("general").await.unwrap();

        let mut handles = Vec::new();
        for i in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .append("general", message("alice", "general", &i.to_string()))
                    .await
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 50);
        assert_eq!(store.messages("general").await.unwrap().len(), succeeded);
    }

    #[tokio::test]
    async fn test_list_rooms_multiple() {
        let store = InMemoryChatStore::new();
        store.create_room("room-1").await.unwrap();
        store.create_room("room-2").await.unwrap();
        store.create_room("room-3").await.unwrap();

        let rooms: std::collections::HashSet<String> =
            store.list_rooms().await.into_iter().collect();
        assert_eq!(rooms.len(), 3);
        assert!(rooms.contains("room-1"));
        assert!(rooms.contains("room-2"));
        assert!(rooms.contains("room-3"));
    }

    #[tokio::test]
    async fn test_snapshot_restore_round_trip() {
        let store = InMemoryChatStore::new();
        let x = message("alice", "A", "x");
        let y = message("bob", "B", "y");
        let z = message("carol", "B", "z");

        store.create_room("A").await.unwrap();
        store.create_room("B").await.unwrap();
        store.append("A", x.clone()).await.unwrap();
        store.append("B", y.clone()).await.unwrap();
        store.append("B", z.clone()).await.unwrap();

        let snapshot = store.snapshot().await;
        drop(store);

        let restored = InMemoryChatStore::new();
        assert_eq!(restored.restore(snapshot).await, 2);

        assert_eq!(restored.messages("A").await.unwrap(), vec![x]);
        assert_eq!(restored.messages("B").await.unwrap(), vec![y, z]);
    }

    #[tokio::test]
    async fn test_restore_does_not_overwrite_existing_room() {
        let store = InMemoryChatStore::new();
        store.create_room("general").await.unwrap();
        let live = message("alice", "general", "live");
        store.append("general", live.clone()).await.unwrap();

        let snapshot = Snapshot {
            rooms: vec![
                RoomRecord {
                    name: "general".to_string(),
                    messages: vec![message("bob", "general", "stale")],
                },
                RoomRecord {
                    name: "random".to_string(),
                    messages: vec![],
                },
            ],
        };

        assert_eq!(store.restore(snapshot).await, 1);
        assert_eq!(store.messages("general").await.unwrap(), vec![live]);
        assert!(store.messages("random").await.unwrap().is_empty());
    }
}
