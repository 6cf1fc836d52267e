use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::chat::{store::ChatStore, Message};
use crate::shared::AppError;

use super::connection::ConnectionHandle;
use super::messages::{ClientCommand, CommandType, ServerMessage};
use super::registry::ConnectionRegistry;
use super::socket::MessageHandler;

/// Routes decoded client commands to the chat store and connection registry
/// and delivers the results.
///
/// Errors only ever go back to the connection that issued the command.
/// Successful `send` and `join` are broadcast to the room's membership as
/// it stands when delivery starts.
pub struct BroadcastDispatcher {
    chat_store: Arc<dyn ChatStore>,
    connection_registry: Arc<dyn ConnectionRegistry>,
    /// Serialises append, log read and fan-out per room so members see logs
    /// in append order
    room_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl BroadcastDispatcher {
    pub fn new(
        chat_store: Arc<dyn ChatStore>,
        connection_registry: Arc<dyn ConnectionRegistry>,
    ) -> Self {
        Self {
            chat_store,
            connection_registry,
            room_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Executes one command on behalf of `origin`
    #[instrument(skip(self, origin, command), fields(
        connection_id = %origin.id(),
        command = command.command_type.as_str(),
        room = %command.room,
    ))]
    pub async fn dispatch(&self, origin: &ConnectionHandle, command: ClientCommand) {
        let command_type = command.command_type;

        let result = match command_type {
            CommandType::Create => self.chat_store.create_room(&command.room).await,
            CommandType::Join => self.join(origin, &command).await,
            CommandType::Leave => {
                self.connection_registry.leave(&command.room, origin).await;
                Ok(())
            }
            CommandType::Send => self.send(&command).await,
            CommandType::Fetch => self.fetch(origin, &command.room).await,
            CommandType::GetRooms => {
                let rooms = self.chat_store.list_rooms().await;
                self.deliver(origin, &ServerMessage::rooms(rooms)).await;
                Ok(())
            }
        };

        match result {
            Ok(()) => {
                self.deliver(origin, &ServerMessage::success(command_type)).await;
            }
            Err(e) => {
                warn!(error = %e, "Command failed");
                self.deliver(origin, &ServerMessage::error(&e)).await;
            }
        }
    }

    async fn join(
        &self,
        origin: &ConnectionHandle,
        command: &ClientCommand,
    ) -> Result<(), AppError> {
        self.connection_registry.join(&command.room, origin).await?;

        let notice = Message::joined_notice(&command.room, &command.username);
        if let Err(e) = self.append_and_broadcast(&command.room, notice).await {
            // Membership stands even when the room has no log to announce in
            warn!(room = %command.room, error = %e, "Failed to announce join");
        }
        Ok(())
    }

    async fn send(&self, command: &ClientCommand) -> Result<(), AppError> {
        self.append_and_broadcast(&command.room, command.to_message()).await
    }

    async fn fetch(&self, origin: &ConnectionHandle, room: &str) -> Result<(), AppError> {
        let messages = self.chat_store.messages(room).await?;
        self.deliver(origin, &ServerMessage::messages(&messages)).await;
        Ok(())
    }

    async fn append_and_broadcast(&self, room: &str, message: Message) -> Result<(), AppError> {
        let room_lock = self.room_lock(room).await;

        let result = async {
            let _guard = room_lock.lock().await;
            self.chat_store.append(room, message).await?;

            let messages = self.chat_store.messages(room).await?;
            self.broadcast(room, &ServerMessage::messages(&messages)).await;
            Ok::<(), AppError>(())
        }
        .await;

        if let Err(AppError::RoomNotFound(_)) = result {
            self.release_room_lock(room, room_lock).await;
        }
        result
    }

    async fn room_lock(&self, room: &str) -> Arc<Mutex<()>> {
        let mut locks = self.room_locks.lock().await;
        locks.entry(room.to_string()).or_default().clone()
    }

    /// Drops the lock entry for a room that turned out not to exist, unless
    /// another task is still using it
    async fn release_room_lock(&self, room: &str, room_lock: Arc<Mutex<()>>) {
        let mut locks = self.room_locks.lock().await;
        if Arc::strong_count(&room_lock) == 2 {
            locks.remove(room);
        }
    }

    /// Fans a message out to every current member of `room`
    pub async fn broadcast(&self, room: &str, message: &ServerMessage) {
        let members = self.connection_registry.members_of(room).await;
        if members.is_empty() {
            debug!(room = %room, "No members to broadcast to");
            return;
        }

        let payload = match message.to_json() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(room = %room, error = %e, "Failed to serialize broadcast");
                return;
            }
        };

        // Writes to different connections proceed concurrently; the lock on
        // the membership map was released by members_of above
        join_all(
            members
                .iter()
                .map(|member| self.deliver_raw(member, payload.clone())),
        )
        .await;

        debug!(room = %room, recipients = members.len(), "Broadcast delivered");
    }

    async fn deliver(&self, target: &ConnectionHandle, message: &ServerMessage) {
        match message.to_json() {
            Ok(payload) => self.deliver_raw(target, payload).await,
            Err(e) => warn!(error = %e, "Failed to serialize response"),
        }
    }

    async fn deliver_raw(&self, target: &ConnectionHandle, payload: String) {
        let result = if target.is_closed() {
            Err(AppError::TransportClosed)
        } else {
            target.send(payload).await
        };

        if let Err(e) = result {
            debug!(connection_id = %target.id(), error = %e, "Dropping closed connection");
            self.connection_registry.forget(target).await;
        }
    }
}

#[async_trait]
impl MessageHandler for BroadcastDispatcher {
    async fn handle_message(&self, connection: &ConnectionHandle, message: String) {
        match ClientCommand::parse(&message) {
            Ok(command) => {
                info!(
                    connection_id = %connection.id(),
                    command = command.command_type.as_str(),
                    room = %command.room,
                    "Received command"
                );
                self.dispatch(connection, command).await;
            }
            Err(e) => {
                warn!(
                    connection_id = %connection.id(),
                    error = %e,
                    "Failed to parse client command"
                );
            }
        }
    }
}
