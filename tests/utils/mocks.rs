use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use chat_relay::{AppError, ClientConnection};

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// Transport double that records every frame it is asked to send
#[derive(Clone)]
pub struct MockConnection {
    sent_messages: Arc<Mutex<VecDeque<String>>>,
    closed: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl MockConnection {
    pub fn new() -> Self {
        Self {
            sent_messages: Arc::new(Mutex::new(VecDeque::new())),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Simulate the client going away
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub async fn get_messages(&self) -> Vec<String> {
        self.sent_messages.lock().await.iter().cloned().collect()
    }

    /// Pop the oldest recorded frame
    pub async fn consume_message(&self) -> Option<String> {
        self.sent_messages.lock().await.pop_front()
    }

    pub async fn clear_messages(&self) {
        self.sent_messages.lock().await.clear();
    }
}

#[async_trait]
impl ClientConnection for MockConnection {
    async fn send(&self, message: String) -> Result<(), AppError> {
        if self.is_closed() {
            return Err(AppError::TransportClosed);
        }
        self.sent_messages.lock().await.push_back(message);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
