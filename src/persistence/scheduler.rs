use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

use super::storage::SnapshotStorage;
use crate::chat::store::ChatStore;

/// Configuration for the periodic snapshot task
#[derive(Debug, Clone)]
pub struct PersistenceConfig {
    /// Wait between successful snapshots
    pub interval: Duration,
    /// Wait before retrying after a failed write
    pub retry_delay: Duration,
    /// Consecutive failures after which the task backs off for a full interval
    pub max_consecutive_failures: u32,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            retry_delay: Duration::from_secs(1),
            max_consecutive_failures: 10,
        }
    }
}

/// Periodically copies the chat store into durable storage
///
/// Failures are retried after a short delay; once too many happen in a row
/// the scheduler gives up until the next regular interval. It never stops.
pub struct PersistenceScheduler {
    chat_store: Arc<dyn ChatStore>,
    storage: Arc<dyn SnapshotStorage>,
    config: PersistenceConfig,
    consecutive_failures: u32,
}

impl PersistenceScheduler {
    pub fn new(
        chat_store: Arc<dyn ChatStore>,
        storage: Arc<dyn SnapshotStorage>,
        config: PersistenceConfig,
    ) -> Self {
        Self {
            chat_store,
            storage,
            config,
            consecutive_failures: 0,
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Takes and writes one snapshot, returning how long to wait before the next cycle
    #[instrument(skip(self), fields(failures = self.consecutive_failures))]
    pub async fn run_cycle(&mut self) -> Duration {
        info!("Backing up chat rooms");

        // The store copies under its read lock and releases it before we do any I/O
        let snapshot = self.chat_store.snapshot().await;

        match self.storage.write(&snapshot).await {
            Ok(()) => {
                self.consecutive_failures = 0;
                info!(room_count = snapshot.rooms.len(), "Backup complete");
                self.config.interval
            }
            Err(e) => {
                self.consecutive_failures += 1;

                if self.consecutive_failures >= self.config.max_consecutive_failures {
                    error!(
                        error = %e,
                        failures = self.consecutive_failures,
                        "Backup failed repeatedly, waiting for next interval"
                    );
                    self.consecutive_failures = 0;
                    self.config.interval
                } else {
                    warn!(
                        error = %e,
                        failures = self.consecutive_failures,
                        "Backup failed, retrying"
                    );
                    self.config.retry_delay
                }
            }
        }
    }

    /// Runs snapshot cycles forever, starting immediately
    pub async fn run(mut self) {
        info!(
            interval_secs = self.config.interval.as_secs(),
            retry_delay_ms = self.config.retry_delay.as_millis() as u64,
            max_consecutive_failures = self.config.max_consecutive_failures,
            "Starting persistence background task"
        );

        loop {
            let delay = self.run_cycle().await;
            sleep(delay).await;
        }
    }
}

/// Spawns the persistence scheduler on the runtime
pub fn start_persistence_task(
    chat_store: Arc<dyn ChatStore>,
    storage: Arc<dyn SnapshotStorage>,
    config: PersistenceConfig,
) -> JoinHandle<()> {
    tokio::spawn(PersistenceScheduler::new(chat_store, storage, config).run())
}
