use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::chat::{RoomRecord, Snapshot};
use crate::shared::AppError;

/// Durable home for chat snapshots
#[async_trait]
pub trait SnapshotStorage: Send + Sync {
    /// Persist every room in the snapshot
    async fn write(&self, snapshot: &Snapshot) -> Result<(), AppError>;

    /// Load the most recently persisted snapshot
    async fn load(&self) -> Result<Snapshot, AppError>;
}

/// Stores one JSON file per room inside a directory
pub struct FileSnapshotStorage {
    dir: PathBuf,
}

impl FileSnapshotStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name for a room. Names that are not safe path components are hex-encoded;
    /// the `x.` prefix cannot clash with a plain name since plain names never contain dots.
    /// Uppercase names are encoded too so `General` and `general` stay distinct on
    /// case-insensitive filesystems.
    fn file_name(room: &str) -> String {
        let is_plain = !room.is_empty()
            && room
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');

        if is_plain {
            format!("{}.json", room)
        } else {
            let hex: String = room.bytes().map(|b| format!("{:02x}", b)).collect();
            format!("x.{}.json", hex)
        }
    }

    async fn write_record(&self, record: &RoomRecord) -> Result<(), String> {
        let file_name = Self::file_name(&record.name);
        let path = self.dir.join(&file_name);
        // Unique per write so overlapping writers never share a temp file
        let tmp_path = self.dir.join(format!("{}.{}.tmp", file_name, Uuid::new_v4()));

        let data = serde_json::to_vec(record).map_err(|e| e.to_string())?;
        tokio::fs::write(&tmp_path, data)
            .await
            .map_err(|e| format!("{}: {}", tmp_path.display(), e))?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(format!("{}: {}", path.display(), e));
        }

        debug!(room = %record.name, path = %path.display(), "Room written");
        Ok(())
    }
}

#[async_trait]
impl SnapshotStorage for FileSnapshotStorage {
    #[instrument(skip(self, snapshot), fields(dir = %self.dir.display()))]
    async fn write(&self, snapshot: &Snapshot) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AppError::PersistenceWriteFailed(e.to_string()))?;

        // Keep going past a bad room so one failure doesn't stall the rest
        let mut failures = Vec::new();
        for record in &snapshot.rooms {
            if let Err(e) = self.write_record(record).await {
                warn!(room = %record.name, error = %e, "Failed to write room");
                failures.push(e);
            }
        }

        match failures.first() {
            None => Ok(()),
            Some(first) => Err(AppError::PersistenceWriteFailed(format!(
                "{} of {} rooms failed, first: {}",
                failures.len(),
                snapshot.rooms.len(),
                first
            ))),
        }
    }

    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    async fn load(&self) -> Result<Snapshot, AppError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("Storage directory missing, starting empty");
                return Ok(Snapshot::default());
            }
            Err(e) => return Err(AppError::PersistenceReadFailed(e.to_string())),
        };

        let mut rooms = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AppError::PersistenceReadFailed(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            let data = match tokio::fs::read(&path).await {
                Ok(data) => data,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable room file");
                    continue;
                }
            };

            match serde_json::from_slice::<RoomRecord>(&data) {
                Ok(record) => rooms.push(record),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping undecodable room file");
                }
            }
        }

        info!(room_count = rooms.len(), "Snapshot loaded");
        Ok(Snapshot { rooms })
    }
}

/// Keeps the last written snapshot in memory
///
/// Writes can be made to fail on demand, which lets callers exercise retry paths.
#[derive(Default)]
pub struct InMemorySnapshotStorage {
    latest: Mutex<Option<Snapshot>>,
    writes: AtomicUsize,
    pending_failures: AtomicUsize,
}

impl InMemorySnapshotStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` writes fail
    pub fn fail_next_writes(&self, count: usize) {
        self.pending_failures.store(count, Ordering::SeqCst);
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn latest(&self) -> Option<Snapshot> {
        self.latest.lock().ok().and_then(|latest| latest.clone())
    }
}

#[async_trait]
impl SnapshotStorage for InMemorySnapshotStorage {
    async fn write(&self, snapshot: &Snapshot) -> Result<(), AppError> {
        let failing = self
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(AppError::PersistenceWriteFailed(
                "simulated write failure".to_string(),
            ));
        }

        let mut latest = self.latest.lock().map_err(|_| AppError::Internal)?;
        *latest = Some(snapshot.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load(&self) -> Result<Snapshot, AppError> {
        Ok(self.latest().unwrap_or_default())
    }
}
