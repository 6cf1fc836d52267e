// Public API - what other modules can use
pub use scheduler::{start_persistence_task, PersistenceConfig, PersistenceScheduler};
pub use storage::{FileSnapshotStorage, InMemorySnapshotStorage, SnapshotStorage};

// Internal modules
mod scheduler;
mod storage;
