pub mod snapshot_storage;

pub use snapshot_storage::{FileSnapshotStorage, MemorySnapshotStorage, SnapshotStorage};
