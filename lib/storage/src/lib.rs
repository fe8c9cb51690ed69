pub mod lmdb_storage;
pub mod manager;
pub mod snapshot;

pub use lmdb_storage::LmdbStorage;
pub use manager::{SegmentView, StorageManager, TeamView};
pub use snapshot::{CatalogSnapshotData, SnapshotDescription, SnapshotManager};
