//! Snapshot persistence
//!
//! A store holds at most one [`PersistedSnapshot`]; saving overwrites it.

pub mod file_store;
pub mod memory_store;

pub use file_store::FileSnapshotStore;
pub use memory_store::MemorySnapshotStore;

use crate::{error::StoreError, state::PersistedSnapshot};

/// Single-slot, last-writer-wins snapshot persistence
pub trait SnapshotStore: Send + Sync {
    /// Load the stored snapshot. `Ok(None)` means nothing was saved yet.
    fn load(&self) -> Result<Option<PersistedSnapshot>, StoreError>;

    /// Replace the stored snapshot. Invalid snapshots are rejected.
    fn save(&self, snapshot: &PersistedSnapshot) -> Result<(), StoreError>;
}
