//! In-memory snapshot store

use std::sync::Mutex;

use super::SnapshotStore;
use crate::{error::StoreError, state::PersistedSnapshot};

#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    snapshot: Mutex<Option<PersistedSnapshot>>,
    writes: Mutex<u64>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed the store, as if a previous run had saved `snapshot`
    pub fn with_snapshot(snapshot: PersistedSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
            writes: Mutex::new(0),
        }
    }

    /// Number of successful saves so far
    pub fn writes(&self) -> u64 {
        self.writes.lock().map(|w| *w).unwrap_or(0)
    }

    /// Latest stored snapshot without going through the trait
    pub fn latest(&self) -> Option<PersistedSnapshot> {
        self.snapshot.lock().ok().and_then(|s| s.clone())
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<PersistedSnapshot>, StoreError> {
        let snapshot = self
            .snapshot
            .lock()
            .map_err(|e| StoreError::Invalid(format!("store lock poisoned: {}", e)))?;
        Ok(snapshot.clone())
    }

    fn save(&self, snapshot: &PersistedSnapshot) -> Result<(), StoreError> {
        snapshot.validate()?;
        let mut slot = self
            .snapshot
            .lock()
            .map_err(|e| StoreError::Invalid(format!("store lock poisoned: {}", e)))?;
        *slot = Some(snapshot.clone());
        drop(slot);

        if let Ok(mut writes) = self.writes.lock() {
            *writes += 1;
        }
        Ok(())
    }
}
