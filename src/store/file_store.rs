//! JSON file snapshot store

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tracing::debug;

use super::SnapshotStore;
use crate::{error::StoreError, state::PersistedSnapshot};

/// Stores the snapshot as a pretty-printed JSON file. Writes go to a sibling
/// temporary file first and are renamed into place.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "snapshot.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Result<Option<PersistedSnapshot>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No snapshot at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        PersistedSnapshot::from_json(&raw).map(Some)
    }

    fn save(&self, snapshot: &PersistedSnapshot) -> Result<(), StoreError> {
        snapshot.validate()?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.temp_path();
        fs::write(&tmp, snapshot.to_json()?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
