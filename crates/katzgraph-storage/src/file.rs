//! JSON file [`SnapshotStore`] backend.
//!
//! This is the default backend: one file (`graph_data_pack` unless
//! configured otherwise) holding a [`StoredSnapshot`] envelope. Saves go
//! through [`write_atomic`], so a reader never sees a half-written file.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::StorageError;
use crate::hash::{snapshot_digest, verify_digest};
use crate::publish::write_atomic;
use crate::traits::SnapshotStore;
use crate::types::{GraphSnapshot, StoredSnapshot, SNAPSHOT_FORMAT_VERSION};

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for JsonFileStore {
    fn save(&mut self, snapshot: &GraphSnapshot) -> Result<(), StorageError> {
        let stored = StoredSnapshot {
            format_version: SNAPSHOT_FORMAT_VERSION,
            digest: snapshot_digest(snapshot)?.to_hex().to_string(),
            snapshot: snapshot.clone(),
        };
        let bytes = serde_json::to_vec(&stored)?;
        write_atomic(&self.path, &bytes)
    }

    fn load(&self) -> Result<GraphSnapshot, StorageError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::SnapshotNotFound {
                    path: self.path.clone(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        let stored: StoredSnapshot = serde_json::from_slice(&bytes)?;
        if stored.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(StorageError::IntegrityError {
                reason: format!(
                    "unsupported snapshot format version {} (expected {})",
                    stored.format_version, SNAPSHOT_FORMAT_VERSION
                ),
            });
        }
        verify_digest(&stored.snapshot, &stored.digest)?;
        Ok(stored.snapshot)
    }

    fn exists(&self) -> Result<bool, StorageError> {
        Ok(self.path.try_exists()?)
    }
}
