//! Storage error types for katzgraph-storage.
//!
//! [`StorageError`] covers the failure modes of persisting and reloading
//! graph snapshots and of publishing output files.

use std::path::PathBuf;

use katzgraph_core::CoreError;
use thiserror::Error;

/// Errors produced by storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem access failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// SQLite reported an error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Applying schema migrations failed.
    #[error("migration error: {0}")]
    Migration(String),

    /// No snapshot has been saved at the given location.
    #[error("no graph snapshot at {}", path.display())]
    SnapshotNotFound { path: PathBuf },

    /// A stored snapshot does not match its recorded digest.
    #[error("integrity error: {reason}")]
    IntegrityError { reason: String },

    /// The snapshot could not be turned back into a graph.
    #[error("reconstruction error: {reason}")]
    ReconstructionError { reason: String },

    /// The reconstructed graph violated a core invariant.
    #[error(transparent)]
    Core(#[from] CoreError),
}
