//! Error type for the update loop.

use katzgraph_core::CoreError;
use katzgraph_storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Core(#[from] CoreError),

    /// An environment variable held an unusable value.
    #[error("invalid configuration {key}: {reason}")]
    Config { key: String, reason: String },
}
