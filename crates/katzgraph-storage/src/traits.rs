//! The [`SnapshotStore`] trait and backend selection.
//!
//! A store holds exactly one graph snapshot: the graph as it stood after
//! cycle elimination, together with the back edges that were removed.
//! Backends are swappable; [`open_store`] picks one from the path.

use std::path::Path;

use katzgraph_core::{BackEdgeSet, CfgGraph};

use crate::convert::{decompose, recompose};
use crate::error::StorageError;
use crate::file::JsonFileStore;
use crate::sqlite::SqliteStore;
use crate::types::GraphSnapshot;

/// Persistence contract for graph snapshots.
///
/// The trait is synchronous; the update loop only touches the store at
/// startup.
pub trait SnapshotStore {
    /// Saves `snapshot`, replacing whatever was stored before.
    fn save(&mut self, snapshot: &GraphSnapshot) -> Result<(), StorageError>;

    /// Loads the stored snapshot.
    ///
    /// Returns [`StorageError::SnapshotNotFound`] if nothing has been saved
    /// and [`StorageError::IntegrityError`] if the stored digest does not
    /// match the stored content.
    fn load(&self) -> Result<GraphSnapshot, StorageError>;

    /// Reports whether a snapshot has been saved.
    fn exists(&self) -> Result<bool, StorageError>;

    fn save_graph(&mut self, graph: &CfgGraph, back_edges: &BackEdgeSet) -> Result<(), StorageError> {
        self.save(&decompose(graph, back_edges))
    }

    fn load_graph(&self) -> Result<(CfgGraph, BackEdgeSet), StorageError> {
        recompose(self.load()?)
    }
}

/// Opens the store backing `path`.
///
/// `.db`, `.sqlite` and `.sqlite3` paths use [`SqliteStore`]; anything else
/// is a JSON snapshot file.
pub fn open_store(path: &Path) -> Result<Box<dyn SnapshotStore>, StorageError> {
    let is_sqlite = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("db" | "sqlite" | "sqlite3")
    );
    if is_sqlite {
        Ok(Box::new(SqliteStore::open(path)?))
    } else {
        Ok(Box::new(JsonFileStore::new(path)))
    }
}
