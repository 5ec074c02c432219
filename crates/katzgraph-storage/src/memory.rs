//! In-memory [`SnapshotStore`] backend, used by tests and dry runs.

use std::path::PathBuf;

use crate::error::StorageError;
use crate::hash::{snapshot_digest, verify_digest};
use crate::traits::SnapshotStore;
use crate::types::{GraphSnapshot, StoredSnapshot, SNAPSHOT_FORMAT_VERSION};

/// Keeps the snapshot in process memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    stored: Option<StoredSnapshot>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for InMemoryStore {
    fn save(&mut self, snapshot: &GraphSnapshot) -> Result<(), StorageError> {
        let digest = snapshot_digest(snapshot)?.to_hex().to_string();
        self.stored = Some(StoredSnapshot {
            format_version: SNAPSHOT_FORMAT_VERSION,
            digest,
            snapshot: snapshot.clone(),
        });
        Ok(())
    }

    fn load(&self) -> Result<GraphSnapshot, StorageError> {
        let stored = self
            .stored
            .as_ref()
            .ok_or_else(|| StorageError::SnapshotNotFound {
                path: PathBuf::from(":memory:"),
            })?;
        verify_digest(&stored.snapshot, &stored.digest)?;
        Ok(stored.snapshot.clone())
    }

    fn exists(&self) -> Result<bool, StorageError> {
        Ok(self.stored.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use katzgraph_core::{parse_edge_text, NodeId};

    #[test]
    fn load_before_save_is_not_found() {
        let store = InMemoryStore::new();
        assert!(matches!(
            store.load(),
            Err(StorageError::SnapshotNotFound { .. })
        ));
    }

    #[test]
    fn save_replaces_previous_snapshot() {
        let mut store = InMemoryStore::new();
        let mut graph = parse_edge_text("0 1\n1 2\n").unwrap();
        let back_edges = graph.eliminate_cycles();
        store.save_graph(&graph, &back_edges).unwrap();

        graph.contract_node(NodeId(1));
        store.save_graph(&graph, &back_edges).unwrap();

        let (loaded, _) = store.load_graph().unwrap();
        assert!(!loaded.contains_node(NodeId(1)));
        assert_eq!(loaded.weight(NodeId(0), NodeId(2)), Some(2.0));
    }
}
