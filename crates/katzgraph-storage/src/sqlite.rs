//! SQLite [`SnapshotStore`] backend.
//!
//! The snapshot body is stored as JSON in a single row alongside its
//! format version and digest.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::StorageError;
use crate::hash::{snapshot_digest, verify_digest};
use crate::schema::{open_database, open_in_memory};
use crate::traits::SnapshotStore;
use crate::types::{GraphSnapshot, SNAPSHOT_FORMAT_VERSION};

pub struct SqliteStore {
    conn: Connection,
    path: PathBuf,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        Ok(SqliteStore {
            conn: open_database(path)?,
            path: path.to_path_buf(),
        })
    }

    pub fn in_memory() -> Result<Self, StorageError> {
        Ok(SqliteStore {
            conn: open_in_memory()?,
            path: PathBuf::from(":memory:"),
        })
    }
}

impl SnapshotStore for SqliteStore {
    fn save(&mut self, snapshot: &GraphSnapshot) -> Result<(), StorageError> {
        let digest = snapshot_digest(snapshot)?.to_hex().to_string();
        let body = serde_json::to_string(snapshot)?;

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO graph_snapshot (id, format_version, digest, body)
             VALUES (1, ?1, ?2, ?3)",
            params![SNAPSHOT_FORMAT_VERSION, digest, body],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn load(&self) -> Result<GraphSnapshot, StorageError> {
        let row = self
            .conn
            .query_row(
                "SELECT format_version, digest, body FROM graph_snapshot WHERE id = 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, u32>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        let (format_version, digest, body) = row.ok_or_else(|| StorageError::SnapshotNotFound {
            path: self.path.clone(),
        })?;
        if format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(StorageError::IntegrityError {
                reason: format!("unsupported snapshot format version {format_version}"),
            });
        }
        let snapshot: GraphSnapshot = serde_json::from_str(&body)?;
        verify_digest(&snapshot, &digest)?;
        Ok(snapshot)
    }

    fn exists(&self) -> Result<bool, StorageError> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM graph_snapshot", [], |row| row.get(0))?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use katzgraph_core::{parse_edge_text, NodeId};

    #[test]
    fn save_then_load() {
        let mut store = SqliteStore::in_memory().unwrap();
        assert!(!store.exists().unwrap());

        let mut graph = parse_edge_text("0 1\n1 2\n2 1\n0 2\n").unwrap();
        let back_edges = graph.eliminate_cycles();
        store.save_graph(&graph, &back_edges).unwrap();

        assert!(store.exists().unwrap());
        let (loaded, loaded_back) = store.load_graph().unwrap();
        assert_eq!(loaded, graph);
        assert_eq!(loaded_back, back_edges);
    }

    #[test]
    fn second_save_overwrites_row() {
        let mut store = SqliteStore::in_memory().unwrap();
        let mut graph = parse_edge_text("0 1\n1 2\n").unwrap();
        store.save_graph(&graph, &Default::default()).unwrap();
        graph.contract_node(NodeId(1));
        store.save_graph(&graph, &Default::default()).unwrap();

        let count: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM graph_snapshot", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(store.load().unwrap().node_count(), 2);
    }

    #[test]
    fn tampered_body_fails_integrity_check() {
        let mut store = SqliteStore::in_memory().unwrap();
        let graph = parse_edge_text("0 1\n").unwrap();
        store.save_graph(&graph, &Default::default()).unwrap();

        let tampered = parse_edge_text("0 1\n1 2\n").unwrap();
        let body = serde_json::to_string(&crate::convert::decompose(
            &tampered,
            &Default::default(),
        ))
        .unwrap();
        store
            .conn
            .execute("UPDATE graph_snapshot SET body = ?1 WHERE id = 1", [body])
            .unwrap();

        assert!(matches!(
            store.load(),
            Err(StorageError::IntegrityError { .. })
        ));
    }
}
