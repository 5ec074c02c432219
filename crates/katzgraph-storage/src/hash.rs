//! Snapshot digests using blake3.
//!
//! The digest is taken over the snapshot's compact JSON encoding. Snapshot
//! lists are ordered (node maps are sorted by id, child and parent lists
//! keep graph order), so the same graph always yields the same digest.

use crate::error::StorageError;
use crate::types::GraphSnapshot;

/// Computes the blake3 digest of a snapshot.
pub fn snapshot_digest(snapshot: &GraphSnapshot) -> Result<blake3::Hash, StorageError> {
    let bytes = serde_json::to_vec(snapshot)?;
    Ok(blake3::hash(&bytes))
}

/// Checks `snapshot` against a hex digest read back from storage.
pub fn verify_digest(snapshot: &GraphSnapshot, expected: &str) -> Result<(), StorageError> {
    let actual = snapshot_digest(snapshot)?;
    let expected_hash =
        blake3::Hash::from_hex(expected).map_err(|e| StorageError::IntegrityError {
            reason: format!("stored digest is not valid hex: {e}"),
        })?;
    // blake3::Hash equality is constant-time
    if actual != expected_hash {
        return Err(StorageError::IntegrityError {
            reason: format!(
                "snapshot digest mismatch: stored {expected}, computed {}",
                actual.to_hex()
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::decompose;
    use katzgraph_core::{parse_edge_text, BackEdgeSet};

    fn snapshot(text: &str) -> GraphSnapshot {
        decompose(&parse_edge_text(text).unwrap(), &BackEdgeSet::new())
    }

    #[test]
    fn digest_is_deterministic() {
        let a = snapshot_digest(&snapshot("0 1\n1 2\n")).unwrap();
        let b = snapshot_digest(&snapshot("0 1\n1 2\n")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn digest_tracks_child_order() {
        let a = snapshot_digest(&snapshot("0 1\n0 2\n")).unwrap();
        let b = snapshot_digest(&snapshot("0 2\n0 1\n")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn verify_rejects_tampered_weight() {
        let mut snap = snapshot("0 1\n1 2\n");
        let digest = snapshot_digest(&snap).unwrap().to_hex().to_string();
        verify_digest(&snap, &digest).unwrap();

        snap.weights[0].2 = 7.0;
        assert!(matches!(
            verify_digest(&snap, &digest),
            Err(StorageError::IntegrityError { .. })
        ));
    }

    #[test]
    fn verify_rejects_garbage_digest() {
        let snap = snapshot("0 1\n");
        assert!(matches!(
            verify_digest(&snap, "not-hex"),
            Err(StorageError::IntegrityError { .. })
        ));
    }
}
