//! Persisted forms of the graph.

use serde::{Deserialize, Serialize};

use katzgraph_core::{BackEdgeSet, NodeId};

/// Version written into every stored snapshot.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Flat, serializable form of a graph: the forward lists, the reverse
/// lists, and the edge weights, plus the back edges removed when the graph
/// was built.
///
/// All lists are in the graph's own order, so a save/load cycle preserves
/// child and parent ordering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// `(node, children)` for every node.
    pub forward: Vec<(NodeId, Vec<NodeId>)>,
    /// `(node, parents)` for every node.
    pub reverse: Vec<(NodeId, Vec<NodeId>)>,
    /// `(from, to, weight)` for every edge.
    pub weights: Vec<(NodeId, NodeId, f64)>,
    /// Nodes in the order they first appeared as an edge source.
    #[serde(default)]
    pub source_order: Vec<NodeId>,
    #[serde(default)]
    pub back_edges: BackEdgeSet,
}

impl GraphSnapshot {
    pub fn node_count(&self) -> usize {
        self.forward.len()
    }

    pub fn edge_count(&self) -> usize {
        self.weights.len()
    }
}

/// On-disk envelope: the snapshot with its format version and digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSnapshot {
    pub format_version: u32,
    /// Hex blake3 digest of the snapshot's JSON encoding.
    pub digest: String,
    pub snapshot: GraphSnapshot,
}

/// Counts reported by `katzgraph stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub nodes: usize,
    pub edges: usize,
    pub back_edges: usize,
}

impl From<&GraphSnapshot> for SnapshotSummary {
    fn from(snapshot: &GraphSnapshot) -> Self {
        SnapshotSummary {
            nodes: snapshot.node_count(),
            edges: snapshot.edge_count(),
            back_edges: snapshot.back_edges.len(),
        }
    }
}
