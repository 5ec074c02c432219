//! Coverage contraction: removing explored blocks from the live graph.
//!
//! When a node `v` is contracted, every parent of `v` is wired directly to
//! every child of `v`, so reachability among the remaining nodes is
//! preserved. A bridged edge weighs `weight(p, v) + weight(v, c)`, the
//! cumulative cost of the path it replaces. An edge that already exists is
//! left as it is.

use crate::coverage::CoverageBatch;
use crate::graph::CfgGraph;
use crate::id::NodeId;

/// Outcome of contracting one coverage batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContractionReport {
    /// Ids in the batch, duplicates included.
    pub requested: usize,
    /// Nodes actually removed.
    pub removed: usize,
    /// Ids that were not in the graph (never present, already removed, or
    /// repeated within the batch).
    pub missing: usize,
    /// Edges added to bridge removed nodes.
    pub bridged: usize,
}

impl CfgGraph {
    /// Contracts a single node out of the graph.
    ///
    /// Returns the number of bridging edges added, or `None` if `id` is not
    /// in the graph. Parent/child pairs that involve `id` itself are not
    /// bridged.
    pub fn contract_node(&mut self, id: NodeId) -> Option<usize> {
        if !self.contains_node(id) {
            return None;
        }
        let children: Vec<(NodeId, f64)> = self
            .children(id)
            .filter_map(|child| self.weight(id, child).map(|w| (child, w)))
            .collect();
        let parents: Vec<(NodeId, f64)> = self
            .parents(id)
            .filter_map(|parent| self.weight(parent, id).map(|w| (parent, w)))
            .collect();

        let mut bridged = 0;
        for &(child, out_weight) in &children {
            if child == id {
                continue;
            }
            for &(parent, in_weight) in &parents {
                if parent == id {
                    continue;
                }
                if self.add_edge(parent, child, in_weight + out_weight) {
                    bridged += 1;
                }
            }
        }

        self.remove_node(id);
        Some(bridged)
    }

    /// Contracts every id of `batch` in order, each fully before the next.
    pub fn contract_batch(&mut self, batch: &CoverageBatch) -> ContractionReport {
        let mut report = ContractionReport {
            requested: batch.len(),
            ..ContractionReport::default()
        };
        for &id in batch.ids() {
            match self.contract_node(id) {
                Some(bridged) => {
                    report.removed += 1;
                    report.bridged += bridged;
                }
                None => report.missing += 1,
            }
        }
        report
    }
}
