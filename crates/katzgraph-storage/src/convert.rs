//! Decompose/recompose conversions between [`CfgGraph`] and
//! [`GraphSnapshot`].
//!
//! [`decompose`] flattens a graph into adjacency lists and a weight table.
//! [`recompose`] rebuilds the graph and lets
//! [`CfgGraph::from_parts`] re-check the mirror invariant, so a corrupted
//! or hand-edited snapshot is rejected instead of loaded.

use std::collections::{BTreeMap, HashMap};

use indexmap::{IndexMap, IndexSet};

use katzgraph_core::{BackEdgeSet, CfgGraph, NodeId};

use crate::error::StorageError;
use crate::types::GraphSnapshot;

/// Flattens a graph and its back edges into a snapshot.
pub fn decompose(graph: &CfgGraph, back_edges: &BackEdgeSet) -> GraphSnapshot {
    let forward = graph
        .nodes()
        .map(|id| (id, graph.children(id).collect()))
        .collect();
    let reverse = graph
        .nodes()
        .map(|id| (id, graph.parents(id).collect()))
        .collect();
    let weights = graph.edges().collect();

    GraphSnapshot {
        forward,
        reverse,
        weights,
        source_order: graph.source_order().collect(),
        back_edges: back_edges.clone(),
    }
}

/// Rebuilds the graph and back edges from a snapshot.
pub fn recompose(snapshot: GraphSnapshot) -> Result<(CfgGraph, BackEdgeSet), StorageError> {
    let mut weights: HashMap<(NodeId, NodeId), f64> = HashMap::with_capacity(snapshot.weights.len());
    for (from, to, weight) in snapshot.weights {
        if weights.insert((from, to), weight).is_some() {
            return Err(StorageError::ReconstructionError {
                reason: format!("duplicate weight for edge {from} -> {to}"),
            });
        }
    }

    let mut forward: BTreeMap<NodeId, IndexMap<NodeId, f64>> = BTreeMap::new();
    for (id, children) in snapshot.forward {
        let mut entry = IndexMap::with_capacity(children.len());
        for child in children {
            let weight = weights.remove(&(id, child)).ok_or_else(|| {
                StorageError::ReconstructionError {
                    reason: format!("edge {id} -> {child} has no weight"),
                }
            })?;
            entry.insert(child, weight);
        }
        if forward.insert(id, entry).is_some() {
            return Err(StorageError::ReconstructionError {
                reason: format!("node {id} listed twice in forward map"),
            });
        }
    }
    if let Some(((from, to), _)) = weights.into_iter().next() {
        return Err(StorageError::ReconstructionError {
            reason: format!("weight recorded for unknown edge {from} -> {to}"),
        });
    }

    let mut reverse: BTreeMap<NodeId, IndexSet<NodeId>> = BTreeMap::new();
    for (id, parents) in snapshot.reverse {
        if reverse.insert(id, parents.into_iter().collect()).is_some() {
            return Err(StorageError::ReconstructionError {
                reason: format!("node {id} listed twice in reverse map"),
            });
        }
    }

    let graph = CfgGraph::from_parts(forward, reverse)?.with_source_order(snapshot.source_order);
    Ok((graph, snapshot.back_edges))
}
