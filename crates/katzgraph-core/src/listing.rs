//! Full-shape adjacency listings for the fuzzer.
//!
//! Scoring runs on the acyclic graph, but the child/parent/border files the
//! fuzzer reads describe the original CFG, so back edges are appended to the
//! lists again here. The live graph is not modified.

use std::collections::BTreeMap;

use crate::cycle::BackEdgeSet;
use crate::graph::CfgGraph;
use crate::id::NodeId;

/// Child and parent lists per node, ascending by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjacencyListing {
    children: BTreeMap<NodeId, Vec<NodeId>>,
    parents: BTreeMap<NodeId, Vec<NodeId>>,
}

impl AdjacencyListing {
    /// Lists `graph` as it is.
    pub fn from_graph(graph: &CfgGraph) -> Self {
        let children = graph
            .nodes()
            .map(|id| (id, graph.children(id).collect()))
            .collect();
        let parents = graph
            .nodes()
            .map(|id| (id, graph.parents(id).collect()))
            .collect();
        AdjacencyListing { children, parents }
    }

    /// Lists `graph` with `back_edges` appended after each node's own
    /// entries, reproducing the pre-elimination shape.
    pub fn with_back_edges(graph: &CfgGraph, back_edges: &BackEdgeSet) -> Self {
        let mut listing = Self::from_graph(graph);
        for edge in back_edges.iter() {
            let children = listing.children.entry(edge.parent).or_default();
            if !children.contains(&edge.child) {
                children.push(edge.child);
            }
            let parents = listing.parents.entry(edge.child).or_default();
            if !parents.contains(&edge.parent) {
                parents.push(edge.parent);
            }
            listing.children.entry(edge.child).or_default();
            listing.parents.entry(edge.parent).or_default();
        }
        listing
    }

    /// `(node, children)` in ascending node order.
    pub fn children(&self) -> impl Iterator<Item = (NodeId, &[NodeId])> + '_ {
        self.children.iter().map(|(&id, list)| (id, list.as_slice()))
    }

    /// `(node, parents)` in ascending node order.
    pub fn parents(&self) -> impl Iterator<Item = (NodeId, &[NodeId])> + '_ {
        self.parents.iter().map(|(&id, list)| (id, list.as_slice()))
    }

    /// Every `(parent, child)` whose parent is a branch point (more than one
    /// child). Parents ascending, children ascending within a parent.
    pub fn border_edges(&self) -> Vec<(NodeId, NodeId)> {
        let mut border = Vec::new();
        for (&parent, children) in &self.children {
            if children.len() > 1 {
                let mut sorted = children.clone();
                sorted.sort();
                border.extend(sorted.into_iter().map(|child| (parent, child)));
            }
        }
        border
    }
}
