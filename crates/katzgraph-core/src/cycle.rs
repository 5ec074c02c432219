//! Back-edge detection and cycle elimination.
//!
//! A single depth-first traversal classifies an edge `node -> neighbor` as a
//! back edge when `neighbor` is on the active DFS path. Removing exactly
//! those edges leaves no directed cycle. The traversal uses an explicit
//! frame stack, so graph depth is not limited by the thread's call stack.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::graph::CfgGraph;
use crate::id::NodeId;

/// An edge removed by [`CfgGraph::eliminate_cycles`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BackEdge {
    pub parent: NodeId,
    pub child: NodeId,
    /// Weight the edge had when it was removed.
    pub weight: f64,
}

/// Edges removed to make the graph acyclic, in discovery order.
///
/// Retained so the full cyclic shape can be reproduced for the adjacency
/// listings, while the acyclic form is used for scoring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackEdgeSet {
    edges: Vec<BackEdge>,
}

impl BackEdgeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BackEdge> {
        self.edges.iter()
    }

    pub fn push(&mut self, edge: BackEdge) {
        self.edges.push(edge);
    }

    /// Appends every edge of `other`.
    pub fn extend(&mut self, other: BackEdgeSet) {
        self.edges.extend(other.edges);
    }
}

impl FromIterator<BackEdge> for BackEdgeSet {
    fn from_iter<I: IntoIterator<Item = BackEdge>>(iter: I) -> Self {
        BackEdgeSet {
            edges: iter.into_iter().collect(),
        }
    }
}

/// One suspended DFS call: the node and the position of the next child to
/// visit.
struct Frame {
    node: NodeId,
    next_child: usize,
}

/// Returns the back edges of one full DFS over `graph`, as `(parent, child)`.
///
/// Roots are tried in source order (the order nodes first appeared as an
/// edge source), then any remaining nodes ascending; children in insertion
/// order.
/// Self-loops are back edges. Edges into an already finished node (cross or
/// forward edges) are not.
pub fn find_back_edges(graph: &CfgGraph) -> Vec<(NodeId, NodeId)> {
    let mut visited: HashSet<NodeId> = HashSet::with_capacity(graph.node_count());
    let mut on_path: HashSet<NodeId> = HashSet::new();
    let mut back_edges = Vec::new();

    for root in graph.source_order().chain(graph.nodes()) {
        if !visited.insert(root) {
            continue;
        }
        on_path.insert(root);
        let mut stack = vec![Frame {
            node: root,
            next_child: 0,
        }];

        while let Some(frame) = stack.last_mut() {
            let node = frame.node;
            match graph.child_at(node, frame.next_child) {
                Some(child) => {
                    frame.next_child += 1;
                    if visited.insert(child) {
                        on_path.insert(child);
                        stack.push(Frame {
                            node: child,
                            next_child: 0,
                        });
                    } else if on_path.contains(&child) {
                        back_edges.push((node, child));
                    }
                }
                None => {
                    on_path.remove(&node);
                    stack.pop();
                }
            }
        }
    }

    back_edges
}

impl CfgGraph {
    /// Removes every back edge found by [`find_back_edges`] and returns them.
    ///
    /// Nodes are never removed, even if they end up isolated.
    pub fn eliminate_cycles(&mut self) -> BackEdgeSet {
        find_back_edges(self)
            .into_iter()
            .filter_map(|(parent, child)| {
                self.remove_edge(parent, child).map(|weight| BackEdge {
                    parent,
                    child,
                    weight,
                })
            })
            .collect()
    }

    /// Puts previously eliminated edges back with their recorded weights.
    ///
    /// Edges that already exist are left unchanged.
    pub fn restore_back_edges(&mut self, back_edges: &BackEdgeSet) {
        for edge in back_edges.iter() {
            self.add_edge(edge.parent, edge.child, edge.weight);
        }
    }

    /// Returns `true` if no directed cycle is reachable through `forward`.
    pub fn is_acyclic(&self) -> bool {
        find_back_edges(self).is_empty()
    }
}
