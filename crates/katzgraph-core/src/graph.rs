//! CfgGraph: the weighted control-flow graph store.
//!
//! [`CfgGraph`] holds the live CFG as two co-indexed adjacency maps:
//! - **forward**: each node's children, each child carrying the weight of
//!   the edge leading to it;
//! - **reverse**: each node's parents.
//!
//! Keeping the weight inside the forward map makes "child is listed under
//! parent ⇔ the edge has a weight" hold by construction. The remaining half
//! of the invariant (forward and reverse mirror each other, and every known
//! node has an entry in both) is maintained by the mutation methods here,
//! which are the only code that touches the maps. Neither map is exposed
//! mutably.
//!
//! Child and parent lists keep insertion order so that traversal order and
//! persisted snapshots are stable. The graph also remembers the order in
//! which nodes first appeared as an edge source; cycle elimination starts
//! its traversals in that order.

use std::collections::BTreeMap;

use indexmap::{IndexMap, IndexSet};

use crate::error::CoreError;
use crate::id::NodeId;

/// Weight assigned to every edge read from the CFG section.
pub const INITIAL_EDGE_WEIGHT: f64 = 1.0;

/// The weighted directed control-flow graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CfgGraph {
    /// Children of every node, with the weight of each outgoing edge.
    forward: BTreeMap<NodeId, IndexMap<NodeId, f64>>,
    /// Parents of every node.
    reverse: BTreeMap<NodeId, IndexSet<NodeId>>,
    /// Nodes in the order they first gained an outgoing edge.
    source_order: IndexSet<NodeId>,
}

/// Adjacency a node had at the moment it was removed.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedNode {
    /// Outgoing edges `(child, weight)` in insertion order.
    pub children: Vec<(NodeId, f64)>,
    /// Parents in insertion order.
    pub parents: Vec<NodeId>,
}

impl CfgGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a graph from its two adjacency maps.
    ///
    /// Used by the storage layer when loading a snapshot. The maps are
    /// validated against the mirror invariant before being accepted; weights
    /// must be finite and positive. The source order defaults to ascending
    /// id; see [`CfgGraph::with_source_order`].
    pub fn from_parts(
        forward: BTreeMap<NodeId, IndexMap<NodeId, f64>>,
        reverse: BTreeMap<NodeId, IndexSet<NodeId>>,
    ) -> Result<Self, CoreError> {
        let source_order = forward
            .iter()
            .filter(|(_, children)| !children.is_empty())
            .map(|(&id, _)| id)
            .collect();
        let graph = CfgGraph {
            forward,
            reverse,
            source_order,
        };
        graph.check_consistency()?;
        Ok(graph)
    }

    /// Replaces the source order with `order`.
    ///
    /// Unknown ids are dropped. Nodes that have children but are missing
    /// from `order` keep their previous relative position after it.
    pub fn with_source_order(mut self, order: impl IntoIterator<Item = NodeId>) -> Self {
        let mut source_order: IndexSet<NodeId> = order
            .into_iter()
            .filter(|id| self.forward.contains_key(id))
            .collect();
        source_order.extend(self.source_order.iter().copied());
        self.source_order = source_order;
        self
    }

    // -----------------------------------------------------------------------
    // Read-only accessors
    // -----------------------------------------------------------------------

    /// Number of known nodes.
    pub fn node_count(&self) -> usize {
        self.forward.len()
    }

    /// Number of directed edges.
    pub fn edge_count(&self) -> usize {
        self.forward.values().map(IndexMap::len).sum()
    }

    /// Returns `true` if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Returns `true` if `id` is a known node.
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.forward.contains_key(&id)
    }

    /// All known nodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.forward.keys().copied()
    }

    /// Children of `id` in insertion order. Empty for unknown nodes.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.forward
            .get(&id)
            .into_iter()
            .flat_map(|children| children.keys().copied())
    }

    /// Parents of `id` in insertion order. Empty for unknown nodes.
    pub fn parents(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.reverse
            .get(&id)
            .into_iter()
            .flat_map(|parents| parents.iter().copied())
    }

    /// The `pos`-th child of `id`, if any.
    pub fn child_at(&self, id: NodeId, pos: usize) -> Option<NodeId> {
        self.forward
            .get(&id)?
            .get_index(pos)
            .map(|(child, _)| *child)
    }

    /// Weight of the edge `from -> to`, or `None` if there is no such edge.
    pub fn weight(&self, from: NodeId, to: NodeId) -> Option<f64> {
        self.forward.get(&from)?.get(&to).copied()
    }

    /// Returns `true` if the edge `from -> to` exists.
    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.weight(from, to).is_some()
    }

    /// Every edge as `(from, to, weight)`, sources ascending, children in
    /// insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId, f64)> + '_ {
        self.forward.iter().flat_map(|(&from, children)| {
            children.iter().map(move |(&to, &weight)| (from, to, weight))
        })
    }

    /// Nodes in the order they first appeared as an edge source.
    ///
    /// A node keeps its position after losing its outgoing edges and only
    /// leaves the order when it is removed.
    pub fn source_order(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.source_order.iter().copied()
    }

    /// Read-only view of the forward map (children with weights).
    pub fn forward(&self) -> &BTreeMap<NodeId, IndexMap<NodeId, f64>> {
        &self.forward
    }

    /// Read-only view of the reverse map (parents).
    pub fn reverse(&self) -> &BTreeMap<NodeId, IndexSet<NodeId>> {
        &self.reverse
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Registers `id` with empty child and parent lists if it is unknown.
    ///
    /// Returns `true` if the node was newly added.
    pub fn ensure_node(&mut self, id: NodeId) -> bool {
        let added = !self.forward.contains_key(&id);
        self.forward.entry(id).or_default();
        self.reverse.entry(id).or_default();
        added
    }

    /// Adds the edge `from -> to` with `weight`, registering both endpoints.
    ///
    /// An existing edge is left untouched (its weight is not merged) and
    /// `false` is returned. `weight` must be finite and positive.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, weight: f64) -> bool {
        debug_assert!(weight.is_finite() && weight > 0.0, "edge weight must be positive");
        self.ensure_node(from);
        self.ensure_node(to);

        let children = self.forward.entry(from).or_default();
        if children.contains_key(&to) {
            return false;
        }
        children.insert(to, weight);
        self.reverse.entry(to).or_default().insert(from);
        self.source_order.insert(from);

        #[cfg(debug_assertions)]
        self.assert_consistency();

        true
    }

    /// Removes the edge `from -> to`, returning its weight.
    ///
    /// Both endpoints stay in the graph even if they become isolated.
    pub fn remove_edge(&mut self, from: NodeId, to: NodeId) -> Option<f64> {
        let weight = self.forward.get_mut(&from)?.shift_remove(&to)?;
        if let Some(parents) = self.reverse.get_mut(&to) {
            parents.shift_remove(&from);
        }

        #[cfg(debug_assertions)]
        self.assert_consistency();

        Some(weight)
    }

    /// Removes `id` together with every edge incident to it.
    ///
    /// Returns the adjacency the node had, or `None` if it was unknown.
    pub fn remove_node(&mut self, id: NodeId) -> Option<RemovedNode> {
        let children = self.forward.remove(&id)?;
        let parents = self.reverse.remove(&id).unwrap_or_default();
        self.source_order.shift_remove(&id);

        for parent in &parents {
            if let Some(siblings) = self.forward.get_mut(parent) {
                siblings.shift_remove(&id);
            }
        }
        for child in children.keys() {
            if let Some(co_parents) = self.reverse.get_mut(child) {
                co_parents.shift_remove(&id);
            }
        }

        #[cfg(debug_assertions)]
        self.assert_consistency();

        Some(RemovedNode {
            children: children.into_iter().collect(),
            parents: parents.into_iter().collect(),
        })
    }

    // -----------------------------------------------------------------------
    // Consistency
    // -----------------------------------------------------------------------

    /// Verifies the mirror invariant between the forward and reverse maps.
    pub fn check_consistency(&self) -> Result<(), CoreError> {
        if self.forward.len() != self.reverse.len()
            || self.forward.keys().zip(self.reverse.keys()).any(|(a, b)| a != b)
        {
            return Err(CoreError::GraphInconsistency {
                reason: "forward and reverse maps cover different node sets".into(),
            });
        }

        for (&from, children) in &self.forward {
            for (&to, &weight) in children {
                if !(weight.is_finite() && weight > 0.0) {
                    return Err(CoreError::GraphInconsistency {
                        reason: format!("edge {from} -> {to} has invalid weight {weight}"),
                    });
                }
                let mirrored = self
                    .reverse
                    .get(&to)
                    .is_some_and(|parents| parents.contains(&from));
                if !mirrored {
                    return Err(CoreError::GraphInconsistency {
                        reason: format!("edge {from} -> {to} missing from reverse map"),
                    });
                }
            }
        }

        if let Some(id) = self.source_order.iter().find(|id| !self.forward.contains_key(id)) {
            return Err(CoreError::GraphInconsistency {
                reason: format!("source order lists unknown node {id}"),
            });
        }

        for (&to, parents) in &self.reverse {
            for &from in parents {
                if !self.has_edge(from, to) {
                    return Err(CoreError::GraphInconsistency {
                        reason: format!("reverse entry {to} <- {from} has no forward edge"),
                    });
                }
            }
        }

        Ok(())
    }

    /// Panics if the mirror invariant does not hold.
    ///
    /// Only called in debug builds (via `cfg(debug_assertions)`), and only on
    /// small graphs so that bulk construction stays linear.
    #[cfg(debug_assertions)]
    fn assert_consistency(&self) {
        if self.forward.len() <= 64 {
            if let Err(e) = self.check_consistency() {
                panic!("{e}");
            }
        }
    }
}
