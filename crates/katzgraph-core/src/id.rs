//! Basic-block identifiers.
//!
//! [`NodeId`] is the engine's zero-based block id. The fuzzer's
//! instrumentation numbers blocks from 1, so every value crossing the
//! coverage or publication boundary goes through
//! [`NodeId::from_instrumentation`] / [`NodeId::instrumentation_id`].

use std::fmt;

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

/// Zero-based basic-block identifier.
///
/// Ids come from an external instrumentation scheme and are not required to
/// be contiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Converts a 1-based instrumentation id (as written by the fuzzer) into
    /// a zero-based `NodeId`. Returns `None` for `0`, which has no block.
    pub fn from_instrumentation(raw: u64) -> Option<Self> {
        let shifted = raw.checked_sub(1)?;
        u32::try_from(shifted).ok().map(NodeId)
    }

    /// The 1-based instrumentation id printed in published files.
    pub fn instrumentation_id(self) -> u64 {
        u64::from(self.0) + 1
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(raw: u32) -> Self {
        NodeId(raw)
    }
}

/// Position of a node in the scorer's contiguous index space.
///
/// Only meaningful for the [`crate::centrality::IndexSpace`] that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DenseIndex(pub u32);

impl From<NodeIndex<u32>> for DenseIndex {
    fn from(idx: NodeIndex<u32>) -> Self {
        DenseIndex(idx.index() as u32)
    }
}

impl From<DenseIndex> for NodeIndex<u32> {
    fn from(idx: DenseIndex) -> Self {
        NodeIndex::new(idx.0 as usize)
    }
}
