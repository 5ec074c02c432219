//! Core error types for katzgraph-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering the
//! failure modes of parsing, graph reconstruction, and scoring.

use crate::id::NodeId;
use thiserror::Error;

/// Errors produced by the katzgraph-core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A non-blank edge-list line was not exactly two unsigned integers.
    #[error("malformed edge on line {line}: {reason} ('{content}')")]
    MalformedEdge {
        line: usize,
        content: String,
        reason: String,
    },

    /// The edge-list bytes were not valid UTF-8.
    #[error("edge list is not valid UTF-8: {0}")]
    InvalidEncoding(#[from] std::str::Utf8Error),

    /// A node was not found in the graph.
    #[error("node not found: NodeId({id})", id = id.0)]
    NodeNotFound { id: NodeId },

    /// The forward/reverse mirror invariant was violated.
    #[error("graph inconsistency: {reason}")]
    GraphInconsistency { reason: String },

    /// Scoring parameters cannot produce a positive ranking.
    #[error("invalid centrality parameters: {reason}")]
    InvalidParams { reason: String },

    /// Scoring was requested on a graph with no nodes.
    #[error("cannot score an empty graph")]
    EmptyGraph,

    /// The centrality iteration produced a non-finite score.
    #[error("centrality diverged after {iterations} iteration(s)")]
    Diverged { iterations: usize },
}
