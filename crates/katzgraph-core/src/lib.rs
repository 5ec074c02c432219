//! Graph engine for coverage-guided block scoring.
//!
//! Turns a control-flow edge list into a weighted graph, breaks its cycles,
//! scores every block with Katz centrality, and contracts blocks out of the
//! graph as the fuzzer reports them covered. No I/O happens here; see
//! `katzgraph-storage` and `katzgraph-watch`.

pub mod centrality;
pub mod contract;
pub mod coverage;
pub mod cycle;
pub mod error;
pub mod graph;
pub mod id;
pub mod listing;
pub mod parse;

// Re-export commonly used types
pub use centrality::{CentralityScorer, KatzParams, KatzRun, ScoreMap, SCORE_CEILING};
pub use contract::ContractionReport;
pub use coverage::CoverageBatch;
pub use cycle::{find_back_edges, BackEdge, BackEdgeSet};
pub use error::CoreError;
pub use graph::CfgGraph;
pub use id::NodeId;
pub use listing::AdjacencyListing;
pub use parse::{parse_edge_list, parse_edge_text};
