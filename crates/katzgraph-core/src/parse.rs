//! Edge-list parser for the CFG section.
//!
//! The section is line-oriented ASCII: each line holds two
//! whitespace-separated unsigned integers, `from to`, naming zero-based
//! block ids. Ids are taken as-is; the 1-based shift only applies to the
//! coverage and output channels.

use crate::error::CoreError;
use crate::graph::{CfgGraph, INITIAL_EDGE_WEIGHT};
use crate::id::NodeId;

/// Parses raw section bytes into a graph.
///
/// The bytes must be UTF-8. See [`parse_edge_text`] for the line format.
pub fn parse_edge_list(bytes: &[u8]) -> Result<CfgGraph, CoreError> {
    let text = std::str::from_utf8(bytes)?;
    parse_edge_text(text)
}

/// Parses an edge list into a graph with every weight set to
/// [`INITIAL_EDGE_WEIGHT`].
///
/// Duplicate `(from, to)` pairs collapse into one edge. Blank lines are
/// skipped. Any other line that is not exactly two unsigned 32-bit integers
/// fails the whole parse; no partial graph is returned.
pub fn parse_edge_text(text: &str) -> Result<CfgGraph, CoreError> {
    let mut graph = CfgGraph::new();

    for (idx, line) in text.lines().enumerate() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        let line_no = idx + 1;
        if tokens.len() != 2 {
            return Err(malformed(
                line_no,
                line,
                format!("expected 2 node ids, found {}", tokens.len()),
            ));
        }
        let from = parse_node(tokens[0], line_no, line)?;
        let to = parse_node(tokens[1], line_no, line)?;
        graph.add_edge(from, to, INITIAL_EDGE_WEIGHT);
    }

    Ok(graph)
}

fn parse_node(token: &str, line_no: usize, line: &str) -> Result<NodeId, CoreError> {
    token
        .parse::<u32>()
        .map(NodeId)
        .map_err(|e| malformed(line_no, line, format!("invalid node id '{token}': {e}")))
}

fn malformed(line: usize, content: &str, reason: String) -> CoreError {
    CoreError::MalformedEdge {
        line,
        content: content.trim().to_string(),
        reason,
    }
}
