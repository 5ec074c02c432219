//! Katz centrality scoring over the live graph.
//!
//! Scores propagate against the direction of control flow: the scorer's
//! internal graph holds an edge `child -> parent` for every CFG edge
//! `parent -> child`, weighted `1 / weight`. A node's score is
//!
//! ```text
//! score(u) = beta + alpha * Σ_{v -> u} w(v, u) * score(v)
//! ```
//!
//! so blocks that many paths flow out of end up with the highest scores.
//! Raw scores are rescaled so the maximum is exactly [`SCORE_CEILING`],
//! which keeps passes on a shrinking graph comparable.

use std::collections::{BTreeMap, HashMap};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::graph::CfgGraph;
use crate::id::{DenseIndex, NodeId};

/// Score given to the most central node(s).
pub const SCORE_CEILING: f64 = 10.0;

/// Decimal digits kept in published scores.
pub const SCORE_DECIMALS: i32 = 14;

/// Parameters of the Katz iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KatzParams {
    /// Damping applied to neighbour contributions.
    pub alpha: f64,
    /// Base score every node receives.
    pub beta: f64,
    /// Iteration stops once the L2 norm of the change drops below this.
    pub tolerance: f64,
    /// Hard cap on iterations.
    pub max_iterations: usize,
}

impl Default for KatzParams {
    fn default() -> Self {
        KatzParams {
            alpha: 0.5,
            beta: 1.0,
            tolerance: 1e-12,
            max_iterations: 10_000,
        }
    }
}

impl KatzParams {
    /// Rejects parameters that cannot produce a positive, finite ranking.
    pub fn validate(&self) -> Result<(), CoreError> {
        let reason = if !(self.alpha.is_finite() && self.alpha >= 0.0) {
            Some(format!("alpha must be finite and non-negative, got {}", self.alpha))
        } else if !(self.beta.is_finite() && self.beta > 0.0) {
            Some(format!("beta must be finite and positive, got {}", self.beta))
        } else if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            Some(format!("tolerance must be positive, got {}", self.tolerance))
        } else if self.max_iterations == 0 {
            Some("max_iterations must be at least 1".to_string())
        } else {
            None
        };
        match reason {
            Some(reason) => Err(CoreError::InvalidParams { reason }),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Contiguous index space
// ---------------------------------------------------------------------------

/// Bidirectional mapping between the (sparse) node ids of a graph and a
/// contiguous `0..n` index space, ordered by id.
#[derive(Debug, Clone)]
pub struct IndexSpace {
    ids: Vec<NodeId>,
    positions: HashMap<NodeId, DenseIndex>,
}

impl IndexSpace {
    /// Indexes the current node set of `graph`.
    pub fn new(graph: &CfgGraph) -> Self {
        let ids: Vec<NodeId> = graph.nodes().collect();
        let positions = ids
            .iter()
            .enumerate()
            .map(|(pos, &id)| (id, DenseIndex(pos as u32)))
            .collect();
        IndexSpace { ids, positions }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn dense(&self, id: NodeId) -> Option<DenseIndex> {
        self.positions.get(&id).copied()
    }

    pub fn node_id(&self, idx: DenseIndex) -> Option<NodeId> {
        self.ids.get(idx.0 as usize).copied()
    }
}

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

/// Normalized score per node, in `(0, SCORE_CEILING]`, ascending by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreMap(BTreeMap<NodeId, f64>);

impl ScoreMap {
    pub fn get(&self, id: NodeId) -> Option<f64> {
        self.0.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Scores in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, f64)> + '_ {
        self.0.iter().map(|(&id, &score)| (id, score))
    }

    pub fn max(&self) -> Option<f64> {
        self.0.values().copied().reduce(f64::max)
    }

    pub fn min(&self) -> Option<f64> {
        self.0.values().copied().reduce(f64::min)
    }
}

impl FromIterator<(NodeId, f64)> for ScoreMap {
    fn from_iter<I: IntoIterator<Item = (NodeId, f64)>>(iter: I) -> Self {
        ScoreMap(iter.into_iter().collect())
    }
}

/// Diagnostics of one scoring pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KatzRun {
    pub iterations: usize,
    /// `false` if `max_iterations` was reached before the tolerance.
    pub converged: bool,
    /// Largest raw score before normalization.
    pub max_raw: f64,
}

// ---------------------------------------------------------------------------
// Scorer
// ---------------------------------------------------------------------------

/// Computes a [`ScoreMap`] for the current state of a graph.
#[derive(Debug, Clone, Copy)]
pub struct CentralityScorer {
    params: KatzParams,
}

impl CentralityScorer {
    pub fn new(params: KatzParams) -> Result<Self, CoreError> {
        params.validate()?;
        Ok(CentralityScorer { params })
    }

    pub fn params(&self) -> &KatzParams {
        &self.params
    }

    /// Scores every node of `graph`.
    ///
    /// Errors with [`CoreError::EmptyGraph`] when there is nothing to score;
    /// callers skip publication in that case.
    pub fn score(&self, graph: &CfgGraph) -> Result<(ScoreMap, KatzRun), CoreError> {
        let space = IndexSpace::new(graph);
        if space.is_empty() {
            return Err(CoreError::EmptyGraph);
        }
        let flow = build_flow_graph(graph, &space);
        let (raw, iterations, converged) = katz_iterate(&flow, &self.params)?;

        let max_raw = raw.iter().copied().fold(f64::MIN, f64::max);
        let scores = raw
            .iter()
            .enumerate()
            .filter_map(|(pos, &score)| {
                let id = space.node_id(DenseIndex(pos as u32))?;
                Some((id, round_score(normalize(score, max_raw))))
            })
            .collect();

        Ok((
            scores,
            KatzRun {
                iterations,
                converged,
                max_raw,
            },
        ))
    }
}

/// Builds the scorer's graph: one node per index position, one reversed
/// edge `child -> parent` weighted `1 / weight` per CFG edge.
fn build_flow_graph(graph: &CfgGraph, space: &IndexSpace) -> DiGraph<NodeId, f64, u32> {
    let mut flow = DiGraph::with_capacity(space.len(), graph.edge_count());
    for id in graph.nodes() {
        flow.add_node(id);
    }
    for (parent, child, weight) in graph.edges() {
        if let (Some(p), Some(c)) = (space.dense(parent), space.dense(child)) {
            let p: NodeIndex<u32> = p.into();
            let c: NodeIndex<u32> = c.into();
            flow.add_edge(c, p, 1.0 / weight);
        }
    }
    flow
}

/// Jacobi iteration from all-zero scores.
///
/// Returns the scores, the number of iterations run, and whether the
/// tolerance was reached.
fn katz_iterate(
    flow: &DiGraph<NodeId, f64, u32>,
    params: &KatzParams,
) -> Result<(Vec<f64>, usize, bool), CoreError> {
    let n = flow.node_count();
    let mut scores = vec![0.0; n];
    let mut next = vec![0.0; n];

    for iteration in 1..=params.max_iterations {
        for u in flow.node_indices() {
            let inflow: f64 = flow
                .edges_directed(u, Direction::Incoming)
                .map(|e| e.weight() * scores[e.source().index()])
                .sum();
            next[u.index()] = params.beta + params.alpha * inflow;
        }

        let delta = scores
            .iter()
            .zip(&next)
            .map(|(old, new)| (new - old) * (new - old))
            .sum::<f64>()
            .sqrt();
        std::mem::swap(&mut scores, &mut next);

        if !delta.is_finite() {
            return Err(CoreError::Diverged { iterations: iteration });
        }
        if delta < params.tolerance {
            return Ok((scores, iteration, true));
        }
    }

    Ok((scores, params.max_iterations, false))
}

/// Rescales so that `max_raw` maps to exactly [`SCORE_CEILING`].
fn normalize(score: f64, max_raw: f64) -> f64 {
    if score == max_raw {
        SCORE_CEILING
    } else {
        SCORE_CEILING / max_raw * score
    }
}

fn round_score(score: f64) -> f64 {
    let factor = 10f64.powi(SCORE_DECIMALS);
    (score * factor).round() / factor
}
