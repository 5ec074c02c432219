//! The scoring engine: sole owner of the live graph.
//!
//! Constructed once from the persisted snapshot and then handed to the
//! update loop by exclusive reference. Every mutation goes through
//! [`ScoringEngine::apply_coverage`]; every score comes from a full
//! [`ScoringEngine::rescore`].

use katzgraph_core::{
    CentralityScorer, CfgGraph, ContractionReport, CoreError, CoverageBatch, KatzParams, KatzRun,
    ScoreMap,
};
use katzgraph_storage::SnapshotStore;

use crate::error::WatchError;

#[derive(Debug, Clone)]
pub struct ScoringEngine {
    graph: CfgGraph,
    scorer: CentralityScorer,
}

impl ScoringEngine {
    pub fn new(graph: CfgGraph, params: KatzParams) -> Result<Self, WatchError> {
        Ok(ScoringEngine {
            graph,
            scorer: CentralityScorer::new(params)?,
        })
    }

    /// Loads the acyclic graph from `store`. The stored back edges are only
    /// needed for the adjacency listings, so they are dropped here.
    pub fn load(store: &dyn SnapshotStore, params: KatzParams) -> Result<Self, WatchError> {
        let (graph, _back_edges) = store.load_graph()?;
        Self::new(graph, params)
    }

    pub fn graph(&self) -> &CfgGraph {
        &self.graph
    }

    /// Contracts every covered node out of the graph, in batch order.
    pub fn apply_coverage(&mut self, batch: &CoverageBatch) -> ContractionReport {
        self.graph.contract_batch(batch)
    }

    /// Scores the current graph. Returns `None` when no nodes remain.
    pub fn rescore(&self) -> Result<Option<(ScoreMap, KatzRun)>, WatchError> {
        match self.scorer.score(&self.graph) {
            Ok(scored) => Ok(Some(scored)),
            Err(CoreError::EmptyGraph) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use katzgraph_core::{parse_edge_text, NodeId};
    use katzgraph_storage::InMemoryStore;

    fn engine(text: &str) -> ScoringEngine {
        let mut graph = parse_edge_text(text).unwrap();
        graph.eliminate_cycles();
        ScoringEngine::new(graph, KatzParams::default()).unwrap()
    }

    #[test]
    fn coverage_shrinks_graph_and_rescores() {
        let mut engine = engine("0 1\n1 2\n2 0\n1 3\n");
        let (before, _) = engine.rescore().unwrap().unwrap();
        assert_eq!(before.len(), 4);

        let report = engine.apply_coverage(&CoverageBatch::from_ids([NodeId(1), NodeId(1)]));
        assert_eq!(report.removed, 1);
        assert_eq!(report.missing, 1);

        let (after, run) = engine.rescore().unwrap().unwrap();
        assert!(run.converged);
        assert_eq!(after.get(NodeId(1)), None);
        assert_eq!(after.get(NodeId(0)), Some(10.0));
    }

    #[test]
    fn empty_graph_rescore_is_none() {
        let mut engine = engine("0 1\n");
        engine.apply_coverage(&CoverageBatch::from_ids([NodeId(0), NodeId(1)]));
        assert!(engine.graph().is_empty());
        assert!(engine.rescore().unwrap().is_none());
    }

    #[test]
    fn invalid_params_are_rejected() {
        let params = KatzParams {
            tolerance: 0.0,
            ..KatzParams::default()
        };
        assert!(matches!(
            ScoringEngine::new(CfgGraph::new(), params),
            Err(WatchError::Core(_))
        ));
    }

    #[test]
    fn load_from_store() {
        let mut graph = parse_edge_text("0 1\n1 0\n").unwrap();
        let back_edges = graph.eliminate_cycles();
        let mut store = InMemoryStore::new();
        store.save_graph(&graph, &back_edges).unwrap();

        let engine = ScoringEngine::load(&store, KatzParams::default()).unwrap();
        assert!(engine.graph().is_acyclic());
        assert_eq!(engine.graph().edge_count(), 1);
    }

    #[test]
    fn load_without_snapshot_fails() {
        let store = InMemoryStore::new();
        assert!(matches!(
            ScoringEngine::load(&store, KatzParams::default()),
            Err(WatchError::Storage(_))
        ));
    }
}
