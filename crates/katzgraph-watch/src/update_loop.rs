//! The polling update loop.
//!
//! Two states: [`LoopState::Idle`] while no request is outstanding, and
//! [`LoopState::Rescoring`] from the moment a raised signal is seen until
//! the new scores are published and the signal is lowered. A pass that
//! fails leaves the signal raised and the loop in `Rescoring`, so the next
//! poll retries it; contraction is idempotent, so the retry re-applies the
//! same batch harmlessly. A raised signal whose coverage cannot be read is
//! left untouched until the coverage becomes readable.

use std::path::PathBuf;
use std::time::Duration;

use katzgraph_core::{ContractionReport, KatzRun};
use katzgraph_storage::{open_store, publish_scores};
use tokio::time::MissedTickBehavior;

use crate::config::WatchConfig;
use crate::engine::ScoringEngine;
use crate::error::WatchError;
use crate::mailbox::{FileMailbox, Mailbox};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Rescoring,
}

/// What a single poll did.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// No request was outstanding, or its coverage could not be read yet.
    Idle,
    /// The batch was applied and new scores were published.
    Published(PassSummary),
    /// The batch emptied the graph; nothing was published but the request
    /// was acknowledged.
    SkippedEmpty(ContractionReport),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassSummary {
    pub contraction: ContractionReport,
    pub skipped_tokens: usize,
    pub nodes: usize,
    pub run: KatzRun,
}

pub struct UpdateLoop<M> {
    engine: ScoringEngine,
    mailbox: M,
    output: PathBuf,
    state: LoopState,
    passes: u64,
}

impl UpdateLoop<FileMailbox> {
    /// Loads the snapshot and wires up the file mailbox named in `config`.
    pub fn from_config(config: &WatchConfig) -> Result<Self, WatchError> {
        let store = open_store(&config.snapshot)?;
        let engine = ScoringEngine::load(store.as_ref(), config.katz)?;
        tracing::info!(
            snapshot = %config.snapshot.display(),
            nodes = engine.graph().node_count(),
            edges = engine.graph().edge_count(),
            "loaded graph snapshot"
        );
        let mailbox = FileMailbox::new(&config.signal, &config.coverage);
        Ok(UpdateLoop::new(engine, mailbox, config.output.clone()))
    }
}

impl<M: Mailbox> UpdateLoop<M> {
    pub fn new(engine: ScoringEngine, mailbox: M, output: PathBuf) -> Self {
        UpdateLoop {
            engine,
            mailbox,
            output,
            state: LoopState::Idle,
            passes: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    /// Number of completed passes, published or skipped.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Checks the signal once and runs a pass if it is raised.
    pub fn poll_once(&mut self) -> Result<PollOutcome, WatchError> {
        if !self.mailbox.signal_raised() {
            tracing::debug!("no rescoring request");
            return Ok(PollOutcome::Idle);
        }
        let Some(batch) = self.mailbox.take_coverage() else {
            return Ok(PollOutcome::Idle);
        };
        self.state = LoopState::Rescoring;

        if batch.skipped() > 0 {
            tracing::warn!(skipped = batch.skipped(), "ignored malformed coverage tokens");
        }
        let contraction = self.engine.apply_coverage(&batch);

        let outcome = match self.engine.rescore()? {
            Some((scores, run)) => {
                if !run.converged {
                    tracing::warn!(
                        iterations = run.iterations,
                        "centrality did not converge, publishing last iterate"
                    );
                }
                publish_scores(&self.output, &scores)?;
                PollOutcome::Published(PassSummary {
                    contraction,
                    skipped_tokens: batch.skipped(),
                    nodes: scores.len(),
                    run,
                })
            }
            None => {
                tracing::warn!("graph is empty, skipping publication");
                PollOutcome::SkippedEmpty(contraction)
            }
        };

        self.mailbox.acknowledge()?;
        self.state = LoopState::Idle;
        self.passes += 1;

        if let PollOutcome::Published(summary) = &outcome {
            tracing::info!(
                pass = self.passes,
                covered = contraction.requested,
                removed = contraction.removed,
                bridged = contraction.bridged,
                nodes = summary.nodes,
                iterations = summary.run.iterations,
                "published new scores"
            );
        }
        Ok(outcome)
    }

    /// Polls every `poll_interval` forever. Errors are logged and the
    /// request is retried on the next tick.
    pub async fn run(&mut self, poll_interval: Duration) {
        let mut tick = tokio::time::interval(poll_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tick.tick().await;
            if let Err(e) = self.poll_once() {
                tracing::error!(error = %e, "rescoring pass failed, will retry");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use katzgraph_core::{parse_edge_text, CoverageBatch, KatzParams, NodeId};

    /// In-process mailbox for driving the state machine without files.
    #[derive(Default)]
    struct SlotMailbox {
        raised: bool,
        coverage: Option<Vec<NodeId>>,
        acks: usize,
    }

    impl Mailbox for SlotMailbox {
        fn signal_raised(&self) -> bool {
            self.raised
        }

        fn take_coverage(&self) -> Option<CoverageBatch> {
            self.coverage
                .as_ref()
                .map(|ids| CoverageBatch::from_ids(ids.iter().copied()))
        }

        fn acknowledge(&mut self) -> Result<(), WatchError> {
            self.raised = false;
            self.acks += 1;
            Ok(())
        }
    }

    fn update_loop(dir: &std::path::Path, text: &str) -> UpdateLoop<SlotMailbox> {
        let mut graph = parse_edge_text(text).unwrap();
        graph.eliminate_cycles();
        let engine = ScoringEngine::new(graph, KatzParams::default()).unwrap();
        UpdateLoop::new(engine, SlotMailbox::default(), dir.join("dyn_katz_cent"))
    }

    #[test]
    fn idle_without_signal() {
        let dir = tempfile::tempdir().unwrap();
        let mut update_loop = update_loop(dir.path(), "0 1\n");
        assert_eq!(update_loop.poll_once().unwrap(), PollOutcome::Idle);
        assert_eq!(update_loop.state(), LoopState::Idle);
        assert_eq!(update_loop.passes(), 0);
        assert!(!dir.path().join("dyn_katz_cent").exists());
    }

    #[test]
    fn raised_signal_runs_one_pass() {
        let dir = tempfile::tempdir().unwrap();
        let mut update_loop = update_loop(dir.path(), "0 1\n1 2\n2 0\n1 3\n");
        update_loop.mailbox.raised = true;
        update_loop.mailbox.coverage = Some(vec![NodeId(1)]);

        let PollOutcome::Published(summary) = update_loop.poll_once().unwrap() else {
            panic!("expected a published pass");
        };
        assert_eq!(summary.contraction.removed, 1);
        assert_eq!(summary.nodes, 3);
        assert_eq!(update_loop.state(), LoopState::Idle);
        assert_eq!(update_loop.mailbox.acks, 1);

        // signal lowered: the next poll does nothing
        assert_eq!(update_loop.poll_once().unwrap(), PollOutcome::Idle);
        assert_eq!(update_loop.passes(), 1);
    }

    #[test]
    fn unreadable_coverage_leaves_request_outstanding() {
        let dir = tempfile::tempdir().unwrap();
        let mut update_loop = update_loop(dir.path(), "0 1\n");
        update_loop.mailbox.raised = true;

        assert_eq!(update_loop.poll_once().unwrap(), PollOutcome::Idle);
        assert!(update_loop.mailbox.raised);
        assert_eq!(update_loop.mailbox.acks, 0);
        assert_eq!(update_loop.state(), LoopState::Idle);

        // once coverage shows up the same request goes through
        update_loop.mailbox.coverage = Some(vec![NodeId(1)]);
        assert!(matches!(update_loop.poll_once().unwrap(), PollOutcome::Published(_)));
        assert_eq!(update_loop.mailbox.acks, 1);
    }

    #[test]
    fn publish_failure_keeps_request_outstanding() {
        let dir = tempfile::tempdir().unwrap();
        let mut update_loop = update_loop(dir.path(), "0 1\n");
        update_loop.output = dir.path().join("missing-dir").join("dyn_katz_cent");
        update_loop.mailbox.raised = true;
        update_loop.mailbox.coverage = Some(Vec::new());

        assert!(matches!(update_loop.poll_once(), Err(WatchError::Storage(_))));
        assert_eq!(update_loop.state(), LoopState::Rescoring);
        assert!(update_loop.mailbox.raised);
        assert_eq!(update_loop.mailbox.acks, 0);
    }
}
