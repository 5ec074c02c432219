//! End-to-end tests for the update loop over real files.
//!
//! Each test builds a snapshot in a fresh temp directory the way
//! `katzgraph build` does, then plays the fuzzer's side of the mailbox by
//! writing the coverage and signal files directly.

use std::fs;
use std::path::Path;
use std::time::Duration;

use katzgraph_core::{parse_edge_text, NodeId};
use katzgraph_storage::{JsonFileStore, SnapshotStore};
use katzgraph_watch::{LoopState, PollOutcome, UpdateLoop, WatchConfig};

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// CFG with a 0 -> 1 -> 2 -> 0 loop and a side exit 1 -> 3.
const CFG: &str = "0 1\n1 2\n2 0\n1 3\n";

fn setup(dir: &Path, cfg: &str) -> WatchConfig {
    let config = WatchConfig::in_dir(dir);
    let mut graph = parse_edge_text(cfg).unwrap();
    let back_edges = graph.eliminate_cycles();
    JsonFileStore::new(&config.snapshot)
        .save_graph(&graph, &back_edges)
        .unwrap();
    config
}

/// Posts a request the way the fuzzer does: coverage first, then signal.
fn post(config: &WatchConfig, coverage: &str) {
    fs::write(&config.coverage, coverage).unwrap();
    fs::write(&config.signal, "1\n").unwrap();
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn missing_mailbox_files_mean_idle() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path(), CFG);
    let mut update_loop = UpdateLoop::from_config(&config).unwrap();

    assert_eq!(update_loop.poll_once().unwrap(), PollOutcome::Idle);
    assert!(!config.output.exists());
    assert!(!config.signal.exists());
}

#[test]
fn raised_signal_without_coverage_is_not_acknowledged() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path(), CFG);
    let mut update_loop = UpdateLoop::from_config(&config).unwrap();

    fs::write(&config.signal, "1\n").unwrap();
    assert_eq!(update_loop.poll_once().unwrap(), PollOutcome::Idle);
    assert_eq!(read(&config.signal), "1\n");
    assert!(!config.output.exists());
    assert_eq!(update_loop.passes(), 0);

    // the fuzzer's coverage lands late; the pending request is served
    fs::write(&config.coverage, "2\n").unwrap();
    assert!(matches!(update_loop.poll_once().unwrap(), PollOutcome::Published(_)));
    assert_eq!(read(&config.signal), "0\n");
    assert!(!update_loop.engine().graph().contains_node(NodeId(1)));
}

#[test]
fn covered_block_is_contracted_and_scores_republished() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path(), CFG);
    let mut update_loop = UpdateLoop::from_config(&config).unwrap();

    // instrumentation id 2 is internal node 1
    post(&config, "2\n");
    let outcome = update_loop.poll_once().unwrap();
    assert!(matches!(outcome, PollOutcome::Published(_)));

    // 0 now reaches 2 and 3 directly with weight 2
    let graph = update_loop.engine().graph();
    assert_eq!(graph.weight(NodeId(0), NodeId(2)), Some(2.0));
    assert_eq!(graph.weight(NodeId(0), NodeId(3)), Some(2.0));

    assert_eq!(
        read(&config.output),
        "1 10\n3 6.66666666666667\n4 6.66666666666667\n"
    );
    assert_eq!(read(&config.signal), "0\n");
    assert_eq!(update_loop.state(), LoopState::Idle);
}

#[test]
fn first_pass_with_empty_batch_publishes_initial_scores() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path(), CFG);
    let mut update_loop = UpdateLoop::from_config(&config).unwrap();

    post(&config, "");
    update_loop.poll_once().unwrap();
    assert_eq!(read(&config.output), "1 10\n2 10\n3 5.0\n4 5.0\n");
}

#[test]
fn repeated_request_with_same_coverage_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path(), CFG);
    let mut update_loop = UpdateLoop::from_config(&config).unwrap();

    post(&config, "2\n");
    update_loop.poll_once().unwrap();
    let first = read(&config.output);

    // same batch again: every id is already gone
    post(&config, "2\n");
    let PollOutcome::Published(summary) = update_loop.poll_once().unwrap() else {
        panic!("expected a published pass");
    };
    assert_eq!(summary.contraction.removed, 0);
    assert_eq!(summary.contraction.missing, 1);
    assert_eq!(read(&config.output), first);
    assert_eq!(update_loop.passes(), 2);
}

#[test]
fn unknown_and_malformed_coverage_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path(), CFG);
    let mut update_loop = UpdateLoop::from_config(&config).unwrap();

    post(&config, "99 junk 0\n");
    let PollOutcome::Published(summary) = update_loop.poll_once().unwrap() else {
        panic!("expected a published pass");
    };
    assert_eq!(summary.skipped_tokens, 2);
    assert_eq!(summary.contraction.missing, 1);
    assert_eq!(summary.nodes, 4);
}

#[test]
fn emptied_graph_acknowledges_without_publishing() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path(), "0 1\n");
    let mut update_loop = UpdateLoop::from_config(&config).unwrap();

    post(&config, "1 2\n");
    let outcome = update_loop.poll_once().unwrap();
    assert!(matches!(outcome, PollOutcome::SkippedEmpty(report) if report.removed == 2));
    assert!(!config.output.exists());
    assert_eq!(read(&config.signal), "0\n");
}

#[test]
fn missing_snapshot_fails_startup() {
    let dir = tempfile::tempdir().unwrap();
    let config = WatchConfig::in_dir(dir.path());
    assert!(UpdateLoop::from_config(&config).is_err());
}

#[tokio::test(start_paused = true)]
async fn run_loop_picks_up_signal_on_next_tick() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path(), CFG);
    let mut update_loop = UpdateLoop::from_config(&config).unwrap();
    post(&config, "2\n");

    // the loop never returns on its own
    let stopped = tokio::time::timeout(
        Duration::from_secs(12),
        update_loop.run(Duration::from_secs(5)),
    )
    .await;
    assert!(stopped.is_err());

    assert_eq!(read(&config.signal), "0\n");
    assert_eq!(update_loop.passes(), 1);
    assert!(read(&config.output).starts_with("1 10\n"));
}
