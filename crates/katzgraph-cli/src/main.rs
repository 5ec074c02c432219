//! katzgraph command-line tools.
//!
//! Provides the `katzgraph` binary:
//! - `build` runs the initial pass: read the CFG (from an instrumented
//!   binary's `.cfg-` section or a plain edge-list file), break cycles,
//!   persist the snapshot the update loop starts from, and write the static
//!   centrality and adjacency files.
//! - `stats` summarizes a stored snapshot.
//!
//! Both print a JSON summary to stdout. Exit codes: 0 = success,
//! 1 = input error, 3 = I/O or storage error.

mod section;

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use serde_json::json;

use katzgraph_core::{parse_edge_list, AdjacencyListing, CentralityScorer, KatzParams};
use katzgraph_storage::convert::recompose;
use katzgraph_storage::{open_store, publish_listing, publish_scores, ListingPaths, SnapshotSummary};

use crate::section::extract_cfg_section;

/// Katz-centrality block scoring for coverage-guided fuzzing.
#[derive(Parser)]
#[command(name = "katzgraph", about = "Katz-centrality block scoring for coverage-guided fuzzing")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the graph snapshot and the initial score and adjacency files.
    Build {
        /// Instrumented ELF binary carrying a `.cfg-` section.
        #[arg(required_unless_present = "edges", conflicts_with = "edges")]
        binary: Option<PathBuf>,

        /// Read the edge list from a text file instead of a binary.
        #[arg(short, long)]
        edges: Option<PathBuf>,

        /// Graph snapshot for the update loop (`.db`/`.sqlite` for SQLite).
        #[arg(short, long, default_value = "graph_data_pack")]
        snapshot: PathBuf,

        /// Static centrality output.
        #[arg(short, long, default_value = "katz_cent")]
        katz: PathBuf,

        /// Child adjacency output.
        #[arg(short, long, default_value = "child_node")]
        children: PathBuf,

        /// Parent adjacency output.
        #[arg(short, long, default_value = "parent_node")]
        parents: PathBuf,

        /// Border edge output.
        #[arg(short, long, default_value = "border_edges")]
        border: PathBuf,
    },

    /// Print node, edge and back-edge counts of a stored snapshot.
    Stats {
        /// Snapshot path.
        snapshot: PathBuf,
    },
}

/// Output locations for one `build` run.
struct BuildOutputs {
    snapshot: PathBuf,
    katz: PathBuf,
    listing: ListingPaths,
}

/// Where the edge list comes from.
enum CfgSource {
    Binary(PathBuf),
    EdgeFile(PathBuf),
}

fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Build {
            binary,
            edges,
            snapshot,
            katz,
            children,
            parents,
            border,
        } => {
            let source = match (binary, edges) {
                (_, Some(edges)) => CfgSource::EdgeFile(edges),
                (Some(binary), None) => CfgSource::Binary(binary),
                // clap enforces one of the two
                (None, None) => {
                    eprintln!("Error: expected a binary or --edges");
                    process::exit(1);
                }
            };
            let outputs = BuildOutputs {
                snapshot,
                katz,
                listing: ListingPaths {
                    children,
                    parents,
                    border_edges: border,
                },
            };
            run_build(&source, &outputs)
        }
        Commands::Stats { snapshot } => run_stats(&snapshot),
    };
    process::exit(exit_code);
}

/// Reads the raw edge-list bytes from `source`.
fn read_edges(source: &CfgSource) -> Result<Vec<u8>, i32> {
    match source {
        CfgSource::EdgeFile(path) => fs::read(path).map_err(|e| {
            eprintln!("Error: failed to read '{}': {}", path.display(), e);
            3
        }),
        CfgSource::Binary(path) => {
            let binary = fs::read(path).map_err(|e| {
                eprintln!("Error: failed to read '{}': {}", path.display(), e);
                3
            })?;
            match extract_cfg_section(&binary) {
                Ok(section) => {
                    tracing::info!(section = %section.name, bytes = section.data.len(), "found CFG section");
                    Ok(section.data.to_vec())
                }
                Err(e) => {
                    eprintln!("Error: {}: {}", path.display(), e);
                    Err(1)
                }
            }
        }
    }
}

/// Execute the build subcommand.
fn run_build(source: &CfgSource, outputs: &BuildOutputs) -> i32 {
    let bytes = match read_edges(source) {
        Ok(bytes) => bytes,
        Err(code) => return code,
    };

    let mut graph = match parse_edge_list(&bytes) {
        Ok(graph) => graph,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let back_edges = graph.eliminate_cycles();
    tracing::info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        back_edges = back_edges.len(),
        "built acyclic graph"
    );

    let saved = open_store(&outputs.snapshot).and_then(|mut store| store.save_graph(&graph, &back_edges));
    if let Err(e) = saved {
        eprintln!(
            "Error: failed to save snapshot '{}': {}",
            outputs.snapshot.display(),
            e
        );
        return 3;
    }

    let mut iterations = 0;
    let mut converged = true;
    if graph.is_empty() {
        tracing::warn!("graph is empty, skipping centrality output");
    } else {
        let scored = CentralityScorer::new(KatzParams::default()).and_then(|scorer| scorer.score(&graph));
        let (scores, run) = match scored {
            Ok(scored) => scored,
            Err(e) => {
                eprintln!("Error: scoring failed: {}", e);
                return 1;
            }
        };
        if !run.converged {
            tracing::warn!(iterations = run.iterations, "centrality did not converge");
        }
        iterations = run.iterations;
        converged = run.converged;
        if let Err(e) = publish_scores(&outputs.katz, &scores) {
            eprintln!("Error: failed to write '{}': {}", outputs.katz.display(), e);
            return 3;
        }
    }

    let listing = AdjacencyListing::with_back_edges(&graph, &back_edges);
    if let Err(e) = publish_listing(&outputs.listing, &listing) {
        eprintln!("Error: failed to write adjacency files: {}", e);
        return 3;
    }

    let summary = json!({
        "nodes": graph.node_count(),
        "edges": graph.edge_count(),
        "back_edges": back_edges.len(),
        "border_edges": listing.border_edges().len(),
        "iterations": iterations,
        "converged": converged,
        "snapshot": outputs.snapshot.display().to_string(),
    });
    print_json(&summary);
    0
}

/// Execute the stats subcommand.
fn run_stats(path: &Path) -> i32 {
    let snapshot = match open_store(path).and_then(|store| store.load()) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            eprintln!("Error: failed to load snapshot '{}': {}", path.display(), e);
            return 3;
        }
    };
    let summary = SnapshotSummary::from(&snapshot);
    let graph = match recompose(snapshot) {
        Ok((graph, _)) => graph,
        Err(e) => {
            eprintln!("Error: snapshot '{}' is inconsistent: {}", path.display(), e);
            return 3;
        }
    };

    print_json(&json!({
        "nodes": summary.nodes,
        "edges": summary.edges,
        "back_edges": summary.back_edges,
        "acyclic": graph.is_acyclic(),
    }));
    0
}

fn print_json(value: &serde_json::Value) {
    let text = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize summary: {}\"}}", e));
    println!("{}", text);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outputs(dir: &Path) -> BuildOutputs {
        BuildOutputs {
            snapshot: dir.join("graph_data_pack"),
            katz: dir.join("katz_cent"),
            listing: ListingPaths::in_dir(dir),
        }
    }

    #[test]
    fn build_from_edge_file_writes_every_output() {
        let dir = tempfile::tempdir().unwrap();
        let edges = dir.path().join("cfg.txt");
        fs::write(&edges, "0 1\n1 2\n2 0\n1 3\n").unwrap();
        let outputs = outputs(dir.path());

        assert_eq!(run_build(&CfgSource::EdgeFile(edges), &outputs), 0);
        assert_eq!(
            fs::read_to_string(&outputs.katz).unwrap(),
            "1 10\n2 10\n3 5.0\n4 5.0\n"
        );
        // back edge 2 -> 0 reappears in the listings
        assert_eq!(
            fs::read_to_string(&outputs.listing.children).unwrap(),
            "1 2\n2 3 4\n3 1\n4\n"
        );
        assert_eq!(
            fs::read_to_string(&outputs.listing.border_edges).unwrap(),
            "2 3\n2 4\n"
        );
        assert_eq!(run_stats(&outputs.snapshot), 0);
    }

    #[test]
    fn malformed_edges_exit_with_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let edges = dir.path().join("cfg.txt");
        fs::write(&edges, "0 1\n1\n").unwrap();
        let outputs = outputs(dir.path());

        assert_eq!(run_build(&CfgSource::EdgeFile(edges), &outputs), 1);
        assert!(!outputs.snapshot.exists());
    }

    #[test]
    fn missing_input_exits_with_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = CfgSource::Binary(dir.path().join("absent"));
        assert_eq!(run_build(&source, &outputs(dir.path())), 3);
    }

    #[test]
    fn binary_without_cfg_section_is_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let binary = dir.path().join("prog");
        fs::write(&binary, b"not an elf file at all, only text").unwrap();
        assert_eq!(run_build(&CfgSource::Binary(binary), &outputs(dir.path())), 1);
    }

    #[test]
    fn stats_on_missing_snapshot_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(run_stats(&dir.path().join("graph_data_pack")), 3);
    }
}
