//! The katzgraph update loop.
//!
//! Watches the signal file shared with the fuzzer, contracts newly covered
//! blocks out of the live graph, rescores it, and republishes the dynamic
//! centrality file. The `katzgraph-watch` binary wires this up from
//! environment configuration.

pub mod config;
pub mod engine;
pub mod error;
pub mod mailbox;
pub mod update_loop;

pub use config::WatchConfig;
pub use engine::ScoringEngine;
pub use error::WatchError;
pub use mailbox::{FileMailbox, Mailbox};
pub use update_loop::{LoopState, PassSummary, PollOutcome, UpdateLoop};
