//! Persistence and publication for katzgraph.
//!
//! Provides the [`SnapshotStore`] trait with three backends
//! ([`JsonFileStore`], [`SqliteStore`], [`InMemoryStore`]) for the graph
//! snapshot written by `katzgraph build` and loaded by the update loop, and
//! the [`publish`] functions that write the fuzzer-facing output files.
//!
//! # Modules
//!
//! - [`error`]: StorageError enum with all failure modes
//! - [`types`]: GraphSnapshot and its stored envelope
//! - [`convert`]: CfgGraph decompose/recompose functions
//! - [`hash`]: blake3 snapshot digests
//! - [`traits`]: SnapshotStore trait and backend selection
//! - [`file`], [`memory`], [`sqlite`]: backends
//! - [`schema`]: SQLite migrations
//! - [`publish`]: output rendering and atomic writes

pub mod convert;
pub mod error;
pub mod file;
pub mod hash;
pub mod memory;
pub mod publish;
pub mod schema;
pub mod sqlite;
pub mod traits;
pub mod types;

pub use error::StorageError;
pub use file::JsonFileStore;
pub use memory::InMemoryStore;
pub use publish::{publish_listing, publish_scores, write_atomic, ListingPaths};
pub use sqlite::SqliteStore;
pub use traits::{open_store, SnapshotStore};
pub use types::{GraphSnapshot, SnapshotSummary};
