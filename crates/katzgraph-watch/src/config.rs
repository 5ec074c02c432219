//! Update loop configuration.
//!
//! Read from environment variables by [`WatchConfig::from_env`]:
//! - `KATZGRAPH_WORKDIR`: directory the file names resolve against (default: ".")
//! - `KATZGRAPH_SNAPSHOT`: graph snapshot (default: "graph_data_pack")
//! - `KATZGRAPH_SIGNAL`: signal file (default: "signal")
//! - `KATZGRAPH_COVERAGE`: coverage file (default: "cur_coverage")
//! - `KATZGRAPH_OUTPUT`: published scores (default: "dyn_katz_cent")
//! - `KATZGRAPH_POLL_SECS`: poll interval in whole seconds (default: 5)

use std::path::{Path, PathBuf};
use std::time::Duration;

use katzgraph_core::KatzParams;

use crate::error::WatchError;

pub const DEFAULT_SNAPSHOT: &str = "graph_data_pack";
pub const DEFAULT_SIGNAL: &str = "signal";
pub const DEFAULT_COVERAGE: &str = "cur_coverage";
pub const DEFAULT_OUTPUT: &str = "dyn_katz_cent";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
pub struct WatchConfig {
    pub snapshot: PathBuf,
    pub signal: PathBuf,
    pub coverage: PathBuf,
    pub output: PathBuf,
    pub poll_interval: Duration,
    pub katz: KatzParams,
}

impl WatchConfig {
    /// Default file names inside `workdir`.
    pub fn in_dir(workdir: &Path) -> Self {
        WatchConfig {
            snapshot: workdir.join(DEFAULT_SNAPSHOT),
            signal: workdir.join(DEFAULT_SIGNAL),
            coverage: workdir.join(DEFAULT_COVERAGE),
            output: workdir.join(DEFAULT_OUTPUT),
            poll_interval: DEFAULT_POLL_INTERVAL,
            katz: KatzParams::default(),
        }
    }

    pub fn from_env() -> Result<Self, WatchError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, WatchError> {
        let workdir = PathBuf::from(lookup("KATZGRAPH_WORKDIR").unwrap_or_else(|| ".".to_string()));
        let file = |key: &str, default: &str| -> Result<PathBuf, WatchError> {
            match lookup(key) {
                Some(value) if value.trim().is_empty() => Err(WatchError::Config {
                    key: key.to_string(),
                    reason: "empty path".to_string(),
                }),
                // an absolute value replaces the workdir on join
                Some(value) => Ok(workdir.join(value)),
                None => Ok(workdir.join(default)),
            }
        };

        let poll_interval = match lookup("KATZGRAPH_POLL_SECS") {
            None => DEFAULT_POLL_INTERVAL,
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|e| WatchError::Config {
                    key: "KATZGRAPH_POLL_SECS".to_string(),
                    reason: format!("{raw:?}: {e}"),
                })?;
                if secs == 0 {
                    return Err(WatchError::Config {
                        key: "KATZGRAPH_POLL_SECS".to_string(),
                        reason: "must be at least 1".to_string(),
                    });
                }
                Duration::from_secs(secs)
            }
        };

        Ok(WatchConfig {
            snapshot: file("KATZGRAPH_SNAPSHOT", DEFAULT_SNAPSHOT)?,
            signal: file("KATZGRAPH_SIGNAL", DEFAULT_SIGNAL)?,
            coverage: file("KATZGRAPH_COVERAGE", DEFAULT_COVERAGE)?,
            output: file("KATZGRAPH_OUTPUT", DEFAULT_OUTPUT)?,
            poll_interval,
            katz: KatzParams::default(),
        })
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self::in_dir(Path::new("."))
    }
}
