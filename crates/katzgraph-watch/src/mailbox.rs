//! Single-slot mailbox shared with the fuzzer.
//!
//! The fuzzer writes covered ids to the coverage file, then raises the
//! signal. The loop drains the coverage, publishes, and acknowledges by
//! lowering the signal. The fuzzer must not post again until it sees the
//! acknowledgement, so at most one request is ever outstanding.

use std::fs;
use std::path::{Path, PathBuf};

use katzgraph_core::CoverageBatch;
use katzgraph_storage::write_atomic;

use crate::error::WatchError;

/// Exact content of a raised signal.
pub const SIGNAL_RAISED: &str = "1\n";
/// Exact content written on acknowledgement.
pub const SIGNAL_CLEARED: &[u8] = b"0\n";

/// The producer/consumer channel the update loop polls.
pub trait Mailbox {
    /// Whether a rescoring pass has been requested. Any failure to read the
    /// signal counts as "not yet".
    fn signal_raised(&self) -> bool;

    /// Reads the posted coverage. `None` if the channel is missing or
    /// unreadable; the request then stays outstanding.
    fn take_coverage(&self) -> Option<CoverageBatch>;

    /// Lowers the signal.
    fn acknowledge(&mut self) -> Result<(), WatchError>;
}

/// [`Mailbox`] backed by the signal and coverage files.
#[derive(Debug, Clone)]
pub struct FileMailbox {
    signal: PathBuf,
    coverage: PathBuf,
}

impl FileMailbox {
    pub fn new(signal: impl Into<PathBuf>, coverage: impl Into<PathBuf>) -> Self {
        FileMailbox {
            signal: signal.into(),
            coverage: coverage.into(),
        }
    }

    pub fn signal_path(&self) -> &Path {
        &self.signal
    }
}

impl Mailbox for FileMailbox {
    fn signal_raised(&self) -> bool {
        match fs::read_to_string(&self.signal) {
            Ok(text) => text == SIGNAL_RAISED,
            Err(e) => {
                tracing::debug!(path = %self.signal.display(), error = %e, "signal not readable");
                false
            }
        }
    }

    fn take_coverage(&self) -> Option<CoverageBatch> {
        match fs::read_to_string(&self.coverage) {
            Ok(text) => Some(CoverageBatch::parse(&text)),
            Err(e) => {
                tracing::warn!(
                    path = %self.coverage.display(),
                    error = %e,
                    "coverage not readable, leaving request outstanding"
                );
                None
            }
        }
    }

    fn acknowledge(&mut self) -> Result<(), WatchError> {
        write_atomic(&self.signal, SIGNAL_CLEARED)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use katzgraph_core::NodeId;

    fn mailbox(dir: &Path) -> FileMailbox {
        FileMailbox::new(dir.join("signal"), dir.join("cur_coverage"))
    }

    #[test]
    fn missing_files_are_idle_and_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mailbox = mailbox(dir.path());
        assert!(!mailbox.signal_raised());
        assert!(mailbox.take_coverage().is_none());
    }

    #[test]
    fn signal_must_match_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let mailbox = mailbox(dir.path());
        for (content, raised) in [
            ("1\n", true),
            ("1", false),
            (" 1 \r\n", false),
            ("0\n", false),
            ("", false),
            ("11\n", false),
        ] {
            fs::write(mailbox.signal_path(), content).unwrap();
            assert_eq!(mailbox.signal_raised(), raised, "{content:?}");
        }
    }

    #[test]
    fn coverage_is_shifted_to_internal_ids() {
        let dir = tempfile::tempdir().unwrap();
        let mailbox = mailbox(dir.path());
        fs::write(dir.path().join("cur_coverage"), "3 1\n7 x\n").unwrap();

        let batch = mailbox.take_coverage().unwrap();
        assert_eq!(batch.ids(), &[NodeId(2), NodeId(0), NodeId(6)]);
        assert_eq!(batch.skipped(), 1);
        // draining does not consume the file
        assert_eq!(mailbox.take_coverage().unwrap().len(), 3);
    }

    #[test]
    fn non_utf8_coverage_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let mailbox = mailbox(dir.path());
        fs::write(dir.path().join("cur_coverage"), [0x32, 0xff, 0x0a]).unwrap();
        assert!(mailbox.take_coverage().is_none());
    }

    #[test]
    fn acknowledge_writes_cleared_signal() {
        let dir = tempfile::tempdir().unwrap();
        let mut mailbox = mailbox(dir.path());
        fs::write(mailbox.signal_path(), "1\n").unwrap();
        mailbox.acknowledge().unwrap();
        assert_eq!(fs::read_to_string(mailbox.signal_path()).unwrap(), "0\n");
        assert!(!mailbox.signal_raised());
    }
}
