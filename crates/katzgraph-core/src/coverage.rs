//! Coverage batches reported by the fuzzer.

use crate::id::NodeId;

/// Node ids reported as newly executed since the previous update, in the
/// order they were reported.
///
/// Duplicates and ids unknown to the graph are kept; contraction ignores
/// them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageBatch {
    ids: Vec<NodeId>,
    skipped: usize,
}

impl CoverageBatch {
    /// Builds a batch from already zero-based ids.
    pub fn from_ids(ids: impl IntoIterator<Item = NodeId>) -> Self {
        CoverageBatch {
            ids: ids.into_iter().collect(),
            skipped: 0,
        }
    }

    /// Parses the coverage channel: whitespace-separated 1-based
    /// instrumentation ids.
    ///
    /// Tokens that are not a positive integer within range are skipped and
    /// counted in [`CoverageBatch::skipped`].
    pub fn parse(text: &str) -> Self {
        let mut ids = Vec::new();
        let mut skipped = 0;
        for token in text.split_whitespace() {
            match token.parse::<u64>().ok().and_then(NodeId::from_instrumentation) {
                Some(id) => ids.push(id),
                None => skipped += 1,
            }
        }
        CoverageBatch { ids, skipped }
    }

    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of tokens dropped while parsing.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}
