//! Output files consumed by the fuzzer.
//!
//! Every file speaks instrumentation ids (internal id + 1), one record per
//! line:
//!
//! - centrality: `<id> <score>`, see [`format_score`]
//! - children / parents: `<id> <neighbor> <neighbor> ...`
//! - border edges: `<parent> <child>`
//!
//! All writes go through [`write_atomic`]: the content lands in a temporary
//! file in the destination directory and is renamed over the target, so
//! the fuzzer never reads a partial file.

use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use katzgraph_core::{AdjacencyListing, NodeId, ScoreMap, SCORE_CEILING};

use crate::error::StorageError;

/// Replaces `path` with `contents` in one rename.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StorageError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StorageError::Io(e.error))?;
    Ok(())
}

// ---- rendering ----

/// Formats a published score the way the fuzzer's score files spell it.
///
/// The ceiling is an integer (`10`). Every other score uses the shortest
/// round-trip digits, always with a fractional part in positional form
/// (`5.0`, `0.0001`), switching to exponent form with a signed two-digit
/// exponent when the decimal point falls outside `(-4, 16]`
/// (`1e-05`, `2.5e-07`).
pub fn format_score(score: f64) -> String {
    if score == SCORE_CEILING {
        return format!("{SCORE_CEILING}");
    }
    if score == 0.0 {
        return "0.0".to_string();
    }

    // `{:e}` yields the shortest round-trip digits, e.g. `6.25e-3`.
    let sci = format!("{:e}", score.abs());
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let sign = if score < 0.0 { "-" } else { "" };
    // position of the decimal point relative to the first digit
    let point = exponent + 1;

    if point <= -4 || point > 16 {
        let (lead, rest) = digits.split_at(1);
        let fraction = if rest.is_empty() {
            String::new()
        } else {
            format!(".{rest}")
        };
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        return format!("{sign}{lead}{fraction}e{exp_sign}{:02}", exponent.abs());
    }

    let len = digits.len() as i32;
    if point <= 0 {
        let zeros = "0".repeat((-point) as usize);
        format!("{sign}0.{zeros}{digits}")
    } else if point >= len {
        let zeros = "0".repeat((point - len) as usize);
        format!("{sign}{digits}{zeros}.0")
    } else {
        let (int, frac) = digits.split_at(point as usize);
        format!("{sign}{int}.{frac}")
    }
}

/// Renders one `<id> <score>` line per node, in ascending id order.
pub fn render_scores(scores: &ScoreMap) -> String {
    let mut out = String::with_capacity(scores.len() * 24);
    for (id, score) in scores.iter() {
        let _ = writeln!(out, "{} {}", id.instrumentation_id(), format_score(score));
    }
    out
}

fn render_lists<'a>(lists: impl Iterator<Item = (NodeId, &'a [NodeId])>) -> String {
    let mut out = String::new();
    for (id, neighbors) in lists {
        let _ = write!(out, "{}", id.instrumentation_id());
        for neighbor in neighbors {
            let _ = write!(out, " {}", neighbor.instrumentation_id());
        }
        out.push('\n');
    }
    out
}

pub fn render_children(listing: &AdjacencyListing) -> String {
    render_lists(listing.children())
}

pub fn render_parents(listing: &AdjacencyListing) -> String {
    render_lists(listing.parents())
}

pub fn render_border_edges(edges: &[(NodeId, NodeId)]) -> String {
    let mut out = String::new();
    for (parent, child) in edges {
        let _ = writeln!(
            out,
            "{} {}",
            parent.instrumentation_id(),
            child.instrumentation_id()
        );
    }
    out
}

// ---- publishing ----

pub fn publish_scores(path: &Path, scores: &ScoreMap) -> Result<(), StorageError> {
    write_atomic(path, render_scores(scores).as_bytes())
}

/// Destinations for the adjacency files written by `katzgraph build`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPaths {
    pub children: PathBuf,
    pub parents: PathBuf,
    pub border_edges: PathBuf,
}

impl ListingPaths {
    /// The default file names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        ListingPaths {
            children: dir.join("child_node"),
            parents: dir.join("parent_node"),
            border_edges: dir.join("border_edges"),
        }
    }
}

/// Writes the children, parents and border-edge files for `listing`.
pub fn publish_listing(paths: &ListingPaths, listing: &AdjacencyListing) -> Result<(), StorageError> {
    write_atomic(&paths.children, render_children(listing).as_bytes())?;
    write_atomic(&paths.parents, render_parents(listing).as_bytes())?;
    write_atomic(
        &paths.border_edges,
        render_border_edges(&listing.border_edges()).as_bytes(),
    )?;
    Ok(())
}
