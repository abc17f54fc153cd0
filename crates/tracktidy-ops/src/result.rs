//! Per-file result types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::Display;

use tracktidy_meta::ResolvedTrack;

/// What happened to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum OutcomeKind {
    /// The file was renamed (or would be, in a dry run).
    Renamed,
    /// The file already carried its desired name.
    Skipped,
    /// Processing failed; the file is untouched at its original path.
    Errored,
}

/// The immutable result of processing one file.
///
/// Created once per file and appended to the operation record in
/// completion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    /// Original path of the file.
    pub source: PathBuf,
    /// Allocated destination, when one was computed.
    pub destination: Option<PathBuf>,
    pub kind: OutcomeKind,
    /// Human-readable explanation for skips and errors.
    pub reason: Option<String>,
    /// Snapshot of the arbitrated metadata behind the decision.
    pub resolved: ResolvedTrack,
}

impl FileOutcome {
    /// Create a renamed outcome.
    pub fn renamed(source: PathBuf, destination: PathBuf, resolved: ResolvedTrack) -> Self {
        Self {
            source,
            destination: Some(destination),
            kind: OutcomeKind::Renamed,
            reason: None,
            resolved,
        }
    }

    /// Create a skipped outcome.
    pub fn skipped(source: PathBuf, reason: impl Into<String>, resolved: ResolvedTrack) -> Self {
        Self {
            source,
            destination: None,
            kind: OutcomeKind::Skipped,
            reason: Some(reason.into()),
            resolved,
        }
    }

    /// Create an errored outcome.
    pub fn errored(source: PathBuf, reason: impl Into<String>) -> Self {
        Self {
            source,
            destination: None,
            kind: OutcomeKind::Errored,
            reason: Some(reason.into()),
            resolved: ResolvedTrack::default(),
        }
    }
}

impl std::fmt::Display for FileOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.source.display())?;
        if let Some(ref dest) = self.destination {
            write!(f, " -> {}", dest.display())?;
        }
        if let Some(ref reason) = self.reason {
            write!(f, " ({reason})")?;
        }
        Ok(())
    }
}

/// Aggregate counts over a finished operation's result list.
///
/// Computed once from the final list rather than incrementally, so the
/// counts always sum to the number of results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSummary {
    pub renamed: usize,
    pub skipped: usize,
    pub errored: usize,
}

impl OperationSummary {
    /// Tally outcome kinds across a result list.
    pub fn from_results(results: &[FileOutcome]) -> Self {
        let mut summary = Self::default();
        for result in results {
            match result.kind {
                OutcomeKind::Renamed => summary.renamed += 1,
                OutcomeKind::Skipped => summary.skipped += 1,
                OutcomeKind::Errored => summary.errored += 1,
            }
        }
        summary
    }

    /// Total number of processed files.
    pub fn total(&self) -> usize {
        self.renamed + self.skipped + self.errored
    }

    /// Whether every file processed cleanly.
    pub fn is_clean(&self) -> bool {
        self.errored == 0
    }
}
