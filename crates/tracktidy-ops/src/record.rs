//! Operation identity, status, and record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::result::{FileOutcome, OperationSummary};

/// Identifier for one submitted job. Ids are monotonic within a process
/// and never reused; records are in-memory only, so that is sufficient.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct OperationId(pub u64);

impl std::fmt::Display for OperationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "op-{}", self.0)
    }
}

/// Lifecycle state of an operation.
///
/// `Running` transitions exactly once, to one of the terminal states.
/// Terminal records persist until explicitly cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum OperationStatus {
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl OperationStatus {
    /// Whether the operation has reached a final state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// The status/result container for one in-flight or finished job.
///
/// Owned by the operation manager and mutated only under its lock;
/// callers receive cloned snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRecord {
    pub id: OperationId,
    pub status: OperationStatus,
    /// Files processed so far. Monotonic, never exceeds `total`.
    pub progress: usize,
    /// Files enumerated for this job (0 until enumeration finishes).
    pub total: usize,
    /// Name of the most recently completed file.
    pub current: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Per-file results in completion order.
    pub results: Vec<FileOutcome>,
    /// Top-level failure message when `status` is `Failed`.
    pub error: Option<String>,
    /// Whether cancellation has been requested.
    pub cancel_requested: bool,
}

impl OperationRecord {
    /// Create a fresh running record.
    pub fn new(id: OperationId) -> Self {
        Self {
            id,
            status: OperationStatus::Running,
            progress: 0,
            total: 0,
            current: None,
            started_at: Utc::now(),
            finished_at: None,
            results: Vec::new(),
            error: None,
            cancel_requested: false,
        }
    }

    /// Aggregate outcome counts over the result list.
    pub fn summary(&self) -> OperationSummary {
        OperationSummary::from_results(&self.results)
    }

    /// Progress as a percentage (0.0 to 100.0).
    pub fn percentage(&self) -> f64 {
        if self.total > 0 {
            (self.progress as f64 / self.total as f64) * 100.0
        } else {
            0.0
        }
    }
}
