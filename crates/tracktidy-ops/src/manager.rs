//! Lifecycle management for batch rename operations.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use tracktidy_core::{RenameError, RenameJob};
use tracktidy_scan::enumerate_media;

use crate::pipeline::{MetadataProviders, PipelineContext, process_file};
use crate::record::{OperationId, OperationRecord, OperationStatus};
use crate::reservation::ReservationBook;
use crate::result::FileOutcome;
use crate::POLL_INTERVAL;

/// One tracked operation: its record plus the cancellation token its
/// orchestrator watches.
struct Entry {
    record: OperationRecord,
    cancel: CancellationToken,
}

/// Tracks every submitted job and drives each one on a background task.
///
/// The id→record map is the only state shared with callers and is always
/// accessed under one lock; critical sections are O(1). Records live
/// until explicitly cleared, never auto-expired.
#[derive(Clone)]
pub struct OperationManager {
    inner: Arc<Inner>,
}

struct Inner {
    operations: Mutex<HashMap<OperationId, Entry>>,
    providers: MetadataProviders,
    next_id: AtomicU64,
}

impl Default for OperationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationManager {
    /// Create a manager with the default providers (lofty tags, remote
    /// lookup and analysis disabled).
    pub fn new() -> Self {
        Self::with_providers(MetadataProviders::default())
    }

    /// Create a manager with custom metadata providers.
    pub fn with_providers(providers: MetadataProviders) -> Self {
        Self {
            inner: Arc::new(Inner {
                operations: Mutex::new(HashMap::new()),
                providers,
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Submit a job. Inserts a `Running` record and launches the
    /// orchestrator on a background task; returns immediately.
    ///
    /// Must be called within a tokio runtime.
    pub fn start(&self, job: RenameJob) -> OperationId {
        let id = OperationId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let cancel = CancellationToken::new();

        self.inner.lock_operations().insert(
            id,
            Entry {
                record: OperationRecord::new(id),
                cancel: cancel.clone(),
            },
        );

        tracing::info!(%id, root = %job.root.display(), dry_run = job.dry_run, "operation started");

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            run_operation(inner, id, job, cancel).await;
        });

        id
    }

    /// Snapshot an operation's record. `None` for unknown (or cleared)
    /// ids. Safe at any call rate.
    pub fn poll(&self, id: OperationId) -> Option<OperationRecord> {
        self.inner
            .lock_operations()
            .get(&id)
            .map(|entry| entry.record.clone())
    }

    /// Request cooperative cancellation. Returns whether the flag was
    /// newly set; `false` for unknown or already-terminal operations.
    pub fn cancel(&self, id: OperationId) -> bool {
        let mut operations = self.inner.lock_operations();
        let Some(entry) = operations.get_mut(&id) else {
            return false;
        };
        if entry.record.status != OperationStatus::Running || entry.record.cancel_requested {
            return false;
        }
        entry.record.cancel_requested = true;
        entry.cancel.cancel();
        tracing::info!(%id, "cancellation requested");
        true
    }

    /// Remove an operation's record. Returns whether it existed.
    ///
    /// Clearing a still-running operation also cancels it, so its
    /// orchestrator winds down at the next checkpoint.
    pub fn clear(&self, id: OperationId) -> bool {
        let removed = self.inner.lock_operations().remove(&id);
        match removed {
            Some(entry) => {
                entry.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Ids of all tracked operations.
    pub fn operation_ids(&self) -> Vec<OperationId> {
        let mut ids: Vec<_> = self.inner.lock_operations().keys().copied().collect();
        ids.sort();
        ids
    }

    /// Start a job and poll until it reaches a terminal state.
    ///
    /// Fails only if the record disappears mid-run (a concurrent
    /// `clear`).
    pub async fn run_to_completion(&self, job: RenameJob) -> Result<OperationRecord, RenameError> {
        let id = self.start(job);
        loop {
            tokio::time::sleep(POLL_INTERVAL).await;
            match self.poll(id) {
                Some(record) if record.status.is_terminal() => return Ok(record),
                Some(_) => continue,
                None => {
                    return Err(RenameError::other(format!(
                        "operation {id} was cleared while running"
                    )));
                }
            }
        }
    }
}

impl Inner {
    fn lock_operations(&self) -> MutexGuard<'_, HashMap<OperationId, Entry>> {
        self.operations.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Mutate an operation's record, if it still exists.
    fn with_record<R>(
        &self,
        id: OperationId,
        f: impl FnOnce(&mut OperationRecord) -> R,
    ) -> Option<R> {
        self.lock_operations()
            .get_mut(&id)
            .map(|entry| f(&mut entry.record))
    }
}

/// How a run ended, before the final record update.
enum RunEnd {
    Completed,
    Cancelled,
}

/// Drive one operation to a terminal state.
///
/// The record is guaranteed to leave `Running`: any error from
/// enumeration or the dispatch loop marks it `Failed` here.
async fn run_operation(
    inner: Arc<Inner>,
    id: OperationId,
    job: RenameJob,
    cancel: CancellationToken,
) {
    let end = drive(&inner, id, &job, &cancel).await;

    let now = chrono::Utc::now();
    inner.with_record(id, |record| {
        record.finished_at = Some(now);
        record.current = None;
        match &end {
            Ok(RunEnd::Completed) => {
                record.status = OperationStatus::Completed;
            }
            Ok(RunEnd::Cancelled) => {
                record.status = OperationStatus::Cancelled;
            }
            Err(error) => {
                record.status = OperationStatus::Failed;
                record.error = Some(error.to_string());
            }
        }
        tracing::info!(
            %id,
            status = %record.status,
            processed = record.results.len(),
            total = record.total,
            "operation finished"
        );
    });
}

/// Enumerate, dispatch, and drain one job's files.
async fn drive(
    inner: &Arc<Inner>,
    id: OperationId,
    job: &RenameJob,
    cancel: &CancellationToken,
) -> Result<RunEnd, RenameError> {
    let files = match job.files.clone() {
        Some(explicit) => explicit,
        None => {
            let root = job.root.clone();
            let recursive = job.recursive;
            tokio::task::spawn_blocking(move || enumerate_media(&root, recursive))
                .await
                .map_err(|e| RenameError::other(format!("enumeration task failed: {e}")))??
        }
    };

    let total = files.len();
    if inner.with_record(id, |record| record.total = total).is_none() {
        // Record cleared before dispatch ever began.
        return Ok(RunEnd::Cancelled);
    }
    tracing::debug!(%id, total, "enumeration finished");

    let book = Arc::new(ReservationBook::new());
    let mut pending = files.into_iter();
    let mut inflight: JoinSet<FileOutcome> = JoinSet::new();
    let mut exhausted = false;
    let mut cancelled = false;

    loop {
        // Cancellation checkpoint: stop dispatching, let in-flight work
        // finish, keep already-completed results.
        if !cancelled && cancel.is_cancelled() {
            cancelled = true;
            tracing::info!(%id, "cancellation observed, no further dispatch");
        }

        while !cancelled && !exhausted && inflight.len() < job.workers {
            match pending.next() {
                Some(path) => {
                    let ctx = PipelineContext::for_file(
                        job,
                        path,
                        inner.providers.clone(),
                        Arc::clone(&book),
                    );
                    inflight.spawn_blocking(move || run_worker(ctx));
                }
                None => exhausted = true,
            }
        }

        // Drain whatever has completed without blocking on the rest.
        while let Some(joined) = inflight.try_join_next() {
            let Ok(outcome) = joined else {
                // Aborted task; nothing to record.
                continue;
            };
            let label = outcome
                .source
                .file_name()
                .map(|n| n.to_string_lossy().to_string());
            inner.with_record(id, |record| {
                record.results.push(outcome);
                record.progress = record.results.len().min(record.total);
                record.current = label;
            });
        }

        if inflight.is_empty() && (exhausted || cancelled) {
            break;
        }

        tokio::time::sleep(POLL_INTERVAL).await;
    }

    Ok(if cancelled {
        RunEnd::Cancelled
    } else {
        RunEnd::Completed
    })
}

/// Run the pipeline for one file, converting a panic into an `Errored`
/// outcome so one bad file cannot take down the batch.
fn run_worker(ctx: PipelineContext) -> FileOutcome {
    let path: PathBuf = ctx.path.clone();
    std::panic::catch_unwind(AssertUnwindSafe(|| process_file(&ctx)))
        .unwrap_or_else(|_| FileOutcome::errored(path, "worker panicked"))
}
