//! Batch rename orchestration engine for tracktidy.
//!
//! This crate runs one rename job across a bounded worker pool: it
//! enumerates the library, arbitrates metadata per file, allocates
//! collision-free destination names through a shared [`ReservationBook`],
//! and tracks the whole run in an [`OperationManager`] that supports
//! polling and cooperative cancellation.

use std::time::Duration;

mod manager;
mod pipeline;
mod record;
mod reservation;
mod result;

pub use manager::OperationManager;
pub use pipeline::{MetadataProviders, PipelineContext, process_file};
pub use record::{OperationId, OperationRecord, OperationStatus};
pub use reservation::ReservationBook;
pub use result::{FileOutcome, OperationSummary, OutcomeKind};

/// Tick interval of the orchestrator's completion/cancellation poll loop.
///
/// Cancellation latency is roughly one tick. A tuning constant, not a
/// correctness requirement.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default number of files processed in parallel.
pub const DEFAULT_WORKERS: usize = 4;
