//! Activity log: one JSONL line per completed backend action.
//!
//! Written by the CLI and the interactive session after each evaluate or
//! history request, read back by `evalboard health`.

pub mod logger;
pub mod reporter;

use std::time::Instant;

pub use logger::{ActionKind, ActivityEntry, ActivityLog};
pub use reporter::{ActivitySummary, summarize};

use crate::api::{ApiError, EvaluationResult, HistoryItem};
use crate::state::{PendingEvaluate, PendingHistory};

/// Send a pending evaluation and log its outcome.
pub fn send_evaluate(
    pending: PendingEvaluate,
    log: &ActivityLog,
) -> Result<EvaluationResult, ApiError> {
    let start = Instant::now();
    let outcome = pending.send();
    log.record(&ActivityEntry::evaluate(&outcome, start.elapsed()));
    outcome
}

/// Send a pending history fetch and log its outcome.
pub fn send_history(
    pending: PendingHistory,
    log: &ActivityLog,
) -> Result<Vec<HistoryItem>, ApiError> {
    let start = Instant::now();
    let outcome = pending.send();
    log.record(&ActivityEntry::history(&outcome, start.elapsed()));
    outcome
}
