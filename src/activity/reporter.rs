use super::logger::{ActionKind, ActivityEntry};

/// Aggregate view of the activity log, shown by `evalboard health`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivitySummary {
    pub total: usize,
    pub evaluations: usize,
    pub history_fetches: usize,
    pub failures: usize,
    pub avg_latency_ms: f64,
    pub last_timestamp: Option<String>,
    /// Most recent failure message, if any.
    pub last_error: Option<String>,
}

impl ActivitySummary {
    pub fn failure_pct(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.failures as f64 / self.total as f64 * 100.0
        }
    }
}

pub fn summarize(entries: &[ActivityEntry]) -> ActivitySummary {
    if entries.is_empty() {
        return ActivitySummary::default();
    }

    let count = |kind: ActionKind| entries.iter().filter(|e| e.action == kind).count();
    let total_latency: u64 = entries.iter().map(|e| e.latency_ms).sum();

    ActivitySummary {
        total: entries.len(),
        evaluations: count(ActionKind::Evaluate),
        history_fetches: count(ActionKind::History),
        failures: entries.iter().filter(|e| !e.success).count(),
        avg_latency_ms: total_latency as f64 / entries.len() as f64,
        last_timestamp: entries.iter().map(|e| e.timestamp.clone()).max(),
        last_error: entries
            .iter()
            .rev()
            .find_map(|e| e.error.clone()),
    }
}
