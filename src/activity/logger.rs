use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::{ApiError, EvaluationResult, HistoryItem};
use crate::config::schema::LoggingConfig;

// ---------------------------------------------------------------------------
// Activity log entry (JSONL)
// ---------------------------------------------------------------------------

/// Which backend action an entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Evaluate,
    History,
}

/// A single entry in the activity log (`~/.evalboard/activity.jsonl`).
///
/// Records the outcome of one completed backend action. Submitted text and
/// history contents are never written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub timestamp: String,
    pub action: ActionKind,
    pub success: bool,
    pub latency_ms: u64,
    /// HTTP status of a non-success answer.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub status: Option<u16>,
    /// Number of history items received (history fetches only).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl ActivityEntry {
    pub fn evaluate(outcome: &Result<EvaluationResult, ApiError>, latency: Duration) -> Self {
        Self::new(ActionKind::Evaluate, outcome.as_ref().err(), None, latency)
    }

    pub fn history(outcome: &Result<Vec<HistoryItem>, ApiError>, latency: Duration) -> Self {
        let items = outcome.as_ref().ok().map(Vec::len);
        Self::new(ActionKind::History, outcome.as_ref().err(), items, latency)
    }

    fn new(
        action: ActionKind,
        error: Option<&ApiError>,
        items: Option<usize>,
        latency: Duration,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            action,
            success: error.is_none(),
            latency_ms: latency.as_millis() as u64,
            status: error.and_then(ApiError::status),
            items,
            error: error.map(ToString::to_string),
        }
    }
}

// ---------------------------------------------------------------------------
// Log handle
// ---------------------------------------------------------------------------

/// Append-only JSONL activity log.
///
/// All I/O is best-effort: a log that cannot be written never fails the
/// action it describes.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    path: Option<PathBuf>,
}

impl ActivityLog {
    /// Build from the resolved `[logging]` config. Disabled logging yields a
    /// log that drops every entry.
    pub fn from_config(config: &LoggingConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }
        Self {
            path: config.resolved_path(),
        }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append one entry, silently ignoring I/O errors.
    pub fn record(&self, entry: &ActivityEntry) {
        let _ = self.append(entry);
    }

    fn append(&self, entry: &ActivityEntry) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let json = serde_json::to_string(entry)?;
        writeln!(file, "{json}")?;

        Ok(())
    }

    /// Read every entry from the log.
    ///
    /// Silently skips malformed lines. Returns an empty vec if logging is
    /// disabled or the file does not exist.
    pub fn read_all(&self) -> Vec<ActivityEntry> {
        let Some(path) = &self.path else {
            return Vec::new();
        };

        let Ok(file) = fs::File::open(path) else {
            return Vec::new();
        };

        BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .filter_map(|line| serde_json::from_str::<ActivityEntry>(&line).ok())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
