//! Per-run verification log.
//!
//! Every pipeline run creates one `VerificationLog` and passes it by
//! reference through each phase. Entries are append-only and are mirrored
//! as tracing events.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::document::truncate_chars;

const MAX_DETAIL_CHARS: usize = 200;

/// Outcome recorded for a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    Success,
    Passed,
    Found,
    Applied,
    Info,
    Skipped,
    Retry,
    Passthrough,
    Warning,
    Rejected,
    Failed,
    Error,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Passed => "PASSED",
            Self::Found => "FOUND",
            Self::Applied => "APPLIED",
            Self::Info => "INFO",
            Self::Skipped => "SKIPPED",
            Self::Retry => "RETRY",
            Self::Passthrough => "PASSTHROUGH",
            Self::Warning => "WARNING",
            Self::Rejected => "REJECTED",
            Self::Failed => "FAILED",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One append-only audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationEntry {
    pub stage: String,
    pub status: EntryStatus,
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}

/// Audit trail for a single place's run.
#[derive(Debug)]
pub struct VerificationLog {
    place: String,
    entries: Mutex<Vec<VerificationEntry>>,
}

impl VerificationLog {
    /// Start an empty log for `place`.
    pub fn new(place: impl Into<String>) -> Self {
        Self {
            place: place.into(),
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Append an entry and emit it as a tracing event.
    pub fn record(&self, stage: &str, status: EntryStatus, detail: impl Into<String>) {
        let detail = detail.into();
        let detail = truncate_chars(&detail, MAX_DETAIL_CHARS).to_string();

        match status {
            EntryStatus::Error | EntryStatus::Failed => {
                tracing::warn!(place = %self.place, stage, status = %status, "{}", detail)
            }
            EntryStatus::Warning | EntryStatus::Rejected | EntryStatus::Retry => {
                tracing::info!(place = %self.place, stage, status = %status, "{}", detail)
            }
            _ => tracing::debug!(place = %self.place, stage, status = %status, "{}", detail),
        }

        self.lock().push(VerificationEntry {
            stage: stage.to_string(),
            status,
            detail,
            timestamp: Utc::now(),
        });
    }

    /// Snapshot of all entries in insertion order.
    pub fn entries(&self) -> Vec<VerificationEntry> {
        self.lock().clone()
    }

    /// Consume the log, returning its entries.
    pub fn into_entries(self) -> Vec<VerificationEntry> {
        self.entries
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Whether any entry matches `stage` and `status`.
    pub fn contains(&self, stage: &str, status: EntryStatus) -> bool {
        self.lock()
            .iter()
            .any(|entry| entry.stage == stage && entry.status == status)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<VerificationEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
