//! Status - queue counts and pass reports.

use serde::{Deserialize, Serialize};

use crate::domain::{PassId, QueueRecord, UploadStatus};

/// Per-status record counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub failed: usize,
    /// Failed records with no automatic retries left (subset of `failed`).
    pub terminally_failed: usize,
    pub cancelled: usize,
}

impl QueueCounts {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a QueueRecord>) -> Self {
        let mut counts = Self::default();
        for record in records {
            match record.status {
                UploadStatus::Pending => counts.pending += 1,
                UploadStatus::InProgress => counts.in_progress += 1,
                UploadStatus::Completed => counts.completed += 1,
                UploadStatus::Failed => {
                    counts.failed += 1;
                    if record.is_terminally_failed() {
                        counts.terminally_failed += 1;
                    }
                }
                UploadStatus::Cancelled => counts.cancelled += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.pending + self.in_progress + self.completed + self.failed + self.cancelled
    }
}

/// How a processing pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassOutcome {
    /// The pass walked the eligible set.
    Ran,
    /// Another pass held the single-flight guard; nothing was done.
    AlreadyRunning,
    /// The connectivity oracle reported no network; nothing was attempted.
    Offline,
}

/// Result of one `Processor::process_once` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassReport {
    pub pass_id: PassId,
    pub outcome: PassOutcome,
    pub attempted: usize,
    pub completed: usize,
    pub failed: usize,
    /// Failed records still waiting out their backoff window.
    pub skipped_backoff: usize,
}

impl PassReport {
    pub(crate) fn new(pass_id: PassId, outcome: PassOutcome) -> Self {
        Self {
            pass_id,
            outcome,
            attempted: 0,
            completed: 0,
            failed: 0,
            skipped_backoff: 0,
        }
    }
}
