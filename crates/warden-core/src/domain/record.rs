//! Queue record: artifact + delivery bookkeeping.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::{ArtifactRef, RecordId, UploadStatus, WardenError};
use crate::queue::BackoffPolicy;

/// Automatic attempts allowed before a record is terminally failed.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Delivery state for one artifact.
///
/// Design:
/// - This is the persisted unit; the queue store saves the full list of these.
/// - All state transitions happen through the methods below so that
///   `result_url` is set exactly when `status == Completed` and
///   `retry_count` never exceeds `max_retries`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueRecord {
    pub id: RecordId,
    pub artifact: ArtifactRef,
    pub status: UploadStatus,

    /// Failed attempts since enqueue (or since the last manual retry).
    pub retry_count: u32,
    pub max_retries: u32,

    pub queued_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_attempt_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
}

impl QueueRecord {
    pub fn new(
        id: RecordId,
        artifact: ArtifactRef,
        max_retries: u32,
        queued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            artifact,
            status: UploadStatus::Pending,
            retry_count: 0,
            max_retries,
            queued_at,
            last_attempt_at: None,
            error_message: None,
            result_url: None,
        }
    }

    /// Failed with no automatic attempts left.
    pub fn is_terminally_failed(&self) -> bool {
        self.status == UploadStatus::Failed && self.retry_count >= self.max_retries
    }

    /// Earliest time the next automatic attempt may start.
    ///
    /// `None` means the record is never auto-attempted in its current state.
    pub fn next_attempt_at(&self, backoff: &BackoffPolicy) -> Option<DateTime<Utc>> {
        match self.status {
            UploadStatus::Pending => Some(self.queued_at),
            UploadStatus::Failed if !self.is_terminally_failed() => {
                let Some(last) = self.last_attempt_at else {
                    return Some(self.queued_at);
                };
                let delay = backoff.delay(self.retry_count.saturating_sub(1));
                let delay = TimeDelta::from_std(delay).unwrap_or(TimeDelta::MAX);
                Some(last.checked_add_signed(delay).unwrap_or(DateTime::<Utc>::MAX_UTC))
            }
            _ => None,
        }
    }

    /// Should a processing pass running at `now` attempt this record?
    pub fn is_eligible(&self, now: DateTime<Utc>, backoff: &BackoffPolicy) -> bool {
        match self.status {
            UploadStatus::Pending => true,
            UploadStatus::Failed => self
                .next_attempt_at(backoff)
                .is_some_and(|at| now >= at),
            _ => false,
        }
    }

    /// Mark as in progress. Backoff is the caller's concern; this only checks
    /// that the state allows an attempt at all.
    pub fn begin_attempt(&mut self, now: DateTime<Utc>) -> Result<(), WardenError> {
        let allowed = match self.status {
            UploadStatus::Pending => true,
            UploadStatus::Failed => !self.is_terminally_failed(),
            _ => false,
        };
        if !allowed {
            return Err(self.invalid("attempt"));
        }
        self.status = UploadStatus::InProgress;
        self.last_attempt_at = Some(now);
        Ok(())
    }

    /// Mark as uploaded. Called on an in-progress record.
    pub fn complete(&mut self, url: String) {
        self.status = UploadStatus::Completed;
        self.result_url = Some(url);
        self.error_message = None;
    }

    /// Record a failed attempt. Called on an in-progress record.
    pub fn fail(&mut self, error: String) {
        self.status = UploadStatus::Failed;
        self.retry_count = (self.retry_count + 1).min(self.max_retries);
        self.error_message = Some(error);
        self.result_url = None;
    }

    pub fn cancel(&mut self) -> Result<(), WardenError> {
        if !self.status.is_cancellable() {
            return Err(self.invalid("cancel"));
        }
        self.status = UploadStatus::Cancelled;
        Ok(())
    }

    /// Manual retry: Failed -> Pending with a fresh retry budget.
    pub fn reset_for_retry(&mut self) -> Result<(), WardenError> {
        if self.status != UploadStatus::Failed {
            return Err(self.invalid("retry"));
        }
        self.status = UploadStatus::Pending;
        self.retry_count = 0;
        self.error_message = None;
        Ok(())
    }

    /// A record loaded as InProgress was interrupted by a crash; re-arm it.
    pub(crate) fn recover_interrupted(&mut self) -> bool {
        if self.status != UploadStatus::InProgress {
            return false;
        }
        self.status = UploadStatus::Pending;
        true
    }

    fn invalid(&self, action: &'static str) -> WardenError {
        WardenError::InvalidTransition {
            id: self.id,
            from: self.status,
            action,
        }
    }
}
