//! Upload status state machine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Delivery status of a queue record.
///
/// State transitions:
/// - Pending -> InProgress -> Completed
/// - Pending -> InProgress -> Failed -> InProgress -> ... (until max_retries)
/// - Failed -> Pending (manual retry only, resets retry_count)
/// - any non-Completed -> Cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    /// Waiting for its first attempt (or re-armed by a manual retry).
    Pending,

    /// An attempt is running in the current pass.
    InProgress,

    /// Uploaded; `result_url` is set.
    Completed,

    /// Last attempt failed. Retryable until `retry_count == max_retries`.
    Failed,

    /// Withdrawn by an operator; kept for audit.
    Cancelled,
}

impl UploadStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            UploadStatus::Pending => "pending",
            UploadStatus::InProgress => "in_progress",
            UploadStatus::Completed => "completed",
            UploadStatus::Failed => "failed",
            UploadStatus::Cancelled => "cancelled",
        }
    }

    /// Can an operator still cancel a record in this state?
    pub fn is_cancellable(self) -> bool {
        !matches!(self, UploadStatus::Completed)
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown upload status: {0}")]
pub struct ParseStatusError(String);

impl FromStr for UploadStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(UploadStatus::Pending),
            "in_progress" => Ok(UploadStatus::InProgress),
            "completed" => Ok(UploadStatus::Completed),
            "failed" => Ok(UploadStatus::Failed),
            "cancelled" => Ok(UploadStatus::Cancelled),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::pending(UploadStatus::Pending)]
    #[case::in_progress(UploadStatus::InProgress)]
    #[case::completed(UploadStatus::Completed)]
    #[case::failed(UploadStatus::Failed)]
    #[case::cancelled(UploadStatus::Cancelled)]
    fn display_matches_serde_name(#[case] status: UploadStatus) {
        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(json, format!("\"{status}\""));
        assert_eq!(status.as_str().parse::<UploadStatus>().unwrap(), status);
    }

    #[test]
    fn only_completed_is_not_cancellable() {
        assert!(!UploadStatus::Completed.is_cancellable());
        assert!(UploadStatus::Failed.is_cancellable());
        assert!(UploadStatus::Pending.is_cancellable());
    }
}
