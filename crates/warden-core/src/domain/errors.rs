use thiserror::Error;

use super::{RecordId, UploadStatus};
use crate::ports::StoreError;

/// Errors surfaced by the queue's public operations.
///
/// Per-record upload failures never show up here: they are captured in the
/// record's `status` and `error_message` instead.
#[derive(Debug, Error)]
pub enum WardenError {
    #[error("record not found: {0}")]
    NotFound(RecordId),

    #[error("cannot {action} record {id} in status {from}")]
    InvalidTransition {
        id: RecordId,
        from: UploadStatus,
        action: &'static str,
    },

    #[error("queue store: {0}")]
    Store(#[from] StoreError),
}
