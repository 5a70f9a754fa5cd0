//! RecordStore port - queue の永続化バックエンド
//!
//! # 設計原則
//! - ドキュメント全体を 1 単位として load / save する（部分更新なし）
//! - save は atomic であること（途中で落ちても前の版か新しい版のどちらか）
//! - 壊れたドキュメントの扱い（空として扱う）は `QueueStore` 側の責務

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::QueueRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("persisted queue is corrupt: {0}")]
    Corrupt(String),

    #[error("failed to serialize queue: {0}")]
    Serialize(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Backing storage for the full ordered list of queue records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Load every record. A store that has never been written returns an empty list.
    async fn load(&self) -> Result<Vec<QueueRecord>, StoreError>;

    /// Replace the stored document with `records`.
    async fn save(&self, records: &[QueueRecord]) -> Result<(), StoreError>;
}
