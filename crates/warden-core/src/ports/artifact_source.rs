//! ArtifactSource port - artifact の bytes を取得
//!
//! Queue は artifact の保存形式を知りません。`source_handle` を bytes に
//! 解決するのはこの port の実装の責務です。

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("artifact not found: {0}")]
    NotFound(String),

    #[error("artifact {handle} unreadable: {source}")]
    Unreadable {
        handle: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid source handle: {0}")]
    InvalidHandle(String),
}

/// Resolves a record's payload on demand.
///
/// Resolution failures are retried exactly like upload failures.
#[async_trait]
pub trait ArtifactSource: Send + Sync {
    async fn resolve_bytes(&self, source_handle: &str) -> Result<Vec<u8>, SourceError>;
}
