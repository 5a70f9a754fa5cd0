//! SimulatedUploader - 開発用のアップローダー
//!
//! 実際には何も送らず、artifact id から決定的な URL を返します。
//! 本番の uploader と差し替えるための実装で、Processor 側にフォールバックは持ちません。

use async_trait::async_trait;
use tracing::debug;

use crate::ports::{CloudUploader, UploadError, UploadMetadata};

pub const DEFAULT_SIMULATED_BASE_URL: &str = "https://simulated.invalid/artifacts";

#[derive(Debug, Clone)]
pub struct SimulatedUploader {
    base_url: String,
}

impl SimulatedUploader {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn url_for(&self, metadata: &UploadMetadata) -> String {
        format!(
            "{}/{}-{}.jpg",
            self.base_url.trim_end_matches('/'),
            metadata.id,
            metadata.captured_at.timestamp_millis()
        )
    }
}

impl Default for SimulatedUploader {
    fn default() -> Self {
        Self::new(DEFAULT_SIMULATED_BASE_URL)
    }
}

#[async_trait]
impl CloudUploader for SimulatedUploader {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        metadata: &UploadMetadata,
    ) -> Result<String, UploadError> {
        let url = self.url_for(metadata);
        debug!(artifact_id = %metadata.id, size_bytes = bytes.len(), url = %url, "simulated upload");
        Ok(url)
    }
}
