//! CloudUploader port - リモートストアへのアップロード

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::{ArtifactId, ArtifactRef};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("upload rejected: {0}")]
    Rejected(String),

    #[error("upload transport error: {0}")]
    Transport(String),

    #[error("uploader returned no url")]
    MissingUrl,

    #[error("upload timed out after {0:?}")]
    TimedOut(Duration),
}

/// Metadata sent alongside the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadMetadata {
    pub id: ArtifactId,
    pub captured_at: DateTime<Utc>,
    pub reason: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl From<&ArtifactRef> for UploadMetadata {
    fn from(artifact: &ArtifactRef) -> Self {
        let location = artifact.location();
        Self {
            id: artifact.id().clone(),
            captured_at: artifact.captured_at(),
            reason: artifact.reason().to_string(),
            latitude: location.map(|l| l.latitude),
            longitude: location.map(|l| l.longitude),
        }
    }
}

/// Accepts payload + metadata and returns a durable URL.
#[async_trait]
pub trait CloudUploader: Send + Sync {
    async fn upload(&self, bytes: Vec<u8>, metadata: &UploadMetadata)
    -> Result<String, UploadError>;
}
