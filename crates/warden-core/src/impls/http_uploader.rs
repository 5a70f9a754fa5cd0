//! HttpUploader - HTTP エンドポイントへの POST アップロード
//!
//! Request: `POST <endpoint>` with the raw bytes as body and metadata in
//! `x-artifact-*` headers. Response: JSON `{ "url": "..." }`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::ports::{CloudUploader, UploadError, UploadMetadata};

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpUploader {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpUploader {
    pub fn new(endpoint: impl Into<String>, token: Option<String>) -> Self {
        Self::with_client(Client::new(), endpoint, token)
    }

    pub fn with_client(client: Client, endpoint: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            token,
        }
    }
}

#[async_trait]
impl CloudUploader for HttpUploader {
    #[instrument(skip(self, bytes, metadata), fields(artifact_id = %metadata.id))]
    async fn upload(
        &self,
        bytes: Vec<u8>,
        metadata: &UploadMetadata,
    ) -> Result<String, UploadError> {
        let size_bytes = bytes.len();
        let mut request = self
            .client
            .post(&self.endpoint)
            .header("content-type", "image/jpeg")
            .header("x-artifact-id", metadata.id.as_str())
            .header("x-artifact-captured-at", metadata.captured_at.to_rfc3339())
            .header("x-artifact-reason", metadata.reason.as_str())
            .body(bytes);
        if let (Some(lat), Some(lon)) = (metadata.latitude, metadata.longitude) {
            request = request
                .header("x-artifact-latitude", lat.to_string())
                .header("x-artifact-longitude", lon.to_string());
        }
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Rejected(format!("{status}: {body}")));
        }

        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(|e| UploadError::Transport(format!("invalid upload response: {e}")))?;

        let url = parsed
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or(UploadError::MissingUrl)?;

        debug!(size_bytes, url = %url, "upload accepted");
        Ok(url)
    }
}
