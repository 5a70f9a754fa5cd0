//! JsonFileStore - queue 全体を 1 つの JSON ファイルに保存
//!
//! Storage format: a JSON array of records at `path`. Writes go to a sibling
//! temp file that is then renamed over the target, so readers only ever see a
//! complete document.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::domain::QueueRecord;
use crate::ports::{RecordStore, StoreError};

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "queue.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn load(&self) -> Result<Vec<QueueRecord>, StoreError> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&raw).map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    async fn save(&self, records: &[QueueRecord]) -> Result<(), StoreError> {
        let raw = serde_json::to_vec_pretty(records)
            .map_err(|e| StoreError::Serialize(e.to_string()))?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }

        let tmp = self.temp_path();
        fs::write(&tmp, &raw).await?;
        fs::rename(&tmp, &self.path).await?;

        debug!(path = %self.path.display(), records = records.len(), "queue saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ArtifactId, ArtifactRef, DEFAULT_MAX_RETRIES, RecordId};
    use chrono::{TimeZone, Utc};
    use ulid::Ulid;

    fn record(id: &str) -> QueueRecord {
        let at = Utc.with_ymd_and_hms(2024, 5, 4, 3, 2, 1).unwrap();
        let artifact = ArtifactRef::new(ArtifactId::new(id), format!("{id}.jpg"), at, "motion");
        QueueRecord::new(RecordId::from_ulid(Ulid::new()), artifact, DEFAULT_MAX_RETRIES, at)
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("queue.json"));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_then_load_round_trips_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("queue.json");
        let store = JsonFileStore::new(&path);
        let records = vec![record("a1"), record("a2")];

        store.save(&records).await.unwrap();

        assert_eq!(store.load().await.unwrap(), records);
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn persisted_format_uses_camel_case_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("queue.json"));
        store.save(&[record("a1")]).await.unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let entry = &json[0];

        assert_eq!(entry["status"], "pending");
        assert_eq!(entry["retryCount"], 0);
        assert_eq!(entry["maxRetries"], 5);
        assert_eq!(entry["artifact"]["sourceHandle"], "a1.jpg");
        assert!(entry.get("resultUrl").is_none());
    }

    #[tokio::test]
    async fn garbage_is_reported_as_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.json");
        std::fs::write(&path, b"[{\"id\": 42").unwrap();

        let err = JsonFileStore::new(path).load().await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }
}
