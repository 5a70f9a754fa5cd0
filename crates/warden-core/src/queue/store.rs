//! Persisted, ordered collection of queue records.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::domain::{ArtifactRef, QueueRecord, RecordId};
use crate::ports::{Clock, IdGenerator, RecordStore, StoreError};

/// Ordered list of records mirrored to a `RecordStore` backend.
///
/// Design:
/// - The in-memory list is the working copy; every mutating operation writes
///   the whole list back to the backend before returning.
/// - Insertion order is FIFO order (`queued_at` ascending for a single producer).
/// - Not internally synchronized; `Processor` owns it behind a mutex.
pub struct QueueStore {
    records: Vec<QueueRecord>,
    backend: Arc<dyn RecordStore>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    max_retries: u32,
}

impl QueueStore {
    /// Load the persisted queue.
    ///
    /// An unreadable or corrupt document yields an empty queue instead of an
    /// error. Records left `InProgress` by a crash are re-armed as `Pending`.
    pub async fn open(
        backend: Arc<dyn RecordStore>,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
        max_retries: u32,
    ) -> Self {
        let records = match backend.load().await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "persisted queue unreadable; starting with an empty queue");
                Vec::new()
            }
        };

        let mut store = Self {
            records,
            backend,
            ids,
            clock,
            max_retries,
        };

        let mut recovered = 0usize;
        for record in &mut store.records {
            if record.recover_interrupted() {
                warn!(record_id = %record.id, "attempt interrupted by restart; re-queued");
                recovered += 1;
            }
        }
        if recovered > 0
            && let Err(e) = store.persist().await
        {
            error!(error = %e, "failed to persist recovered records");
        }

        debug!(records = store.records.len(), "queue store opened");
        store
    }

    /// Create a `Pending` record for `artifact`, append it and persist.
    ///
    /// If persisting fails the record is not kept.
    pub async fn enqueue(&mut self, artifact: ArtifactRef) -> Result<QueueRecord, StoreError> {
        let record = QueueRecord::new(
            self.ids.generate_record_id(),
            artifact,
            self.max_retries,
            self.clock.now(),
        );
        self.records.push(record.clone());

        if let Err(e) = self.persist().await {
            self.records.pop();
            return Err(e);
        }
        Ok(record)
    }

    pub fn all(&self) -> Vec<QueueRecord> {
        self.records.clone()
    }

    pub fn by_status(&self, predicate: impl Fn(&QueueRecord) -> bool) -> Vec<QueueRecord> {
        self.records.iter().filter(|r| predicate(r)).cloned().collect()
    }

    pub fn count(&self, predicate: impl Fn(&QueueRecord) -> bool) -> usize {
        self.records.iter().filter(|r| predicate(r)).count()
    }

    pub fn get(&self, id: RecordId) -> Option<QueueRecord> {
        self.records.iter().find(|r| r.id == id).cloned()
    }

    /// Replace the record with the same id and persist.
    ///
    /// Unknown ids are a silent no-op; re-fetch with `get` to confirm.
    pub async fn update(&mut self, record: QueueRecord) -> Result<(), StoreError> {
        let Some(slot) = self.records.iter_mut().find(|r| r.id == record.id) else {
            debug!(record_id = %record.id, "update for unknown record ignored");
            return Ok(());
        };
        *slot = record;
        self.persist().await
    }

    /// Remove a record. Returns false when absent.
    pub async fn remove(&mut self, id: RecordId) -> Result<bool, StoreError> {
        let Some(pos) = self.records.iter().position(|r| r.id == id) else {
            return Ok(false);
        };
        self.records.remove(pos);
        self.persist().await?;
        Ok(true)
    }

    /// Remove every record matching `predicate`; returns how many were removed.
    pub async fn remove_where(
        &mut self,
        predicate: impl Fn(&QueueRecord) -> bool,
    ) -> Result<usize, StoreError> {
        let before = self.records.len();
        self.records.retain(|r| !predicate(r));
        let removed = before - self.records.len();
        if removed > 0 {
            self.persist().await?;
        }
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    async fn persist(&self) -> Result<(), StoreError> {
        self.backend.save(&self.records).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ArtifactId, DEFAULT_MAX_RETRIES, GeoLocation, UploadStatus};
    use crate::impls::MemoryStore;
    use crate::ports::{FixedClock, UlidGenerator};
    use chrono::{TimeDelta, TimeZone, Utc};

    fn clock() -> FixedClock {
        FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap())
    }

    async fn open(backend: Arc<MemoryStore>, clock: FixedClock) -> QueueStore {
        let clock: Arc<dyn Clock> = Arc::new(clock);
        let ids = Arc::new(UlidGenerator::new(clock.clone()));
        QueueStore::open(backend, ids, clock, DEFAULT_MAX_RETRIES).await
    }

    fn artifact(id: &str) -> ArtifactRef {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 11, 59, 0).unwrap();
        ArtifactRef::new(ArtifactId::new(id), format!("{id}.jpg"), at, "intruder")
    }

    #[tokio::test]
    async fn enqueue_appends_pending_and_persists() {
        let backend = Arc::new(MemoryStore::new());
        let mut store = open(backend.clone(), clock()).await;

        let record = store.enqueue(artifact("a1")).await.unwrap();

        assert_eq!(record.status, UploadStatus::Pending);
        assert_eq!(record.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(store.len(), 1);
        assert_eq!(backend.save_count(), 1);
        assert_eq!(backend.load().await.unwrap(), vec![record]);
    }

    #[tokio::test]
    async fn enqueue_rolls_back_when_persist_fails() {
        let backend = Arc::new(MemoryStore::new());
        let mut store = open(backend.clone(), clock()).await;
        backend.fail_saves(true);

        let err = store.enqueue(artifact("a1")).await.unwrap_err();

        assert!(matches!(err, StoreError::Unavailable(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn update_unknown_id_is_noop() {
        let backend = Arc::new(MemoryStore::new());
        let mut store = open(backend.clone(), clock()).await;
        let record = store.enqueue(artifact("a1")).await.unwrap();
        store.remove(record.id).await.unwrap();
        let saves = backend.save_count();

        store.update(record).await.unwrap();

        assert!(store.is_empty());
        assert_eq!(backend.save_count(), saves);
    }

    #[tokio::test]
    async fn remove_reports_presence() {
        let backend = Arc::new(MemoryStore::new());
        let mut store = open(backend, clock()).await;
        let record = store.enqueue(artifact("a1")).await.unwrap();

        assert!(store.remove(record.id).await.unwrap());
        assert!(!store.remove(record.id).await.unwrap());
    }

    #[tokio::test]
    async fn corrupt_document_opens_as_empty_queue() {
        let backend = Arc::new(MemoryStore::with_document("{ definitely not a queue"));
        let store = open(backend, clock()).await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn in_progress_records_are_recovered_on_open() {
        let backend = Arc::new(MemoryStore::new());
        let clock = clock();
        let id = {
            let mut store = open(backend.clone(), clock.clone()).await;
            let mut record = store.enqueue(artifact("a1")).await.unwrap();
            record.begin_attempt(clock.now()).unwrap();
            store.update(record.clone()).await.unwrap();
            record.id
        };

        let store = open(backend.clone(), clock).await;

        assert_eq!(store.get(id).unwrap().status, UploadStatus::Pending);
        assert_eq!(backend.load().await.unwrap()[0].status, UploadStatus::Pending);
    }

    #[tokio::test]
    async fn round_trip_preserves_mixed_records() {
        let backend = Arc::new(MemoryStore::new());
        let clock = clock();
        let mut store = open(backend.clone(), clock.clone()).await;

        let located = artifact("a2").with_location(GeoLocation {
            latitude: 51.5,
            longitude: -0.125,
            accuracy: 8.5,
            timestamp: clock.now(),
        });
        store.enqueue(artifact("a1")).await.unwrap();
        let mut completed = store.enqueue(located).await.unwrap();
        let mut failed = store.enqueue(artifact("a3")).await.unwrap();
        let mut cancelled = store.enqueue(artifact("a4")).await.unwrap();

        clock.advance(TimeDelta::seconds(3));
        completed.begin_attempt(clock.now()).unwrap();
        completed.complete("https://store/a2.jpg".to_string());
        failed.begin_attempt(clock.now()).unwrap();
        failed.fail("connection reset".to_string());
        cancelled.cancel().unwrap();
        for record in [completed, failed, cancelled] {
            store.update(record).await.unwrap();
        }

        let before = store.all();
        let reopened = open(backend, clock).await;

        assert_eq!(reopened.all(), before);
    }
}
