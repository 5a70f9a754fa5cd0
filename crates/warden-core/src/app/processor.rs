//! Processor - drives eligible records toward `Completed`.
//!
//! # フロー（1 pass）
//! 1. single-flight guard を取る（取れなければ何もしない）
//! 2. ConnectivityOracle で到達性を確認（offline なら終了）
//! 3. eligible な record を queued_at 順に列挙（backoff 中のものは飛ばす）
//! 4. 1 件ずつ upload を試行し、状態が変わるたびに永続化する

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{Instrument, debug, error, info, info_span, warn};

use super::notify::{NotificationFanout, NotificationReport};
use super::status::{PassOutcome, PassReport, QueueCounts};
use crate::domain::{ArtifactRef, PassId, QueueRecord, RecordId, UploadStatus, WardenError};
use crate::ports::{
    ArtifactSource, Clock, CloudUploader, ConnectivityOracle, IdGenerator, SourceError,
    UploadError, UploadMetadata,
};
use crate::queue::{BackoffPolicy, QueueStore};

/// Result of a single upload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Completed {
        url: String,
        notification: NotificationReport,
    },
    Failed {
        error: String,
        /// No automatic retries remain.
        terminal: bool,
    },
}

/// Anything that makes an attempt fail. All variants are retried alike.
#[derive(Debug, Error)]
enum AttemptError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Upload(#[from] UploadError),
}

/// The queue engine.
///
/// Concurrency:
/// - `pass_guard` is the single-flight lock. `process_once` takes it with
///   `try_lock` and gives up if it is held; `retry`, `cancel` and `clear_*`
///   wait for it, so they never interleave with a pass.
/// - `store` is only held for short critical sections, never across an
///   upload. `enqueue` and the read-only queries need nothing else.
pub struct Processor {
    store: Mutex<QueueStore>,
    pass_guard: Mutex<()>,
    connectivity: Arc<dyn ConnectivityOracle>,
    source: Arc<dyn ArtifactSource>,
    uploader: Arc<dyn CloudUploader>,
    notifier: NotificationFanout,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    backoff: BackoffPolicy,
    attempt_timeout: Duration,
}

pub(crate) struct ProcessorParts {
    pub store: QueueStore,
    pub connectivity: Arc<dyn ConnectivityOracle>,
    pub source: Arc<dyn ArtifactSource>,
    pub uploader: Arc<dyn CloudUploader>,
    pub notifier: NotificationFanout,
    pub clock: Arc<dyn Clock>,
    pub ids: Arc<dyn IdGenerator>,
    pub backoff: BackoffPolicy,
    pub attempt_timeout: Duration,
}

impl Processor {
    pub fn builder() -> super::ProcessorBuilder {
        super::ProcessorBuilder::new()
    }

    pub(crate) fn from_parts(parts: ProcessorParts) -> Self {
        Self {
            store: Mutex::new(parts.store),
            pass_guard: Mutex::new(()),
            connectivity: parts.connectivity,
            source: parts.source,
            uploader: parts.uploader,
            notifier: parts.notifier,
            clock: parts.clock,
            ids: parts.ids,
            backoff: parts.backoff,
            attempt_timeout: parts.attempt_timeout,
        }
    }

    pub fn backoff(&self) -> &BackoffPolicy {
        &self.backoff
    }

    /// Add an artifact to the queue as `Pending`.
    pub async fn enqueue(&self, artifact: ArtifactRef) -> Result<QueueRecord, WardenError> {
        let record = self.store.lock().await.enqueue(artifact).await?;
        info!(record_id = %record.id, artifact_id = %record.artifact.id(), "artifact enqueued");
        Ok(record)
    }

    /// Enqueue and immediately run a pass.
    pub async fn submit(
        &self,
        artifact: ArtifactRef,
    ) -> Result<(QueueRecord, PassReport), WardenError> {
        let record = self.enqueue(artifact).await?;
        let report = self.process_once().await;
        let record = self.get(record.id).await.unwrap_or(record);
        Ok((record, report))
    }

    /// Run one processing pass. Never fails; per-record errors end up in the records.
    pub async fn process_once(&self) -> PassReport {
        let pass_id = self.ids.generate_pass_id();
        let Ok(_guard) = self.pass_guard.try_lock() else {
            debug!(pass_id = %pass_id, "pass already running; skipped");
            return PassReport::new(pass_id, PassOutcome::AlreadyRunning);
        };

        self.run_pass(pass_id)
            .instrument(info_span!("process_pass", pass_id = %pass_id))
            .await
    }

    async fn run_pass(&self, pass_id: PassId) -> PassReport {
        if !self.connectivity.is_reachable().await {
            info!("network unreachable; pass skipped");
            return PassReport::new(pass_id, PassOutcome::Offline);
        }

        let mut report = PassReport::new(pass_id, PassOutcome::Ran);
        let now = self.clock.now();
        let eligible: Vec<RecordId> = {
            let store = self.store.lock().await;
            let mut candidates = store.by_status(|r| r.is_eligible(now, &self.backoff));
            candidates.sort_by_key(|r| r.queued_at);
            report.skipped_backoff = store.count(|r| {
                r.status == UploadStatus::Failed
                    && !r.is_terminally_failed()
                    && !r.is_eligible(now, &self.backoff)
            });
            candidates.into_iter().map(|r| r.id).collect()
        };

        for id in eligible {
            let Some(outcome) = self.attempt(id).await else {
                continue;
            };
            report.attempted += 1;
            match outcome {
                AttemptOutcome::Completed { .. } => report.completed += 1,
                AttemptOutcome::Failed { .. } => report.failed += 1,
            }
        }

        info!(
            attempted = report.attempted,
            completed = report.completed,
            failed = report.failed,
            skipped_backoff = report.skipped_backoff,
            "pass finished"
        );
        report
    }

    /// One upload attempt for `id`. `None` if the record is gone or no longer
    /// in an attemptable state.
    async fn attempt(&self, id: RecordId) -> Option<AttemptOutcome> {
        let mut record = {
            let mut store = self.store.lock().await;
            let mut record = store.get(id)?;
            if let Err(e) = record.begin_attempt(self.clock.now()) {
                debug!(record_id = %id, error = %e, "record not attemptable");
                return None;
            }
            persist(&mut store, record.clone()).await;
            record
        };

        debug!(record_id = %id, retry_count = record.retry_count, "attempting upload");
        let result = match tokio::time::timeout(self.attempt_timeout, self.upload(&record.artifact))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(UploadError::TimedOut(self.attempt_timeout).into()),
        };

        match result {
            Ok(url) => {
                record.complete(url.clone());
                self.save(record.clone()).await;
                info!(record_id = %id, url = %url, "artifact uploaded");

                let notification = self.notifier.notify(&url, &record.artifact).await;
                if !notification.delivered() {
                    warn!(record_id = %id, ?notification, "contact was not notified");
                }
                Some(AttemptOutcome::Completed { url, notification })
            }
            Err(e) => {
                let error = e.to_string();
                record.fail(error.clone());
                let terminal = record.is_terminally_failed();
                self.save(record.clone()).await;
                warn!(
                    record_id = %id,
                    retry_count = record.retry_count,
                    max_retries = record.max_retries,
                    terminal,
                    error = %error,
                    "upload attempt failed"
                );
                Some(AttemptOutcome::Failed { error, terminal })
            }
        }
    }

    async fn upload(&self, artifact: &ArtifactRef) -> Result<String, AttemptError> {
        let bytes = self.source.resolve_bytes(artifact.source_handle()).await?;
        let metadata = UploadMetadata::from(artifact);
        let url = self.uploader.upload(bytes, &metadata).await?;
        if url.trim().is_empty() {
            return Err(UploadError::MissingUrl.into());
        }
        Ok(url)
    }

    async fn save(&self, record: QueueRecord) {
        let mut store = self.store.lock().await;
        persist(&mut store, record).await;
    }

    /// Manual retry of a failed record: reset its retry budget and attempt it now.
    ///
    /// When the network is unreachable the record is left `Pending` for the
    /// next pass.
    pub async fn retry(&self, id: RecordId) -> Result<QueueRecord, WardenError> {
        let _guard = self.pass_guard.lock().await;
        {
            let mut store = self.store.lock().await;
            let mut record = store.get(id).ok_or(WardenError::NotFound(id))?;
            record.reset_for_retry()?;
            store.update(record).await?;
        }
        info!(record_id = %id, "manual retry");

        if self.connectivity.is_reachable().await {
            self.attempt(id).await;
        } else {
            info!(record_id = %id, "network unreachable; retry deferred to next pass");
        }
        self.get(id).await.ok_or(WardenError::NotFound(id))
    }

    /// Withdraw a record from processing. It stays in the store as `Cancelled`.
    pub async fn cancel(&self, id: RecordId) -> Result<QueueRecord, WardenError> {
        let _guard = self.pass_guard.lock().await;
        let mut store = self.store.lock().await;
        let mut record = store.get(id).ok_or(WardenError::NotFound(id))?;
        record.cancel()?;
        store.update(record.clone()).await?;
        info!(record_id = %id, "record cancelled");
        Ok(record)
    }

    pub async fn clear_completed(&self) -> Result<usize, WardenError> {
        self.clear(UploadStatus::Completed).await
    }

    pub async fn clear_failed(&self) -> Result<usize, WardenError> {
        self.clear(UploadStatus::Failed).await
    }

    async fn clear(&self, status: UploadStatus) -> Result<usize, WardenError> {
        let _guard = self.pass_guard.lock().await;
        let removed = self
            .store
            .lock()
            .await
            .remove_where(|r| r.status == status)
            .await?;
        info!(%status, removed, "records cleared");
        Ok(removed)
    }

    pub async fn get(&self, id: RecordId) -> Option<QueueRecord> {
        self.store.lock().await.get(id)
    }

    pub async fn list_all(&self) -> Vec<QueueRecord> {
        self.store.lock().await.all()
    }

    pub async fn list_pending(&self) -> Vec<QueueRecord> {
        self.list_status(UploadStatus::Pending).await
    }

    pub async fn list_completed(&self) -> Vec<QueueRecord> {
        self.list_status(UploadStatus::Completed).await
    }

    pub async fn list_failed(&self) -> Vec<QueueRecord> {
        self.list_status(UploadStatus::Failed).await
    }

    pub async fn list_status(&self, status: UploadStatus) -> Vec<QueueRecord> {
        self.store.lock().await.by_status(|r| r.status == status)
    }

    pub async fn pending_count(&self) -> usize {
        self.store
            .lock()
            .await
            .count(|r| r.status == UploadStatus::Pending)
    }

    pub async fn failed_count(&self) -> usize {
        self.store
            .lock()
            .await
            .count(|r| r.status == UploadStatus::Failed)
    }

    pub async fn counts(&self) -> QueueCounts {
        let records = self.store.lock().await.all();
        QueueCounts::from_records(&records)
    }
}

/// Write a record back; failures are logged, not propagated, so a pass keeps going.
async fn persist(store: &mut QueueStore, record: QueueRecord) {
    let id = record.id;
    if let Err(e) = store.update(record).await {
        error!(record_id = %id, error = %e, "failed to persist record");
    }
}
