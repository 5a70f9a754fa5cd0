//! ProcessorBuilder - Processor の構築とワイヤリング
//!
//! - 必須の協調者が揃っていなければ build() で失敗する（Fail-fast）
//! - clock / id / connectivity はデフォルト実装を持つ
//! - build() は永続化された queue を読み込むので async

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::notify::NotificationFanout;
use super::processor::{Processor, ProcessorParts};
use crate::config::QueueConfig;
use crate::impls::AlwaysOnline;
use crate::ports::{
    ArtifactSource, Clock, CloudUploader, ConnectivityOracle, ContactDirectory, IdGenerator,
    NotificationChannel, RecordStore, SystemClock, UlidGenerator,
};
use crate::queue::{BackoffPolicy, QueueStore};

/// BuildError は Processor 構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("missing collaborator: {0}. Set it on the builder before build().")]
    MissingCollaborator(&'static str),

    #[error("invalid setting: {0}")]
    InvalidSetting(&'static str),
}

/// # 使用例
/// ```ignore
/// let processor = ProcessorBuilder::new()
///     .record_store(Arc::new(JsonFileStore::new("queue.json")))
///     .source(Arc::new(FsArtifactSource::new("/photos")))
///     .uploader(Arc::new(SimulatedUploader::default()))
///     .contacts(Arc::new(StaticContactDirectory::new(contact)))
///     .primary_channel(Arc::new(LogChannel))
///     .build()
///     .await?;
/// ```
pub struct ProcessorBuilder {
    record_store: Option<Arc<dyn RecordStore>>,
    source: Option<Arc<dyn ArtifactSource>>,
    uploader: Option<Arc<dyn CloudUploader>>,
    contacts: Option<Arc<dyn ContactDirectory>>,
    primary: Option<Arc<dyn NotificationChannel>>,
    fallback: Option<Arc<dyn NotificationChannel>>,
    connectivity: Option<Arc<dyn ConnectivityOracle>>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
    max_retries: u32,
    backoff: BackoffPolicy,
    attempt_timeout: Duration,
}

impl ProcessorBuilder {
    pub fn new() -> Self {
        let defaults = QueueConfig::default();
        Self {
            record_store: None,
            source: None,
            uploader: None,
            contacts: None,
            primary: None,
            fallback: None,
            connectivity: None,
            clock: None,
            ids: None,
            max_retries: defaults.max_retries,
            backoff: defaults.backoff(),
            attempt_timeout: defaults.attempt_timeout(),
        }
    }

    pub fn record_store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.record_store = Some(store);
        self
    }

    pub fn source(mut self, source: Arc<dyn ArtifactSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn uploader(mut self, uploader: Arc<dyn CloudUploader>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    pub fn contacts(mut self, contacts: Arc<dyn ContactDirectory>) -> Self {
        self.contacts = Some(contacts);
        self
    }

    pub fn primary_channel(mut self, channel: Arc<dyn NotificationChannel>) -> Self {
        self.primary = Some(channel);
        self
    }

    pub fn fallback_channel(mut self, channel: Arc<dyn NotificationChannel>) -> Self {
        self.fallback = Some(channel);
        self
    }

    /// Defaults to `AlwaysOnline`.
    pub fn connectivity(mut self, connectivity: Arc<dyn ConnectivityOracle>) -> Self {
        self.connectivity = Some(connectivity);
        self
    }

    /// Defaults to `SystemClock`.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Defaults to a `UlidGenerator` over the builder's clock.
    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// Applies retry cap, backoff and attempt timeout from `config`.
    pub fn queue_config(self, config: &QueueConfig) -> Self {
        self.max_retries(config.max_retries)
            .backoff(config.backoff())
            .attempt_timeout(config.attempt_timeout())
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Validate the wiring, open the persisted queue and produce a `Processor`.
    pub async fn build(self) -> Result<Processor, BuildError> {
        let record_store = self
            .record_store
            .ok_or(BuildError::MissingCollaborator("record_store"))?;
        let source = self.source.ok_or(BuildError::MissingCollaborator("source"))?;
        let uploader = self
            .uploader
            .ok_or(BuildError::MissingCollaborator("uploader"))?;
        let contacts = self
            .contacts
            .ok_or(BuildError::MissingCollaborator("contacts"))?;
        let primary = self
            .primary
            .ok_or(BuildError::MissingCollaborator("primary_channel"))?;
        if self.attempt_timeout.is_zero() {
            return Err(BuildError::InvalidSetting("attempt_timeout must be non-zero"));
        }
        self.backoff.check().map_err(BuildError::InvalidSetting)?;

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(clock.clone())));
        let connectivity = self.connectivity.unwrap_or_else(|| Arc::new(AlwaysOnline));

        let store = QueueStore::open(record_store, ids.clone(), clock.clone(), self.max_retries).await;
        info!(
            records = store.len(),
            max_retries = self.max_retries,
            "processor ready"
        );

        Ok(Processor::from_parts(ProcessorParts {
            store,
            connectivity,
            source,
            uploader,
            notifier: NotificationFanout::new(contacts, primary, self.fallback),
            clock,
            ids,
            backoff: self.backoff,
            attempt_timeout: self.attempt_timeout,
        }))
    }
}

impl Default for ProcessorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::{LogChannel, MemoryStore, SimulatedUploader, StaticContactDirectory};
    use crate::ports::{Contact, SourceError};
    use async_trait::async_trait;
    use rstest::rstest;

    struct EmptySource;

    #[async_trait]
    impl ArtifactSource for EmptySource {
        async fn resolve_bytes(&self, handle: &str) -> Result<Vec<u8>, SourceError> {
            Err(SourceError::NotFound(handle.to_string()))
        }
    }

    fn complete() -> ProcessorBuilder {
        ProcessorBuilder::new()
            .record_store(Arc::new(MemoryStore::new()))
            .source(Arc::new(EmptySource))
            .uploader(Arc::new(SimulatedUploader::default()))
            .contacts(Arc::new(StaticContactDirectory::new(Some(Contact::new(
                "+15550100",
            )))))
            .primary_channel(Arc::new(LogChannel))
    }

    #[tokio::test]
    async fn test_build_success() {
        let processor = complete().build().await;
        assert!(processor.is_ok());
    }

    #[tokio::test]
    async fn test_build_missing_uploader() {
        let builder = ProcessorBuilder::new()
            .record_store(Arc::new(MemoryStore::new()))
            .source(Arc::new(EmptySource))
            .contacts(Arc::new(StaticContactDirectory::new(None)))
            .primary_channel(Arc::new(LogChannel));

        assert!(matches!(
            builder.build().await,
            Err(BuildError::MissingCollaborator("uploader"))
        ));
    }

    #[tokio::test]
    async fn test_build_missing_everything_reports_store_first() {
        assert!(matches!(
            ProcessorBuilder::new().build().await,
            Err(BuildError::MissingCollaborator("record_store"))
        ));
    }

    #[tokio::test]
    async fn test_build_rejects_zero_timeout() {
        let result = complete().attempt_timeout(Duration::ZERO).build().await;
        assert!(matches!(result, Err(BuildError::InvalidSetting(_))));
    }

    #[rstest]
    #[case::zero_base(0, 2, "backoff base delay must be non-zero")]
    #[case::flat(1, 1, "backoff multiplier must be at least 2")]
    #[case::collapsing(1, 0, "backoff multiplier must be at least 2")]
    #[tokio::test]
    async fn test_build_rejects_non_increasing_backoff(
        #[case] backoff_base_secs: u64,
        #[case] backoff_multiplier: u32,
        #[case] reason: &str,
    ) {
        let config = QueueConfig {
            backoff_base_secs,
            backoff_multiplier,
            ..QueueConfig::default()
        };

        let result = complete().queue_config(&config).build().await;

        assert!(matches!(result, Err(BuildError::InvalidSetting(r)) if r == reason));
    }

    #[tokio::test]
    async fn test_build_loads_persisted_records() {
        let backend = Arc::new(MemoryStore::new());
        let first = complete().record_store(backend.clone()).build().await.unwrap();
        first
            .enqueue(crate::domain::ArtifactRef::new(
                crate::domain::ArtifactId::new("a1"),
                "a1.jpg",
                chrono::Utc::now(),
                "intruder",
            ))
            .await
            .unwrap();

        let second = complete().record_store(backend).build().await.unwrap();
        assert_eq!(second.pending_count().await, 1);
    }
}
