//! Test doubles shared by the integration tests.
#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use tokio::sync::Notify;

use warden_core::impls::{MemoryStore, StaticContactDirectory};
use warden_core::ports::{
    ArtifactSource, ChannelError, Clock, CloudUploader, ConnectivityOracle, Contact,
    FixedClock, NotificationChannel, SourceError, UploadError, UploadMetadata,
};
use warden_core::{ArtifactId, ArtifactRef, BackoffPolicy, Processor};

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
}

/// Artifact whose handle is `<id>.jpg`, captured a minute before `start()`.
pub fn artifact(id: &str) -> ArtifactRef {
    ArtifactRef::new(
        ArtifactId::new(id),
        format!("{id}.jpg"),
        start() - TimeDelta::minutes(1),
        "wrong_password",
    )
}

/// Uploader that replays a script, then succeeds for every further call.
#[derive(Default)]
pub struct ScriptedUploader {
    script: Mutex<VecDeque<Result<String, UploadError>>>,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl ScriptedUploader {
    pub fn new(script: Vec<Result<String, UploadError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn always_failing(n: usize) -> Arc<Self> {
        Self::new(
            (0..n)
                .map(|i| Err(UploadError::Transport(format!("connection reset #{i}"))))
                .collect(),
        )
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Artifact ids in the order they were uploaded.
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl CloudUploader for ScriptedUploader {
    async fn upload(
        &self,
        _bytes: Vec<u8>,
        metadata: &UploadMetadata,
    ) -> Result<String, UploadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(metadata.id.to_string());
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(format!("https://store.test/{}.jpg", metadata.id)))
    }
}

/// Uploader that blocks inside `upload` until released. The first
/// `open_calls` uploads go straight through.
#[derive(Default)]
pub struct GatedUploader {
    pub entered: Notify,
    pub release: Notify,
    open_calls: usize,
    calls: AtomicUsize,
}

impl GatedUploader {
    pub fn after(open_calls: usize) -> Arc<Self> {
        Arc::new(Self {
            open_calls,
            ..Self::default()
        })
    }
}

#[async_trait]
impl CloudUploader for GatedUploader {
    async fn upload(
        &self,
        _bytes: Vec<u8>,
        metadata: &UploadMetadata,
    ) -> Result<String, UploadError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) < self.open_calls {
            return Ok(format!("https://store.test/{}.jpg", metadata.id));
        }
        self.entered.notify_one();
        self.release.notified().await;
        Ok(format!("https://store.test/{}.jpg", metadata.id))
    }
}

/// Uploader that never answers within any reasonable timeout.
pub struct StuckUploader;

#[async_trait]
impl CloudUploader for StuckUploader {
    async fn upload(
        &self,
        _bytes: Vec<u8>,
        _metadata: &UploadMetadata,
    ) -> Result<String, UploadError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok("https://store.test/late.jpg".to_string())
    }
}

pub struct ToggleConnectivity(AtomicBool);

impl ToggleConnectivity {
    pub fn new(online: bool) -> Arc<Self> {
        Arc::new(Self(AtomicBool::new(online)))
    }

    pub fn set(&self, online: bool) {
        self.0.store(online, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConnectivityOracle for ToggleConnectivity {
    async fn is_reachable(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Source that knows `<id>.jpg` for every artifact except those marked missing.
#[derive(Default)]
pub struct MapSource {
    missing: Mutex<HashSet<String>>,
}

impl MapSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn mark_missing(&self, handle: &str) {
        self.missing.lock().unwrap().insert(handle.to_string());
    }
}

#[async_trait]
impl ArtifactSource for MapSource {
    async fn resolve_bytes(&self, handle: &str) -> Result<Vec<u8>, SourceError> {
        if self.missing.lock().unwrap().contains(handle) {
            return Err(SourceError::NotFound(handle.to_string()));
        }
        Ok(handle.as_bytes().to_vec())
    }
}

pub struct RecordingChannel {
    name: &'static str,
    ok: bool,
    pub messages: Mutex<Vec<(String, String)>>,
}

impl RecordingChannel {
    pub fn new(name: &'static str, ok: bool) -> Arc<Self> {
        Arc::new(Self {
            name,
            ok,
            messages: Mutex::new(Vec::new()),
        })
    }

    pub fn sent(&self) -> usize {
        self.messages.lock().unwrap().len()
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    fn name(&self) -> &str {
        self.name
    }

    async fn send(&self, contact: &Contact, message: &str) -> Result<(), ChannelError> {
        self.messages
            .lock()
            .unwrap()
            .push((contact.address.clone(), message.to_string()));
        if self.ok {
            Ok(())
        } else {
            Err(ChannelError::Delivery(format!("{} is down", self.name)))
        }
    }
}

/// Fully wired processor over in-memory doubles.
pub struct Harness {
    pub processor: Arc<Processor>,
    pub backend: Arc<MemoryStore>,
    pub clock: FixedClock,
    pub connectivity: Arc<ToggleConnectivity>,
    pub source: Arc<MapSource>,
    pub primary: Arc<RecordingChannel>,
    pub fallback: Arc<RecordingChannel>,
}

pub struct HarnessOptions {
    pub uploader: Arc<dyn CloudUploader>,
    pub contact: Option<Contact>,
    pub primary_ok: bool,
    pub fallback_ok: bool,
    pub max_retries: u32,
    pub attempt_timeout: Duration,
    pub backend: Arc<MemoryStore>,
}

impl HarnessOptions {
    pub fn new(uploader: Arc<dyn CloudUploader>) -> Self {
        Self {
            uploader,
            contact: Some(Contact::new("+15550100")),
            primary_ok: true,
            fallback_ok: true,
            max_retries: 5,
            attempt_timeout: Duration::from_secs(5),
            backend: Arc::new(MemoryStore::new()),
        }
    }
}

impl Harness {
    pub async fn with_uploader(uploader: Arc<dyn CloudUploader>) -> Self {
        Self::build(HarnessOptions::new(uploader)).await
    }

    pub async fn build(options: HarnessOptions) -> Self {
        let clock = FixedClock::new(start());
        let connectivity = ToggleConnectivity::new(true);
        let source = MapSource::new();
        let primary = RecordingChannel::new("sms", options.primary_ok);
        let fallback = RecordingChannel::new("email", options.fallback_ok);

        let processor = Processor::builder()
            .record_store(options.backend.clone())
            .source(source.clone())
            .uploader(options.uploader)
            .contacts(Arc::new(StaticContactDirectory::new(options.contact)))
            .primary_channel(primary.clone())
            .fallback_channel(fallback.clone())
            .connectivity(connectivity.clone())
            .clock(Arc::new(clock.clone()))
            .max_retries(options.max_retries)
            .backoff(BackoffPolicy::default())
            .attempt_timeout(options.attempt_timeout)
            .build()
            .await
            .unwrap();

        Self {
            processor: Arc::new(processor),
            backend: options.backend,
            clock,
            connectivity,
            source,
            primary,
            fallback,
        }
    }

    pub fn advance_secs(&self, secs: i64) {
        self.clock.advance(TimeDelta::seconds(secs));
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
