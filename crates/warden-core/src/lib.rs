//! warden-core
//!
//! Durable, at-least-once upload queue for evidence artifacts (security photos).
//!
//! # モジュール構成
//! - **domain**: artifact references, queue records, upload status, errors
//! - **ports**: collaborator traits (record store backend, artifact source, uploader,
//!   notification channels, connectivity, clock, ids)
//! - **queue**: backoff policy and the persisted queue store
//! - **app**: processor, notification fan-out, scheduler, builder
//! - **impls**: adapters (JSON file store, simulated/HTTP uploader, webhook channel, ...)
//! - **config**: serde-backed configuration

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod queue;

pub use app::{
    AttemptOutcome, BuildError, NotificationFanout, NotificationReport, PassOutcome, PassReport,
    Processor, ProcessorBuilder, QueueCounts, Scheduler, SchedulerHandle,
};
pub use config::WardenConfig;
pub use domain::{
    ArtifactId, ArtifactRef, GeoLocation, PassId, QueueRecord, RecordId, UploadStatus,
    WardenError,
};
pub use queue::{BackoffPolicy, QueueStore};
