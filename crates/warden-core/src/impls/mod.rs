//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **JsonFileStore** / **MemoryStore**: RecordStore
//! - **FsArtifactSource**: ArtifactSource
//! - **SimulatedUploader** / **HttpUploader**: CloudUploader
//! - **WebhookChannel** / **LogChannel**: NotificationChannel
//! - **StaticContactDirectory**: ContactDirectory
//! - **AlwaysOnline** / **HttpProbe**: ConnectivityOracle

pub mod connectivity;
pub mod contacts;
pub mod fs_source;
pub mod http_uploader;
pub mod json_file_store;
pub mod log_channel;
pub mod memory_store;
pub mod simulated_uploader;
pub mod webhook_channel;

pub use self::connectivity::{AlwaysOnline, HttpProbe};
pub use self::contacts::StaticContactDirectory;
pub use self::fs_source::FsArtifactSource;
pub use self::http_uploader::HttpUploader;
pub use self::json_file_store::JsonFileStore;
pub use self::log_channel::LogChannel;
pub use self::memory_store::MemoryStore;
pub use self::simulated_uploader::SimulatedUploader;
pub use self::webhook_channel::WebhookChannel;
