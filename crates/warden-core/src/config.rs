//! Configuration.
//!
//! Every field has a default, so an empty JSON object (or no file at all) is a
//! valid configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::DEFAULT_MAX_RETRIES;
use crate::ports::Contact;
use crate::queue::BackoffPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    pub queue: QueueConfig,
    pub source: SourceConfig,
    pub uploader: UploaderConfig,
    pub notify: NotifyConfig,
    pub connectivity: ConnectivityConfig,
}

impl WardenConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Queue and processor tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub max_retries: u32,
    pub backoff_base_secs: u64,
    pub backoff_multiplier: u32,
    pub process_interval_secs: u64,
    pub attempt_timeout_secs: u64,
    pub store_path: PathBuf,
}

impl QueueConfig {
    pub fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy::new(
            Duration::from_secs(self.backoff_base_secs),
            self.backoff_multiplier,
        )
    }

    pub fn process_interval(&self) -> Duration {
        Duration::from_secs(self.process_interval_secs)
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs)
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_secs: 1,
            backoff_multiplier: 2,
            process_interval_secs: 5 * 60,
            attempt_timeout_secs: 60,
            store_path: PathBuf::from("warden-queue.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Directory that source handles are resolved against.
    pub root: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UploaderConfig {
    #[default]
    Simulated,
    Http {
        endpoint: String,
        #[serde(default)]
        token: Option<String>,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub contact: Option<Contact>,
    /// Primary channel webhook. When unset the primary channel only logs.
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConnectivityConfig {
    #[default]
    Always,
    Probe {
        url: String,
        #[serde(default = "default_probe_timeout_secs")]
        timeout_secs: u64,
    },
}

fn default_probe_timeout_secs() -> u64 {
    5
}
