//! Notification ports - 人間への通知
//!
//! - `NotificationChannel`: 1 つの配送手段（primary / fallback それぞれ 1 実装）
//! - `ContactDirectory`: 通知先の解決

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Who gets told about a captured artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Channel-specific address (phone number, chat id, email, ...).
    pub address: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Contact {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("channel transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    async fn send(&self, contact: &Contact, message: &str) -> Result<(), ChannelError>;
}

#[async_trait]
pub trait ContactDirectory: Send + Sync {
    async fn primary_contact(&self) -> Option<Contact>;
}
