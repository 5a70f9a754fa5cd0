//! NotificationFanout - アップロード完了を人間に知らせる
//!
//! Primary と fallback は独立に試行し、どちらかが成功すれば配送成功とみなします。
//! 結果はアップロードの状態には影響しません（呼び出し側はログに残すだけ）。

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::ArtifactRef;
use crate::ports::{Contact, ContactDirectory, NotificationChannel};

/// What happened when announcing one uploaded artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationReport {
    /// No contact is configured; no channel was attempted.
    NoContact,
    Attempted {
        primary: bool,
        /// `None` when no fallback channel is configured.
        fallback: Option<bool>,
    },
}

impl NotificationReport {
    pub fn delivered(&self) -> bool {
        match self {
            NotificationReport::NoContact => false,
            NotificationReport::Attempted { primary, fallback } => {
                *primary || fallback.unwrap_or(false)
            }
        }
    }
}

pub struct NotificationFanout {
    contacts: Arc<dyn ContactDirectory>,
    primary: Arc<dyn NotificationChannel>,
    fallback: Option<Arc<dyn NotificationChannel>>,
}

impl NotificationFanout {
    pub fn new(
        contacts: Arc<dyn ContactDirectory>,
        primary: Arc<dyn NotificationChannel>,
        fallback: Option<Arc<dyn NotificationChannel>>,
    ) -> Self {
        Self {
            contacts,
            primary,
            fallback,
        }
    }

    pub async fn notify(&self, url: &str, artifact: &ArtifactRef) -> NotificationReport {
        let Some(contact) = self.contacts.primary_contact().await else {
            warn!(artifact_id = %artifact.id(), "no contact configured; notification skipped");
            return NotificationReport::NoContact;
        };

        let message = compose_message(url, artifact);

        let primary = send_one(self.primary.as_ref(), &contact, &message).await;
        let fallback = match &self.fallback {
            Some(channel) => Some(send_one(channel.as_ref(), &contact, &message).await),
            None => None,
        };

        NotificationReport::Attempted { primary, fallback }
    }
}

async fn send_one(
    channel: &dyn NotificationChannel,
    contact: &Contact,
    message: &str,
) -> bool {
    match channel.send(contact, message).await {
        Ok(()) => {
            debug!(channel = channel.name(), to = %contact.address, "notification sent");
            true
        }
        Err(e) => {
            warn!(channel = channel.name(), error = %e, "notification channel failed");
            false
        }
    }
}

/// Human-readable alert text for an uploaded artifact.
pub fn compose_message(url: &str, artifact: &ArtifactRef) -> String {
    let mut message = format!(
        "Security alert: photo captured {} (reason: {}).\nView: {}",
        artifact.captured_at().to_rfc3339(),
        artifact.reason(),
        url
    );
    if let Some(location) = artifact.location() {
        message.push_str(&format!(
            "\nLocation: {} (±{}m)",
            location.map_link(),
            location.accuracy
        ));
    }
    message
}
