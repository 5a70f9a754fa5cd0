//! WebhookChannel - JSON を POST する通知チャネル
//!
//! Body: `{ "to": <contact address>, "name": <contact name?>, "text": <message> }`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::ports::{ChannelError, Contact, NotificationChannel};

#[derive(Debug, Serialize)]
struct WebhookBody<'a> {
    to: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    text: &'a str,
}

#[derive(Debug, Clone)]
pub struct WebhookChannel {
    client: Client,
    name: String,
    url: String,
}

impl WebhookChannel {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            name: name.into(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, contact: &Contact, message: &str) -> Result<(), ChannelError> {
        let body = WebhookBody {
            to: &contact.address,
            name: contact.name.as_deref(),
            text: message,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChannelError::Delivery(format!("webhook answered {status}")));
        }
        Ok(())
    }
}
