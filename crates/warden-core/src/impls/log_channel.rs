//! LogChannel - 通知内容を tracing に出すだけのチャネル（開発用 fallback）

use async_trait::async_trait;
use tracing::info;

use crate::ports::{ChannelError, Contact, NotificationChannel};

#[derive(Debug, Clone, Default)]
pub struct LogChannel;

#[async_trait]
impl NotificationChannel for LogChannel {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, contact: &Contact, message: &str) -> Result<(), ChannelError> {
        info!(target: "warden::notify", to = %contact.address, "{message}");
        Ok(())
    }
}
