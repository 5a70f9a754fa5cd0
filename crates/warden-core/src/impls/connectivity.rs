//! ConnectivityOracle の実装

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::ports::ConnectivityOracle;

/// Always reports the network as reachable.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOnline;

#[async_trait]
impl ConnectivityOracle for AlwaysOnline {
    async fn is_reachable(&self) -> bool {
        true
    }
}

/// Issues a HEAD request; any HTTP answer (even an error status) counts as reachable.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
    url: String,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            timeout,
        }
    }
}

#[async_trait]
impl ConnectivityOracle for HttpProbe {
    async fn is_reachable(&self) -> bool {
        match self
            .client
            .head(&self.url)
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(_) => true,
            Err(e) => {
                debug!(url = %self.url, error = %e, "connectivity probe failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[tokio::test]
    async fn always_online_is_reachable() {
        assert!(AlwaysOnline.is_reachable().await);
    }

    #[rstest]
    #[case::unparseable("not a url")]
    #[case::refused("http://127.0.0.1:1/")]
    #[tokio::test]
    async fn failed_head_request_means_offline(#[case] url: &str) {
        let oracle = HttpProbe::new(url, Duration::from_millis(500));
        assert!(!oracle.is_reachable().await);
    }
}
