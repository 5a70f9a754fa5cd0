//! ConnectivityOracle port - ネットワーク到達性の判定

use async_trait::async_trait;

/// Yes/no network reachability check consulted at the start of every pass.
///
/// Being offline is not a failure: the pass simply ends without attempts and
/// no record is touched.
#[async_trait]
pub trait ConnectivityOracle: Send + Sync {
    async fn is_reachable(&self) -> bool;
}
