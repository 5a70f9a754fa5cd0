//! Queue module: backoff policy and the persisted record store.

mod retry;
mod store;

pub use retry::BackoffPolicy;
pub use store::QueueStore;
