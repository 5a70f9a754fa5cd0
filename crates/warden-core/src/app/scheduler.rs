//! Scheduler - 定期的に `Processor::process_once` を起動する
//!
//! - interval ごとに 1 pass
//! - `wake()` で即時 pass（アプリ起動時・ネットワーク復帰時など）
//! - pass 同士の重複は Processor 側の single-flight guard が防ぐ

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::processor::Processor;

pub struct Scheduler {
    processor: Arc<Processor>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(processor: Arc<Processor>, interval: Duration) -> Self {
        Self {
            processor,
            interval,
        }
    }

    /// Spawn the periodic loop. The first pass runs immediately.
    pub fn start(self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let wake = Arc::new(Notify::new());

        let join = tokio::spawn(scheduler_loop(
            self.processor,
            self.interval,
            Arc::clone(&wake),
            shutdown_rx,
        ));

        SchedulerHandle {
            shutdown_tx,
            wake,
            join,
        }
    }
}

/// Handle to a running scheduler.
/// - drop しても loop は止まる（sender が消えると `changed()` が Err になる）
/// - `shutdown()` は実行中の pass が終わるまで待つ
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    wake: Arc<Notify>,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Trigger a pass now instead of waiting for the next tick.
    pub fn wake(&self) {
        self.wake.notify_one();
    }

    pub fn request_shutdown(&self) {
        // receiver may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn shutdown(self) {
        self.request_shutdown();
        let _ = self.join.await;
    }
}

async fn scheduler_loop(
    processor: Arc<Processor>,
    interval: Duration,
    wake: Arc<Notify>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    // tokio::time::interval panics on a zero period
    let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(interval_secs = interval.as_secs(), "scheduler started");

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
            _ = ticker.tick() => {}
            _ = wake.notified() => debug!("scheduler woken"),
        }

        let report = processor.process_once().await;
        debug!(pass_id = %report.pass_id, outcome = ?report.outcome, "scheduled pass done");
    }

    info!("scheduler stopped");
}
