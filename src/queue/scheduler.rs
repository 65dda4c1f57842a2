use log::{debug, error, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::QueueProcessor;

/// Drives [`QueueProcessor::process_batch`] on a fixed interval
pub struct QueueScheduler {
    processor: Arc<QueueProcessor>,
    interval: Duration,
}

impl QueueScheduler {
    pub fn new(processor: Arc<QueueProcessor>) -> Self {
        let interval = processor.config().poll_interval();
        Self {
            processor,
            interval,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Process immediately, then once per interval until `cancel` fires.
    ///
    /// Cancellation is only observed between batches; a running batch is
    /// always finished.
    pub async fn run(&self, cancel: CancellationToken) {
        info!("queue processor started");
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("queue processor stopping");
                    return;
                }
                _ = ticker.tick() => self.tick().await,
            }
        }
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(cancel).await })
    }

    async fn tick(&self) {
        debug!("queue processor tick");
        match self.processor.process_batch().await {
            Ok(report) if report.fetched == 0 => debug!("Queue: empty"),
            Ok(report) => info!(
                "Queue: batch done, {} succeeded, {} failed",
                report.succeeded, report.failed
            ),
            Err(e) => error!("Queue: fetch error: {}", e),
        }
        self.processor.caches().purge_expired();
    }
}
