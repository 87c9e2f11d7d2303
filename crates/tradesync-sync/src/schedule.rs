//! Periodic worker runtime.
//!
//! A [`Worker`] performs one cycle at a time. [`run_worker`] repeats the
//! cycle until the shutdown token is cancelled, sleeping `interval + jitter`
//! between cycles. A failed cycle is logged and counted; the loop never
//! exits on error.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use tradesync_telemetry::Metrics;

use crate::error::SyncResult;

/// Delay between cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleConfig {
    pub interval_ms: u64,
    /// Upper bound of the uniform random delay added to each interval.
    pub jitter_ms: u64,
}

impl CycleConfig {
    pub fn new(interval_ms: u64, jitter_ms: u64) -> Self {
        Self {
            interval_ms,
            jitter_ms,
        }
    }

    /// Delay before the next cycle.
    pub fn next_delay(&self) -> Duration {
        let jitter = if self.jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=self.jitter_ms)
        };
        Duration::from_millis(self.interval_ms.saturating_add(jitter))
    }
}

/// A periodic unit of work.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Name used in logs and metric labels.
    fn name(&self) -> &'static str;

    fn cycle(&self) -> CycleConfig;

    /// Run a single cycle.
    async fn run_cycle(&self) -> SyncResult<()>;
}

/// Run `worker` until `shutdown` is cancelled.
///
/// A cycle in flight when shutdown arrives is dropped at its next await
/// point.
pub async fn run_worker(worker: Arc<dyn Worker>, shutdown: CancellationToken) {
    let name = worker.name();
    let cycle = worker.cycle();
    info!(
        worker = name,
        interval_ms = cycle.interval_ms,
        jitter_ms = cycle.jitter_ms,
        "Worker started"
    );

    loop {
        let result = tokio::select! {
            result = worker.run_cycle() => result,
            () = shutdown.cancelled() => break,
        };

        match result {
            Ok(()) => {
                debug!(worker = name, "Cycle complete");
                Metrics::worker_cycle(name, true);
            }
            Err(e) => {
                error!(worker = name, error = %e, "Cycle failed");
                Metrics::worker_cycle(name, false);
            }
        }

        tokio::select! {
            () = tokio::time::sleep(cycle.next_delay()) => {}
            () = shutdown.cancelled() => break,
        }
    }

    info!(worker = name, "Worker stopped");
}

/// Spawn `worker` on the runtime.
pub fn spawn_worker(worker: Arc<dyn Worker>, shutdown: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(run_worker(worker, shutdown))
}
