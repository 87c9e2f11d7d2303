//! Open order snapshotter.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use tradesync_store::Repository;
use tradesync_venue::ExchangeClient;

use crate::config::OrderSyncConfig;
use crate::error::SyncResult;
use crate::remote;
use crate::schedule::{CycleConfig, Worker};

pub struct OrderSnapshotter {
    venue: Arc<dyn ExchangeClient>,
    repo: Arc<dyn Repository>,
    config: OrderSyncConfig,
}

impl OrderSnapshotter {
    pub fn new(
        venue: Arc<dyn ExchangeClient>,
        repo: Arc<dyn Repository>,
        config: OrderSyncConfig,
    ) -> Self {
        Self {
            venue,
            repo,
            config,
        }
    }

    /// Replace the stored open orders with the venue's listing.
    ///
    /// A failed listing leaves the stored set unchanged.
    pub async fn snapshot(&self) -> SyncResult<usize> {
        let orders = remote::call("open_orders", self.venue.open_orders()).await?;
        let count = orders.len();
        self.repo.replace_open_orders(orders).await?;
        info!(open_orders = count, "Synced orders");
        Ok(count)
    }
}

#[async_trait]
impl Worker for OrderSnapshotter {
    fn name(&self) -> &'static str {
        "order_sync"
    }

    fn cycle(&self) -> CycleConfig {
        self.config.cycle()
    }

    async fn run_cycle(&self) -> SyncResult<()> {
        self.snapshot().await.map(|_| ())
    }
}
