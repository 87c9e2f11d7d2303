//! Live price feed.
//!
//! One task per subscribed symbol. The venue's tick channel holds only the
//! latest tick; the task samples it at most once per publish interval and
//! records it in the repository as the symbol's current price.

use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tradesync_core::Tick;
use tradesync_store::Repository;
use tradesync_telemetry::Metrics;
use tradesync_venue::{ExchangeClient, TickReceiver};

use crate::config::PriceFeedConfig;
use crate::error::SyncResult;
use crate::remote;

type Subscriptions = Arc<DashMap<String, JoinHandle<()>>>;

pub struct PriceFeed {
    venue: Arc<dyn ExchangeClient>,
    repo: Arc<dyn Repository>,
    subscriptions: Subscriptions,
    publish_interval: Duration,
    shutdown: CancellationToken,
}

impl PriceFeed {
    pub fn new(
        venue: Arc<dyn ExchangeClient>,
        repo: Arc<dyn Repository>,
        config: &PriceFeedConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            venue,
            repo,
            subscriptions: Arc::new(DashMap::new()),
            publish_interval: Duration::from_millis(config.publish_interval_ms.max(1)),
            shutdown,
        }
    }

    /// Start streaming ticks for `symbol`.
    ///
    /// Returns `false` when the symbol is already subscribed.
    pub async fn subscribe(&self, symbol: &str) -> SyncResult<bool> {
        if self.subscriptions.contains_key(symbol) {
            info!(symbol, "Already listening to ticks, not subscribing again");
            return Ok(false);
        }

        let rx = remote::call("subscribe", self.venue.subscribe_ticks(symbol)).await?;

        match self.subscriptions.entry(symbol.to_string()) {
            Entry::Occupied(_) => {
                debug!(symbol, "Subscribed concurrently, dropping duplicate stream");
                Ok(false)
            }
            Entry::Vacant(slot) => {
                let handle = tokio::spawn(stream_ticks(
                    symbol.to_string(),
                    rx,
                    self.repo.clone(),
                    self.subscriptions.clone(),
                    self.publish_interval,
                    self.shutdown.clone(),
                ));
                slot.insert(handle);
                Metrics::price_subscriptions_set(self.subscriptions.len());
                info!(symbol, "Subscribed to ticks");
                Ok(true)
            }
        }
    }

    /// Subscribe, logging instead of failing.
    pub async fn ensure_subscribed(&self, symbol: &str) {
        if let Err(e) = self.subscribe(symbol).await {
            warn!(symbol, error = %e, "Failed to subscribe to ticks");
        }
    }

    /// Subscribe every symbol in `symbols`.
    pub async fn subscribe_all(&self, symbols: &[String]) {
        for symbol in symbols {
            self.ensure_subscribed(symbol).await;
        }
    }

    pub fn is_subscribed(&self, symbol: &str) -> bool {
        self.subscriptions.contains_key(symbol)
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Wait for every subscription task to finish.
    ///
    /// Call after the shutdown token is cancelled.
    pub async fn join(&self) {
        let symbols: Vec<String> = self
            .subscriptions
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        for symbol in symbols {
            let Some((_, handle)) = self.subscriptions.remove(&symbol) else {
                continue;
            };
            if let Err(e) = handle.await {
                warn!(symbol = %symbol, error = %e, "Tick stream task failed");
            }
        }
    }
}

/// Record the latest tick for `symbol` at most once per `publish_interval`.
async fn stream_ticks(
    symbol: String,
    mut rx: TickReceiver,
    repo: Arc<dyn Repository>,
    subscriptions: Subscriptions,
    publish_interval: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(publish_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // The value present at subscription time counts as unseen.
    let mut pending: Option<Tick> = rx.borrow_and_update().clone();

    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }

        match rx.has_changed() {
            Ok(true) => pending = rx.borrow_and_update().clone(),
            Ok(false) => {}
            Err(_) => {
                warn!(symbol = %symbol, "Tick stream ended");
                break;
            }
        }

        if let Some(tick) = pending.take() {
            let price = tick.price;
            match repo.record_tick(tick).await {
                Ok(()) => {
                    Metrics::tick_recorded(&symbol);
                    debug!(symbol = %symbol, price, "Recorded tick");
                }
                Err(e) => warn!(symbol = %symbol, error = %e, "Failed to record tick"),
            }
        }
    }

    if !shutdown.is_cancelled() {
        subscriptions.remove(&symbol);
        Metrics::price_subscriptions_set(subscriptions.len());
    }
    info!(symbol = %symbol, "Tick stream stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{repo, MockVenue};
    use tokio::sync::watch;
    use tradesync_core::TickerPrice;
    use tradesync_venue::{ReplayFixture, ReplayVenue};

    fn feed(venue: Arc<dyn ExchangeClient>, repo: Arc<dyn Repository>) -> PriceFeed {
        PriceFeed::new(
            venue,
            repo,
            &PriceFeedConfig {
                publish_interval_ms: 100,
            },
            CancellationToken::new(),
        )
    }

    fn priced_venue() -> Arc<ReplayVenue> {
        Arc::new(ReplayVenue::new(ReplayFixture {
            prices: vec![TickerPrice {
                symbol: "BTCUSDT".to_string(),
                price: 50000.0,
            }],
            ..Default::default()
        }))
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribe_is_idempotent() {
        let feed = feed(priced_venue(), repo());
        assert!(feed.subscribe("BTCUSDT").await.unwrap());
        assert!(!feed.subscribe("BTCUSDT").await.unwrap());
        assert_eq!(feed.subscription_count(), 1);
        assert!(feed.is_subscribed("BTCUSDT"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_tick_recorded_at_bounded_rate() {
        let venue = priced_venue();
        let repo = repo();
        let feed = feed(venue.clone(), repo.clone());
        feed.subscribe("BTCUSDT").await.unwrap();

        // First interval tick fires immediately and records the initial price.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(
            repo.current_price("BTCUSDT").await.unwrap().map(|t| t.price),
            Some(50000.0)
        );

        // Several updates inside one interval collapse to the latest.
        venue.set_price("BTCUSDT", 50100.0);
        venue.set_price("BTCUSDT", 50200.0);
        assert_eq!(
            repo.current_price("BTCUSDT").await.unwrap().map(|t| t.price),
            Some(50000.0)
        );

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(
            repo.current_price("BTCUSDT").await.unwrap().map(|t| t.price),
            Some(50200.0)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_ended_stream_can_resubscribe() {
        let (tx, rx) = watch::channel(None);
        let mut venue = MockVenue::new();
        let mut first = Some(rx);
        venue.expect_subscribe_ticks().times(2).returning(move |_| {
            Ok(first.take().unwrap_or_else(|| watch::channel(None).1))
        });

        let feed = feed(Arc::new(venue), repo());
        assert!(feed.subscribe("ETHUSDT").await.unwrap());

        drop(tx);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!feed.is_subscribed("ETHUSDT"));

        assert!(feed.subscribe("ETHUSDT").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_join_after_cancel() {
        let token = CancellationToken::new();
        let feed = PriceFeed::new(
            priced_venue(),
            repo(),
            &PriceFeedConfig::default(),
            token.clone(),
        );
        feed.subscribe("BTCUSDT").await.unwrap();

        token.cancel();
        feed.join().await;
        assert_eq!(feed.subscription_count(), 0);
    }
}
