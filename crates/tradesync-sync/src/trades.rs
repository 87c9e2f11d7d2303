//! Trade history synchronizer.
//!
//! The venue offers two one-directional cursors over a symbol's fills, so
//! history is assembled from both ends:
//!
//! - **Backward**: pages ending one millisecond before the oldest stored
//!   trade (or now, when nothing is stored) until an empty page marks the
//!   backfill complete. The flag is persisted and never cleared.
//! - **Forward**: pages starting one order id past the newest stored trade
//!   until an empty page shows the head was reached.
//!
//! All symbols share one call budget per cycle and are visited round-robin
//! by least-recent download time. Cursors are always derived from stored
//! trades, so a failed call leaves nothing to roll back.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use tradesync_core::{now_ms, Fill, Trade};
use tradesync_position::realized_incomes;
use tradesync_store::Repository;
use tradesync_telemetry::Metrics;
use tradesync_venue::{ExchangeClient, FillQuery, SymbolCatalog};

use crate::config::TradeSyncConfig;
use crate::error::SyncResult;
use crate::remote;
use crate::schedule::{CycleConfig, Worker};

/// Work done for one symbol in one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SymbolTurn {
    pub calls: usize,
    pub backward_stored: usize,
    pub forward_stored: usize,
    /// An empty backward page was observed this turn.
    pub backfill_completed: bool,
    /// An empty forward page was observed this turn.
    pub head_reached: bool,
    pub incomes_recomputed: bool,
}

/// Outcome of one synchronizer cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Symbols visited, in order.
    pub symbols: Vec<String>,
    /// Symbols whose turn was cut short by a failed call.
    pub failed: Vec<String>,
    pub calls: usize,
    pub stored: usize,
}

pub struct TradeSynchronizer {
    venue: Arc<dyn ExchangeClient>,
    repo: Arc<dyn Repository>,
    catalog: Arc<SymbolCatalog>,
    config: TradeSyncConfig,
    /// Symbols whose stored incomes match their stored trades.
    reconciled: Mutex<HashSet<String>>,
}

impl TradeSynchronizer {
    pub fn new(
        venue: Arc<dyn ExchangeClient>,
        repo: Arc<dyn Repository>,
        catalog: Arc<SymbolCatalog>,
        config: TradeSyncConfig,
    ) -> Self {
        Self {
            venue,
            repo,
            catalog,
            config,
            reconciled: Mutex::new(HashSet::new()),
        }
    }

    /// Run one cycle over the queued symbols.
    pub async fn sync_cycle(&self) -> SyncResult<CycleReport> {
        let mut report = CycleReport::default();
        let mut budget = self.config.call_budget;
        let mut visited = HashSet::new();

        while budget > 0 {
            let Some(symbol) = self.repo.next_traded_symbol().await? else {
                break;
            };
            if !visited.insert(symbol.clone()) {
                break;
            }
            self.repo.record_last_downloaded(&symbol, now_ms()).await?;

            let before = budget;
            match self.sync_symbol(&symbol, &mut budget).await {
                Ok(turn) => {
                    report.stored += turn.backward_stored + turn.forward_stored;
                }
                Err(e) if e.is_transient() => {
                    warn!(symbol = %symbol, error = %e, "Trade sync aborted for symbol");
                    report.failed.push(symbol.clone());
                }
                Err(e) => return Err(e),
            }
            report.calls += before - budget;
            report.symbols.push(symbol);
        }

        info!(
            symbols = report.symbols.len(),
            failed = report.failed.len(),
            calls = report.calls,
            stored = report.stored,
            "Synced trades"
        );
        Ok(report)
    }

    /// Run one symbol's turn, spending calls from `budget`.
    pub async fn sync_symbol(&self, symbol: &str, budget: &mut usize) -> SyncResult<SymbolTurn> {
        let asset = self.catalog.base_asset(symbol)?.to_string();
        let page_size = self.config.page_size;
        let mut turn = SymbolTurn::default();

        // Backward scan
        let mut backfill_complete = self.repo.sync_state(symbol).await?.backfill_complete;
        if !backfill_complete {
            let mut end_ms = match self.repo.oldest_trade(symbol).await? {
                Some(oldest) => oldest.timestamp_ms - 1,
                None => now_ms(),
            };
            while !backfill_complete && *budget > 0 {
                *budget -= 1;
                turn.calls += 1;
                let fills = remote::call(
                    "my_fills",
                    self.venue
                        .my_fills(&FillQuery::ending_at(symbol, end_ms, page_size)),
                )
                .await?;
                debug!(symbol, end_ms, fetched = fills.len(), "Fetched older fills");

                if fills.is_empty() {
                    self.repo.mark_backfill_complete(symbol).await?;
                    Metrics::backfill_complete(symbol);
                    info!(symbol, "Reached first trade");
                    backfill_complete = true;
                    turn.backfill_completed = true;
                    break;
                }

                turn.backward_stored += self.store_fills(symbol, &asset, &fills, "backward").await?;
                end_ms = fills.iter().map(|f| f.time_ms).min().unwrap_or(end_ms) - 1;
            }
        }

        // Forward scan
        if backfill_complete {
            let mut from_id = self
                .repo
                .newest_trade(symbol)
                .await?
                .map_or(0, |newest| newest.order_id)
                + 1;
            while *budget > 0 {
                *budget -= 1;
                turn.calls += 1;
                let fills = remote::call(
                    "my_fills",
                    self.venue
                        .my_fills(&FillQuery::from_order_id(symbol, from_id, page_size)),
                )
                .await?;
                debug!(symbol, from_id, fetched = fills.len(), "Fetched newer fills");

                if fills.is_empty() {
                    turn.head_reached = true;
                    break;
                }

                turn.forward_stored += self.store_fills(symbol, &asset, &fills, "forward").await?;
                from_id = fills
                    .iter()
                    .map(|f| f.order_id + 1)
                    .max()
                    .map_or(from_id, |next| next.max(from_id));
            }
        }

        if turn.backward_stored + turn.forward_stored > 0 {
            self.reconciled.lock().remove(symbol);
        }
        let stale = !self.reconciled.lock().contains(symbol);
        if turn.head_reached && stale {
            self.recompute_incomes(symbol).await?;
            turn.incomes_recomputed = true;
        }

        Ok(turn)
    }

    /// Replace a symbol's incomes with a replay of its stored trades.
    async fn recompute_incomes(&self, symbol: &str) -> SyncResult<()> {
        let trades = self.repo.trades(symbol).await?;
        let (incomes, position) = realized_incomes(&trades);
        self.repo.replace_incomes(symbol, &incomes).await?;
        self.reconciled.lock().insert(symbol.to_string());

        Metrics::incomes_recomputed(symbol);
        info!(
            symbol,
            trades = trades.len(),
            incomes = incomes.len(),
            size = position.size,
            avg_price = position.avg_price,
            "Recomputed incomes"
        );
        Ok(())
    }

    /// Convert and upsert a page of fills. Returns how many were new.
    async fn store_fills(
        &self,
        symbol: &str,
        asset: &str,
        fills: &[Fill],
        direction: &str,
    ) -> SyncResult<usize> {
        let mut trades = Vec::with_capacity(fills.len());
        for fill in fills {
            match Trade::from_fill(fill, asset) {
                Ok(trade) => trades.push(trade),
                Err(e) => {
                    warn!(symbol, order_id = fill.order_id, error = %e, "Rejected fill");
                    Metrics::fill_rejected(symbol);
                }
            }
        }

        let inserted = self.repo.upsert_trades(&trades).await?;
        Metrics::trades_stored(symbol, direction, inserted);
        debug!(symbol, direction, received = fills.len(), inserted, "Stored fills");
        Ok(inserted)
    }
}

#[async_trait]
impl Worker for TradeSynchronizer {
    fn name(&self) -> &'static str {
        "trade_sync"
    }

    fn cycle(&self) -> CycleConfig {
        self.config.cycle()
    }

    async fn run_cycle(&self) -> SyncResult<()> {
        self.sync_cycle().await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{btc_history, catalog, fill, replay, repo, MockVenue};
    use mockall::Sequence;
    use tradesync_store::MemoryRepository;
    use tradesync_venue::{ReplayVenue, VenueError};

    fn config(page_size: usize, call_budget: usize) -> TradeSyncConfig {
        TradeSyncConfig {
            page_size,
            call_budget,
            ..Default::default()
        }
    }

    fn synchronizer(
        venue: Arc<dyn ExchangeClient>,
        repo: Arc<MemoryRepository>,
        config: TradeSyncConfig,
    ) -> TradeSynchronizer {
        TradeSynchronizer::new(venue, repo, catalog(), config)
    }

    async fn queued(symbols: &[&str]) -> Arc<MemoryRepository> {
        let repo = repo();
        for symbol in symbols {
            repo.mark_symbol_traded(symbol).await.unwrap();
        }
        repo
    }

    #[tokio::test]
    async fn test_backward_scan_converges() {
        let venue: Arc<ReplayVenue> = replay(btc_history(2500));
        let repo = queued(&["BTCUSDT"]).await;
        let sync = synchronizer(venue, repo.clone(), config(1000, 10));

        let mut budget = 10;
        let turn = sync.sync_symbol("BTCUSDT", &mut budget).await.unwrap();

        // 3 full-or-partial pages, 1 empty page, 1 empty forward page.
        assert_eq!(turn.backward_stored, 2500);
        assert!(turn.backfill_completed);
        assert!(turn.head_reached);
        assert!(turn.incomes_recomputed);
        assert_eq!(turn.calls, 5);
        assert_eq!(budget, 5);
        assert_eq!(repo.trade_count(), 2500);
        assert!(repo.sync_state("BTCUSDT").await.unwrap().backfill_complete);
    }

    #[tokio::test]
    async fn test_empty_backward_page_requested_once() {
        let mut venue = MockVenue::new();
        let mut seq = Sequence::new();
        venue
            .expect_my_fills()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|query| {
                assert!(query.end_time_ms.is_some());
                Ok(vec![fill("BTCUSDT", 7, 5000, true, 100.0)])
            });
        venue
            .expect_my_fills()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|query| {
                assert_eq!(query.end_time_ms, Some(4999));
                Ok(Vec::new())
            });
        venue
            .expect_my_fills()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|query| {
                assert!(query.end_time_ms.is_none());
                assert_eq!(query.from_order_id, Some(8));
                Ok(Vec::new())
            });

        let repo = queued(&["BTCUSDT"]).await;
        let sync = synchronizer(Arc::new(venue), repo.clone(), config(1000, 10));

        sync.sync_cycle().await.unwrap();
        // Second cycle goes straight to the forward scan.
        sync.sync_cycle().await.unwrap();
        assert_eq!(repo.trade_count(), 1);
    }

    #[tokio::test]
    async fn test_forward_resumes_after_newest_order_id() {
        let venue = replay(btc_history(3));
        let repo = queued(&["BTCUSDT"]).await;
        let sync = synchronizer(venue.clone(), repo.clone(), config(1000, 10));
        sync.sync_cycle().await.unwrap();
        assert_eq!(repo.trade_count(), 3);

        venue.push_fill(fill("BTCUSDT", 4, 4000, false, 150.0));
        venue.push_fill(fill("BTCUSDT", 5, 5000, false, 50.0));

        let report = sync.sync_cycle().await.unwrap();
        assert_eq!(report.stored, 2);
        assert_eq!(report.calls, 2);
        assert_eq!(repo.trade_count(), 5);

        let incomes = repo.incomes("BTCUSDT").await.unwrap();
        assert_eq!(incomes.len(), 2);
        assert!((incomes[0].amount - 50.0).abs() < 1e-9);
        assert!((incomes[1].amount + 50.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_first_forward_request_uses_max_order_id_plus_one() {
        let repo = queued(&["BTCUSDT"]).await;
        repo.mark_backfill_complete("BTCUSDT").await.unwrap();
        let trades: Vec<Trade> = [(41, 3000), (17, 9000), (29, 1000)]
            .iter()
            .map(|&(id, ts)| Trade::from_fill(&fill("BTCUSDT", id, ts, true, 1.0), "BTC").unwrap())
            .collect();
        repo.upsert_trades(&trades).await.unwrap();

        let mut venue = MockVenue::new();
        venue.expect_my_fills().times(1).returning(|query| {
            assert_eq!(query.from_order_id, Some(42));
            Ok(Vec::new())
        });

        let sync = synchronizer(Arc::new(venue), repo, config(1000, 10));
        let report = sync.sync_cycle().await.unwrap();
        assert_eq!(report.calls, 1);
    }

    #[tokio::test]
    async fn test_failed_call_leaves_state_untouched() {
        let repo = queued(&["BTCUSDT", "ETHUSDT"]).await;

        let mut venue = MockVenue::new();
        venue.expect_my_fills().returning(|query| {
            if query.symbol == "BTCUSDT" {
                Err(VenueError::RateLimited("429".to_string()))
            } else {
                Ok(Vec::new())
            }
        });

        let sync = synchronizer(Arc::new(venue), repo.clone(), config(1000, 10));
        let report = sync.sync_cycle().await.unwrap();

        assert_eq!(report.failed, vec!["BTCUSDT".to_string()]);
        assert_eq!(report.symbols.len(), 2);
        assert!(!repo.sync_state("BTCUSDT").await.unwrap().backfill_complete);
        assert!(repo.oldest_trade("BTCUSDT").await.unwrap().is_none());
        // The healthy symbol still completed its turn.
        assert!(repo.sync_state("ETHUSDT").await.unwrap().backfill_complete);
    }

    #[tokio::test]
    async fn test_budget_shared_round_robin() {
        let mut fills = btc_history(5);
        fills.extend((1..=5).map(|i| fill("ETHUSDT", i, i as i64 * 1000, true, 10.0)));
        let venue = replay(fills);
        let repo = queued(&["BTCUSDT", "ETHUSDT"]).await;
        let sync = synchronizer(venue, repo.clone(), config(2, 4));

        // Budget 4, page 2: BTCUSDT takes every call.
        let first = sync.sync_cycle().await.unwrap();
        assert_eq!(first.symbols, vec!["BTCUSDT".to_string()]);
        assert_eq!(first.calls, 4);

        // Least recently downloaded goes next.
        let second = sync.sync_cycle().await.unwrap();
        assert_eq!(second.symbols[0], "ETHUSDT");

        for _ in 0..4 {
            sync.sync_cycle().await.unwrap();
        }
        assert_eq!(repo.trades("BTCUSDT").await.unwrap().len(), 5);
        assert_eq!(repo.trades("ETHUSDT").await.unwrap().len(), 5);
        assert!(repo.sync_state("ETHUSDT").await.unwrap().backfill_complete);
    }

    #[tokio::test]
    async fn test_invalid_fills_rejected() {
        let mut bad = fill("BTCUSDT", 2, 2000, true, 100.0);
        bad.quantity = 0.0;
        let venue = replay(vec![fill("BTCUSDT", 1, 1000, true, 100.0), bad]);
        let repo = queued(&["BTCUSDT"]).await;
        let sync = synchronizer(venue, repo.clone(), config(1000, 10));

        sync.sync_cycle().await.unwrap();
        assert_eq!(repo.trade_count(), 1);
        assert!(repo.sync_state("BTCUSDT").await.unwrap().backfill_complete);
    }

    #[tokio::test]
    async fn test_reingestion_is_idempotent() {
        let venue = replay(btc_history(10));
        let repo = queued(&["BTCUSDT"]).await;
        let sync = synchronizer(venue.clone(), repo.clone(), config(1000, 10));
        sync.sync_cycle().await.unwrap();
        let incomes_before = repo.incomes("BTCUSDT").await.unwrap();

        // A fresh synchronizer over the same store re-fetches nothing new.
        let again = synchronizer(venue, repo.clone(), config(1000, 10));
        let report = again.sync_cycle().await.unwrap();
        assert_eq!(report.stored, 0);
        assert_eq!(repo.trade_count(), 10);
        assert_eq!(repo.incomes("BTCUSDT").await.unwrap(), incomes_before);
    }

    #[tokio::test]
    async fn test_unknown_symbol_skipped() {
        let repo = queued(&["DOGEUSDT"]).await;
        let mut venue = MockVenue::new();
        venue.expect_my_fills().never();

        let sync = synchronizer(Arc::new(venue), repo, config(1000, 10));
        let report = sync.sync_cycle().await.unwrap();
        assert_eq!(report.failed, vec!["DOGEUSDT".to_string()]);
    }
}
