//! Symbol discovery.
//!
//! Walks the catalog's tradable symbols and asks the venue whether the
//! account has ever filled on each. Lookups are capped per pass so the
//! universe is covered gradually without bursting the venue's rate limit.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use tradesync_store::Repository;
use tradesync_venue::{ExchangeClient, FillQuery, SymbolCatalog};

use crate::config::DiscoveryConfig;
use crate::error::SyncResult;
use crate::remote;
use crate::schedule::{CycleConfig, Worker};

/// Outcome of one discovery pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryPass {
    /// History lookups issued.
    pub probes: usize,
    /// Symbols newly queued for trade sync.
    pub found: usize,
}

pub struct SymbolDiscovery {
    venue: Arc<dyn ExchangeClient>,
    repo: Arc<dyn Repository>,
    catalog: Arc<SymbolCatalog>,
    config: DiscoveryConfig,
}

impl SymbolDiscovery {
    pub fn new(
        venue: Arc<dyn ExchangeClient>,
        repo: Arc<dyn Repository>,
        catalog: Arc<SymbolCatalog>,
        config: DiscoveryConfig,
    ) -> Self {
        Self {
            venue,
            repo,
            catalog,
            config,
        }
    }

    /// Run one pass over the symbol universe.
    ///
    /// A symbol is marked checked only after its lookup succeeds. A failed
    /// lookup ends the pass; the symbol is retried next pass.
    pub async fn discover(&self) -> SyncResult<DiscoveryPass> {
        let mut pass = DiscoveryPass::default();

        for info in self.catalog.trading() {
            if pass.probes >= self.config.probes_per_pass {
                break;
            }
            let symbol = info.symbol.as_str();
            if self.repo.is_symbol_checked(symbol).await?
                || self.repo.is_symbol_traded(symbol).await?
            {
                continue;
            }

            pass.probes += 1;
            let fills = remote::call("my_fills", self.venue.my_fills(&FillQuery::probe(symbol)))
                .await?;
            self.repo.mark_symbol_checked(symbol).await?;

            if !fills.is_empty() {
                info!(symbol, "Trades found, adding to sync list");
                self.repo.mark_symbol_traded(symbol).await?;
                pass.found += 1;
            }
        }

        info!(probes = pass.probes, found = pass.found, "Updated new traded symbols");
        Ok(pass)
    }
}

#[async_trait]
impl Worker for SymbolDiscovery {
    fn name(&self) -> &'static str {
        "symbol_discovery"
    }

    fn cycle(&self) -> CycleConfig {
        self.config.cycle()
    }

    async fn run_cycle(&self) -> SyncResult<()> {
        self.discover().await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use crate::testing::{catalog, fill, repo, MockVenue};
    use tradesync_venue::VenueError;

    fn discovery(venue: MockVenue, repo: Arc<dyn Repository>) -> SymbolDiscovery {
        SymbolDiscovery::new(Arc::new(venue), repo, catalog(), DiscoveryConfig::default())
    }

    #[tokio::test]
    async fn test_three_probes_per_pass() {
        let mut venue = MockVenue::new();
        venue
            .expect_my_fills()
            .times(3)
            .returning(|query| {
                assert_eq!(query.limit, 1);
                if query.symbol == "ETHUSDT" {
                    Ok(vec![fill("ETHUSDT", 1, 1000, true, 10.0)])
                } else {
                    Ok(Vec::new())
                }
            });

        let repo = repo();
        let pass = discovery(venue, repo.clone()).discover().await.unwrap();

        assert_eq!(pass, DiscoveryPass { probes: 3, found: 1 });
        assert!(repo.is_symbol_checked("BTCUSDT").await.unwrap());
        assert!(repo.is_symbol_checked("ETHUSDT").await.unwrap());
        assert!(repo.is_symbol_checked("BNBUSDT").await.unwrap());
        assert!(!repo.is_symbol_checked("XRPUSDT").await.unwrap());
        assert!(repo.is_symbol_traded("ETHUSDT").await.unwrap());
        assert!(!repo.is_symbol_traded("BTCUSDT").await.unwrap());
    }

    #[tokio::test]
    async fn test_checked_and_traded_symbols_skipped() {
        let repo = repo();
        repo.mark_symbol_checked("BTCUSDT").await.unwrap();
        repo.mark_symbol_traded("ETHUSDT").await.unwrap();

        let mut venue = MockVenue::new();
        venue
            .expect_my_fills()
            .times(3)
            .returning(|query| {
                assert!(query.symbol != "BTCUSDT" && query.symbol != "ETHUSDT");
                Ok(Vec::new())
            });

        let pass = discovery(venue, repo.clone()).discover().await.unwrap();
        assert_eq!(pass.probes, 3);
        assert!(repo.is_symbol_checked("ETHBTC").await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_lookup_aborts_pass_without_marking() {
        let mut venue = MockVenue::new();
        venue.expect_my_fills().times(1).returning(|_| {
            Err(VenueError::Transport("connection reset".to_string()))
        });

        let repo = repo();
        let result = discovery(venue, repo.clone()).discover().await;

        assert!(matches!(result, Err(SyncError::Venue(_))));
        assert!(!repo.is_symbol_checked("BTCUSDT").await.unwrap());
    }

    #[tokio::test]
    async fn test_universe_exhausted() {
        let repo = repo();
        for symbol in ["BTCUSDT", "ETHUSDT", "BNBUSDT", "XRPUSDT", "ETHBTC"] {
            repo.mark_symbol_checked(symbol).await.unwrap();
        }
        let mut venue = MockVenue::new();
        venue.expect_my_fills().never();

        let pass = discovery(venue, repo).discover().await.unwrap();
        assert_eq!(pass, DiscoveryPass::default());
    }
}
