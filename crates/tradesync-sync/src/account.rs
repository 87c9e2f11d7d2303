//! Balance and position snapshotter.
//!
//! Values the whole wallet each cycle. Stable assets count 1:1. Any other
//! asset is priced through its stable-quoted symbols; it holds a position
//! only when that symbol has stored fills and a stored open order, and the
//! first such symbol (USDT, then BUSD, then USD) defines the position.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};
use tradesync_core::{Balance, Position, WalletBalance};
use tradesync_position::{long_position, AccountValuation};
use tradesync_store::Repository;
use tradesync_telemetry::Metrics;
use tradesync_venue::{ExchangeClient, SymbolCatalog};

use crate::config::AccountSyncConfig;
use crate::error::SyncResult;
use crate::prices::PriceFeed;
use crate::remote;
use crate::schedule::{CycleConfig, Worker};

pub struct AccountSnapshotter {
    venue: Arc<dyn ExchangeClient>,
    repo: Arc<dyn Repository>,
    price_feed: Arc<PriceFeed>,
    config: AccountSyncConfig,
}

impl AccountSnapshotter {
    pub fn new(
        venue: Arc<dyn ExchangeClient>,
        repo: Arc<dyn Repository>,
        price_feed: Arc<PriceFeed>,
        config: AccountSyncConfig,
    ) -> Self {
        Self {
            venue,
            repo,
            price_feed,
            config,
        }
    }

    /// Value the account and replace the stored snapshot.
    pub async fn snapshot(&self) -> SyncResult<(Balance, Vec<Position>)> {
        let wallet = remote::call("account", self.venue.account_balances()).await?;
        let tickers = remote::call("tickers", self.venue.ticker_prices()).await?;
        let prices: HashMap<&str, f64> = tickers
            .iter()
            .map(|t| (t.symbol.as_str(), t.price))
            .collect();

        let mut valuation = AccountValuation::new();
        for holding in &wallet {
            let amount = holding.total();
            if amount <= 0.0 {
                continue;
            }
            if SymbolCatalog::is_stable_asset(&holding.asset) {
                valuation.add_stable(amount);
                continue;
            }

            let quoted: Vec<(String, f64)> = SymbolCatalog::stable_quote_symbols(&holding.asset)
                .into_iter()
                .filter_map(|symbol| prices.get(symbol.as_str()).map(|&p| (symbol, p)))
                .collect();
            if quoted.is_empty() {
                warn!(asset = %holding.asset, "No stable quote price found for asset, skipping");
                continue;
            }

            let position = self.find_position(holding, amount, &quoted).await?;
            valuation.add_asset(&holding.asset, position);
        }

        let (balance, positions) = valuation.into_snapshot();
        self.repo.replace_balance(balance.clone()).await?;
        self.repo.replace_positions(positions.clone()).await?;

        Metrics::account_snapshot(balance.total_balance, balance.total_unrealized_profit);
        info!(
            total_balance = balance.total_balance,
            total_unrealized_profit = balance.total_unrealized_profit,
            assets = balance.assets.len(),
            positions = positions.len(),
            "Synced account"
        );
        Ok((balance, positions))
    }

    async fn find_position(
        &self,
        holding: &WalletBalance,
        amount: f64,
        quoted: &[(String, f64)],
    ) -> SyncResult<Option<Position>> {
        for (symbol, ticker_price) in quoted {
            let trades = self.repo.trades(symbol).await?;
            if trades.is_empty() || self.repo.open_orders(symbol).await?.is_empty() {
                continue;
            }
            let mark = self.mark_price(symbol, *ticker_price).await?;
            let position = long_position(symbol, amount, &trades, mark);
            info!(
                asset = %holding.asset,
                symbol = %symbol,
                size = position.size,
                entry_price = position.entry_price,
                mark,
                "Valued position"
            );
            return Ok(Some(position));
        }
        Ok(None)
    }

    /// Latest recorded tick, else the ticker price. Ensures a live
    /// subscription so later snapshots use ticks.
    async fn mark_price(&self, symbol: &str, ticker_price: f64) -> SyncResult<f64> {
        self.price_feed.ensure_subscribed(symbol).await;
        Ok(self
            .repo
            .current_price(symbol)
            .await?
            .map_or(ticker_price, |tick| tick.price))
    }
}

#[async_trait]
impl Worker for AccountSnapshotter {
    fn name(&self) -> &'static str {
        "account_sync"
    }

    fn cycle(&self) -> CycleConfig {
        self.config.cycle()
    }

    async fn run_cycle(&self) -> SyncResult<()> {
        self.snapshot().await.map(|_| ())
    }
}
