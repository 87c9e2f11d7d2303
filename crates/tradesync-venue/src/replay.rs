//! In-process venue backed by a JSON fixture.
//!
//! Serves symbols, fills, wallet balances, ticker prices and open orders
//! from memory with the same pagination contract a remote venue offers:
//! - `from_order_id`: fills with order id >= cursor, ascending, first `limit`
//! - `end_time_ms`: the `limit` most recent fills with time <= bound, ascending
//! - neither: the `limit` most recent fills
//!
//! Fills and prices can be pushed while running, which is how the replay
//! venue simulates new account activity.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info};
use tradesync_core::{
    now_ms, Fill, Order, SymbolInfo, Tick, TickerPrice, WalletBalance,
};

use crate::client::{ExchangeClient, FillQuery, TickReceiver};
use crate::error::{VenueError, VenueResult};

/// Fixture file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplayFixture {
    #[serde(default)]
    pub symbols: Vec<SymbolInfo>,
    #[serde(default)]
    pub fills: Vec<Fill>,
    #[serde(default)]
    pub balances: Vec<WalletBalance>,
    #[serde(default)]
    pub prices: Vec<TickerPrice>,
    #[serde(default)]
    pub open_orders: Vec<Order>,
}

/// Replay venue.
pub struct ReplayVenue {
    symbols: RwLock<Vec<SymbolInfo>>,
    /// symbol -> fills sorted by (time, order id).
    fills: RwLock<HashMap<String, Vec<Fill>>>,
    balances: RwLock<Vec<WalletBalance>>,
    prices: RwLock<HashMap<String, f64>>,
    open_orders: RwLock<Vec<Order>>,
    /// Live tick channels by symbol.
    tick_channels: DashMap<String, watch::Sender<Option<Tick>>>,
}

impl ReplayVenue {
    /// Create a replay venue from an in-memory fixture.
    pub fn new(fixture: ReplayFixture) -> Self {
        let venue = Self {
            symbols: RwLock::new(fixture.symbols),
            fills: RwLock::new(HashMap::new()),
            balances: RwLock::new(fixture.balances),
            prices: RwLock::new(
                fixture
                    .prices
                    .into_iter()
                    .map(|p| (p.symbol, p.price))
                    .collect(),
            ),
            open_orders: RwLock::new(fixture.open_orders),
            tick_channels: DashMap::new(),
        };
        for fill in fixture.fills {
            venue.push_fill(fill);
        }
        venue
    }

    /// Load a fixture from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> VenueResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            VenueError::Fixture(format!("Failed to read {}: {e}", path.display()))
        })?;
        let fixture: ReplayFixture = serde_json::from_str(&content)?;

        info!(
            path = %path.display(),
            symbols = fixture.symbols.len(),
            fills = fixture.fills.len(),
            "Loaded replay fixture"
        );

        Ok(Self::new(fixture))
    }

    /// Add a fill to the account history.
    pub fn push_fill(&self, fill: Fill) {
        let mut fills = self.fills.write();
        let history = fills.entry(fill.symbol.clone()).or_default();
        let pos = history
            .partition_point(|f| (f.time_ms, f.order_id) <= (fill.time_ms, fill.order_id));
        history.insert(pos, fill);
    }

    /// Set a symbol's last price and publish it to tick subscribers.
    pub fn set_price(&self, symbol: &str, price: f64) {
        self.prices.write().insert(symbol.to_string(), price);
        if let Some(tx) = self.tick_channels.get(symbol) {
            tx.send_replace(Some(Tick::new(symbol, price, 0.0, now_ms())));
        }
    }

    pub fn set_balances(&self, balances: Vec<WalletBalance>) {
        *self.balances.write() = balances;
    }

    pub fn set_open_orders(&self, orders: Vec<Order>) {
        *self.open_orders.write() = orders;
    }

    /// Number of fills held for a symbol.
    pub fn fill_count(&self, symbol: &str) -> usize {
        self.fills.read().get(symbol).map_or(0, Vec::len)
    }

    fn page(&self, query: &FillQuery) -> Vec<Fill> {
        let limit = query.effective_limit();
        let fills = self.fills.read();
        let Some(history) = fills.get(&query.symbol) else {
            return Vec::new();
        };

        if let Some(from) = query.from_order_id {
            let mut page: Vec<Fill> = history
                .iter()
                .filter(|f| f.order_id >= from)
                .cloned()
                .collect();
            page.sort_by_key(|f| f.order_id);
            page.truncate(limit);
            return page;
        }

        let bounded: Vec<&Fill> = match query.end_time_ms {
            Some(end) => history.iter().filter(|f| f.time_ms <= end).collect(),
            None => history.iter().collect(),
        };
        let skip = bounded.len().saturating_sub(limit);
        bounded.into_iter().skip(skip).cloned().collect()
    }
}

#[async_trait]
impl ExchangeClient for ReplayVenue {
    async fn symbols(&self) -> VenueResult<Vec<SymbolInfo>> {
        Ok(self.symbols.read().clone())
    }

    async fn my_fills(&self, query: &FillQuery) -> VenueResult<Vec<Fill>> {
        if query.end_time_ms.is_some() && query.from_order_id.is_some() {
            return Err(VenueError::InvalidQuery(
                "end_time_ms and from_order_id are mutually exclusive".to_string(),
            ));
        }
        let page = self.page(query);
        debug!(
            symbol = %query.symbol,
            end_time_ms = ?query.end_time_ms,
            from_order_id = ?query.from_order_id,
            returned = page.len(),
            "Served fill page"
        );
        Ok(page)
    }

    async fn account_balances(&self) -> VenueResult<Vec<WalletBalance>> {
        Ok(self.balances.read().clone())
    }

    async fn ticker_prices(&self) -> VenueResult<Vec<TickerPrice>> {
        Ok(self
            .prices
            .read()
            .iter()
            .map(|(symbol, &price)| TickerPrice {
                symbol: symbol.clone(),
                price,
            })
            .collect())
    }

    async fn open_orders(&self) -> VenueResult<Vec<Order>> {
        Ok(self.open_orders.read().clone())
    }

    async fn subscribe_ticks(&self, symbol: &str) -> VenueResult<TickReceiver> {
        let entry = self.tick_channels.entry(symbol.to_string()).or_insert_with(|| {
            let initial = self
                .prices
                .read()
                .get(symbol)
                .map(|&price| Tick::new(symbol, price, 0.0, now_ms()));
            watch::channel(initial).0
        });
        Ok(entry.subscribe())
    }
}
