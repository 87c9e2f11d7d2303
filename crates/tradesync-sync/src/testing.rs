//! Test doubles shared by the worker tests.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::mock;
use tradesync_core::{Fill, Order, SymbolInfo, SymbolStatus, TickerPrice, WalletBalance};
use tradesync_store::MemoryRepository;
use tradesync_venue::{
    ExchangeClient, FillQuery, ReplayFixture, ReplayVenue, SymbolCatalog, TickReceiver,
    VenueResult,
};

mock! {
    pub Venue {}

    #[async_trait]
    impl ExchangeClient for Venue {
        async fn symbols(&self) -> VenueResult<Vec<SymbolInfo>>;
        async fn my_fills(&self, query: &FillQuery) -> VenueResult<Vec<Fill>>;
        async fn account_balances(&self) -> VenueResult<Vec<WalletBalance>>;
        async fn ticker_prices(&self) -> VenueResult<Vec<TickerPrice>>;
        async fn open_orders(&self) -> VenueResult<Vec<Order>>;
        async fn subscribe_ticks(&self, symbol: &str) -> VenueResult<TickReceiver>;
    }
}

pub fn symbol(name: &str, base: &str, quote: &str) -> SymbolInfo {
    SymbolInfo::new(name, SymbolStatus::Trading, base, quote)
}

pub fn catalog() -> Arc<SymbolCatalog> {
    Arc::new(SymbolCatalog::new(vec![
        symbol("BTCUSDT", "BTC", "USDT"),
        symbol("ETHUSDT", "ETH", "USDT"),
        symbol("BNBUSDT", "BNB", "USDT"),
        symbol("XRPUSDT", "XRP", "USDT"),
        symbol("ETHBTC", "ETH", "BTC"),
    ]))
}

pub fn fill(symbol: &str, order_id: u64, time_ms: i64, is_buyer: bool, price: f64) -> Fill {
    Fill {
        symbol: symbol.to_string(),
        order_id,
        quantity: 1.0,
        price,
        is_buyer,
        time_ms,
    }
}

/// `count` buys on BTCUSDT with order ids 1..=count and times 1000, 2000, ...
pub fn btc_history(count: u64) -> Vec<Fill> {
    (1..=count)
        .map(|i| fill("BTCUSDT", i, i as i64 * 1000, true, 100.0))
        .collect()
}

pub fn replay(fills: Vec<Fill>) -> Arc<ReplayVenue> {
    Arc::new(ReplayVenue::new(ReplayFixture {
        fills,
        ..Default::default()
    }))
}

pub fn repo() -> Arc<MemoryRepository> {
    Arc::new(MemoryRepository::new())
}
