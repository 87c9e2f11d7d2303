//! Exchange client contract.
//!
//! The venue exposes two independent cursors over the account's fill
//! history: an end-time bound for walking backward and a minimum order id
//! for walking forward. Pages are bounded by [`MAX_FILL_PAGE`].

use crate::error::VenueResult;
use async_trait::async_trait;
use tokio::sync::watch;
use tradesync_core::{Fill, Order, SymbolInfo, Tick, TickerPrice, WalletBalance};

/// Largest page the venue serves for a fill history request.
pub const MAX_FILL_PAGE: usize = 1000;

/// Receiver side of a tick subscription.
///
/// Holds only the most recent tick. A tick that was not read before the
/// next one arrived is overwritten, never queued.
pub type TickReceiver = watch::Receiver<Option<Tick>>;

/// Fill history request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillQuery {
    /// Symbol to fetch fills for.
    pub symbol: String,
    /// Maximum fills to return.
    pub limit: usize,
    /// Inclusive upper bound on fill time (Unix ms).
    pub end_time_ms: Option<i64>,
    /// Inclusive lower bound on order id.
    pub from_order_id: Option<u64>,
}

impl FillQuery {
    /// Single-fill lookup used to decide whether a symbol has any history.
    pub fn probe(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            limit: 1,
            end_time_ms: None,
            from_order_id: None,
        }
    }

    /// Most recent fills with time <= `end_time_ms`.
    pub fn ending_at(symbol: impl Into<String>, end_time_ms: i64, limit: usize) -> Self {
        Self {
            symbol: symbol.into(),
            limit,
            end_time_ms: Some(end_time_ms),
            from_order_id: None,
        }
    }

    /// Fills with order id >= `from_order_id`, oldest first.
    pub fn from_order_id(symbol: impl Into<String>, from_order_id: u64, limit: usize) -> Self {
        Self {
            symbol: symbol.into(),
            limit,
            end_time_ms: None,
            from_order_id: Some(from_order_id),
        }
    }

    /// Page size clamped to what the venue serves.
    pub fn effective_limit(&self) -> usize {
        self.limit.clamp(1, MAX_FILL_PAGE)
    }
}

/// Remote trading venue.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// List every symbol with its trading status.
    async fn symbols(&self) -> VenueResult<Vec<SymbolInfo>>;

    /// Fetch one page of the account's fills for a symbol.
    async fn my_fills(&self, query: &FillQuery) -> VenueResult<Vec<Fill>>;

    /// Fetch wallet holdings for every asset.
    async fn account_balances(&self) -> VenueResult<Vec<WalletBalance>>;

    /// Fetch last price for every symbol.
    async fn ticker_prices(&self) -> VenueResult<Vec<TickerPrice>>;

    /// Fetch every open order on the account.
    async fn open_orders(&self) -> VenueResult<Vec<Order>>;

    /// Open a tick stream for a symbol.
    async fn subscribe_ticks(&self, symbol: &str) -> VenueResult<TickReceiver>;
}
