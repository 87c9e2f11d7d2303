//! Repository contract.
//!
//! Every worker reads and writes through this trait. Implementations must
//! be safe for concurrent use from several tasks; trade writes are upserts
//! keyed by (symbol, order id) so repeated ingestion is harmless.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tradesync_core::{Balance, Income, Order, Position, Tick, Trade};

use crate::error::StoreResult;

/// Per-symbol synchronization state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    /// The backward scan observed an empty page.
    pub backfill_complete: bool,
    /// Last time the symbol was picked for download (Unix ms).
    pub last_downloaded_ms: Option<i64>,
}

#[async_trait]
pub trait Repository: Send + Sync {
    // --- trades ---

    /// Insert or update trades. Returns how many were not stored before.
    async fn upsert_trades(&self, trades: &[Trade]) -> StoreResult<usize>;

    /// Trade with the smallest timestamp for a symbol.
    async fn oldest_trade(&self, symbol: &str) -> StoreResult<Option<Trade>>;

    /// Trade with the largest order id for a symbol.
    async fn newest_trade(&self, symbol: &str) -> StoreResult<Option<Trade>>;

    /// All trades for a symbol, sorted by timestamp.
    async fn trades(&self, symbol: &str) -> StoreResult<Vec<Trade>>;

    /// All trades whose base asset is `asset`, sorted by timestamp.
    async fn trades_by_asset(&self, asset: &str) -> StoreResult<Vec<Trade>>;

    // --- incomes ---

    /// Replace every stored income of a symbol.
    async fn replace_incomes(&self, symbol: &str, incomes: &[Income]) -> StoreResult<()>;

    async fn incomes(&self, symbol: &str) -> StoreResult<Vec<Income>>;

    // --- account snapshots ---

    async fn replace_balance(&self, balance: Balance) -> StoreResult<()>;

    async fn balance(&self) -> StoreResult<Balance>;

    async fn replace_positions(&self, positions: Vec<Position>) -> StoreResult<()>;

    async fn positions(&self) -> StoreResult<Vec<Position>>;

    async fn replace_open_orders(&self, orders: Vec<Order>) -> StoreResult<()>;

    /// Stored open orders for a symbol.
    async fn open_orders(&self, symbol: &str) -> StoreResult<Vec<Order>>;

    // --- discovery ---

    async fn mark_symbol_checked(&self, symbol: &str) -> StoreResult<()>;

    async fn is_symbol_checked(&self, symbol: &str) -> StoreResult<bool>;

    /// Enqueue a symbol for trade synchronization.
    async fn mark_symbol_traded(&self, symbol: &str) -> StoreResult<()>;

    async fn is_symbol_traded(&self, symbol: &str) -> StoreResult<bool>;

    // --- synchronization state ---

    /// Traded symbol downloaded least recently (never-downloaded first,
    /// equal times in marking order).
    async fn next_traded_symbol(&self) -> StoreResult<Option<String>>;

    async fn record_last_downloaded(&self, symbol: &str, time_ms: i64) -> StoreResult<()>;

    async fn sync_state(&self, symbol: &str) -> StoreResult<SyncState>;

    async fn mark_backfill_complete(&self, symbol: &str) -> StoreResult<()>;

    // --- prices ---

    async fn record_tick(&self, tick: Tick) -> StoreResult<()>;

    /// Latest recorded tick for a symbol.
    async fn current_price(&self, symbol: &str) -> StoreResult<Option<Tick>>;
}
