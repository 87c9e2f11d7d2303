//! Synchronization workers for tradesync.
//!
//! Each worker owns one responsibility and runs its own periodic cycle:
//!
//! - [`SymbolDiscovery`]: finds symbols with account history
//! - [`TradeSynchronizer`]: bidirectional paginated fill history sync
//! - [`AccountSnapshotter`]: balance and position valuation
//! - [`OrderSnapshotter`]: open order listing
//! - [`PriceFeed`]: per-symbol live tick ingestion
//!
//! Workers share only the repository and immutable data (catalog, venue
//! handle). A failing cycle is logged and retried after the cycle delay.

pub mod account;
pub mod config;
pub mod discovery;
pub mod error;
pub mod orders;
pub mod prices;
mod remote;
pub mod schedule;
pub mod trades;

#[cfg(test)]
pub(crate) mod testing;

pub use account::AccountSnapshotter;
pub use config::{
    AccountSyncConfig, DiscoveryConfig, OrderSyncConfig, PriceFeedConfig, TradeSyncConfig,
};
pub use discovery::{DiscoveryPass, SymbolDiscovery};
pub use error::{SyncError, SyncResult};
pub use orders::OrderSnapshotter;
pub use prices::PriceFeed;
pub use schedule::{run_worker, spawn_worker, CycleConfig, Worker};
pub use trades::{CycleReport, SymbolTurn, TradeSynchronizer};
