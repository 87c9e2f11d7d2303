//! Core domain types for the tradesync account synchronizer.
//!
//! This crate provides the records shared by every other crate:
//! - `SymbolInfo`: venue symbol with status and base/quote assets
//! - `Fill`, `Trade`, `Income`: raw fills, stored trades, derived realized PnL
//! - `Position`, `AssetBalance`, `Balance`, `WalletBalance`: account valuation
//! - `Order`, `Side`: open order snapshot types
//! - `Tick`, `TickerPrice`: price inputs

pub mod account;
pub mod error;
pub mod market;
pub mod order;
pub mod trade;
pub mod types;

pub use account::{AssetBalance, Balance, Position, PositionSide, WalletBalance};
pub use error::{CoreError, Result};
pub use market::{SymbolInfo, SymbolStatus};
pub use order::{Order, Side};
pub use trade::{Fill, Income, IncomeKind, Trade};
pub use types::{now_ms, Tick, TickerPrice};
