//! Position and PnL computation for tradesync.
//!
//! Pure functions over stored trades. Nothing here performs I/O.
//!
//! # Key Components
//!
//! - [`LongPosition`]: running size and volume-weighted entry price
//! - [`realized_incomes`]: replays a symbol's trades and emits realized PnL
//! - [`entry_price_for`]: average entry price for an externally reported size
//! - [`AccountValuation`]: aggregates wallet assets into a balance snapshot

pub mod engine;
pub mod valuation;

pub use engine::{entry_price_for, long_pnl, realized_incomes, LongPosition};
pub use valuation::{long_position, AccountValuation};
