//! Fill, trade and income records.
//!
//! A `Fill` is what the venue reports. Once its base asset is resolved it
//! becomes a `Trade`, the primary stored record keyed by (symbol, order id).
//! `Income` records are derived from stored trades and are never primary.

use crate::error::{CoreError, Result};
use crate::order::Side;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw fill as reported by the venue's account trade history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    /// Symbol the fill executed on.
    pub symbol: String,
    /// Venue order id (monotonic per symbol).
    pub order_id: u64,
    /// Executed quantity.
    pub quantity: f64,
    /// Execution price.
    pub price: f64,
    /// Whether the account was the buyer.
    pub is_buyer: bool,
    /// Execution time (Unix ms).
    pub time_ms: i64,
}

/// Stored trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub symbol: String,
    /// Base asset of the symbol (e.g., "BTC" for BTCUSDT).
    pub asset: String,
    pub order_id: u64,
    pub quantity: f64,
    pub price: f64,
    pub side: Side,
    /// Execution time (Unix ms).
    pub timestamp_ms: i64,
}

impl Trade {
    /// Build a trade from a venue fill and the symbol's base asset.
    ///
    /// Rejects non-positive quantities and negative prices so that the
    /// position engine never divides by a zero position size.
    pub fn from_fill(fill: &Fill, asset: impl Into<String>) -> Result<Self> {
        if fill.quantity.is_nan() || fill.quantity <= 0.0 {
            return Err(CoreError::InvalidQuantity {
                symbol: fill.symbol.clone(),
                order_id: fill.order_id,
                quantity: fill.quantity,
            });
        }
        if fill.price.is_nan() || fill.price < 0.0 {
            return Err(CoreError::InvalidPrice {
                symbol: fill.symbol.clone(),
                order_id: fill.order_id,
                price: fill.price,
            });
        }

        Ok(Self {
            symbol: fill.symbol.clone(),
            asset: asset.into(),
            order_id: fill.order_id,
            quantity: fill.quantity,
            price: fill.price,
            side: Side::from_is_buyer(fill.is_buyer),
            timestamp_ms: fill.time_ms,
        })
    }

    /// Unique storage key.
    pub fn key(&self) -> (&str, u64) {
        (&self.symbol, self.order_id)
    }
}

/// Category of a derived income record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncomeKind {
    RealizedPnl,
}

impl fmt::Display for IncomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RealizedPnl => write!(f, "REALIZED_PNL"),
        }
    }
}

/// Realized PnL recognized when a long position is reduced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Income {
    pub symbol: String,
    pub asset: String,
    pub kind: IncomeKind,
    /// Signed amount in quote currency.
    pub amount: f64,
    /// Time of the reducing trade (Unix ms).
    pub timestamp_ms: i64,
    /// Order id of the reducing trade.
    pub transaction_id: u64,
}
