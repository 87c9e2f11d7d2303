//! Price input types.
//!
//! `TickerPrice` is the venue's last price per symbol from a REST listing.
//! `Tick` is one streamed trade used as the live mark price.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Current wall-clock time in Unix milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Last traded price for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerPrice {
    pub symbol: String,
    pub price: f64,
}

/// Streamed public trade tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub symbol: String,
    pub price: f64,
    pub quantity: f64,
    /// Trade time (Unix ms).
    pub timestamp_ms: i64,
}

impl Tick {
    pub fn new(symbol: impl Into<String>, price: f64, quantity: f64, timestamp_ms: i64) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            quantity,
            timestamp_ms,
        }
    }
}
