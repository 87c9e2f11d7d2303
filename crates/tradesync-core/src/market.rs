//! Symbol identification types.
//!
//! A venue symbol pairs a base asset with a quote asset (e.g. BTCUSDT is
//! BTC quoted in USDT) and carries the venue's trading status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Trading status reported by the venue for a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SymbolStatus {
    /// Open for trading.
    Trading,
    /// Trading temporarily halted.
    Halt,
    /// Delisted or between sessions.
    Break,
}

impl fmt::Display for SymbolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trading => write!(f, "TRADING"),
            Self::Halt => write!(f, "HALT"),
            Self::Break => write!(f, "BREAK"),
        }
    }
}

/// Symbol metadata from the venue's symbol listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolInfo {
    /// Symbol identifier (e.g., "BTCUSDT").
    pub symbol: String,
    /// Trading status.
    pub status: SymbolStatus,
    /// Base asset (e.g., "BTC").
    pub base_asset: String,
    /// Quote asset (e.g., "USDT").
    pub quote_asset: String,
}

impl SymbolInfo {
    pub fn new(
        symbol: impl Into<String>,
        status: SymbolStatus,
        base_asset: impl Into<String>,
        quote_asset: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            status,
            base_asset: base_asset.into(),
            quote_asset: quote_asset.into(),
        }
    }

    /// Check if the symbol is open for trading.
    pub fn is_trading(&self) -> bool {
        self.status == SymbolStatus::Trading
    }
}
