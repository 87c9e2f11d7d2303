//! Account valuation types.
//!
//! `WalletBalance` is the venue's raw per-asset holding. `Position`,
//! `AssetBalance` and `Balance` form the snapshot produced by each
//! valuation cycle and stored as a full replacement.

use serde::{Deserialize, Serialize};

/// Raw wallet holding for one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletBalance {
    pub asset: String,
    /// Available amount.
    pub free: f64,
    /// Amount locked in open orders.
    pub locked: f64,
}

impl WalletBalance {
    /// Total held amount (free + locked).
    pub fn total(&self) -> f64 {
        self.free + self.locked
    }
}

/// Position side. Only long exposure is modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionSide {
    #[default]
    Long,
}

/// An open long position derived from wallet holdings and fill history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    /// Volume-weighted average entry price.
    pub entry_price: f64,
    /// Position size in base asset (always >= 0).
    pub size: f64,
    pub side: PositionSide,
    /// (mark - entry) * size.
    pub unrealized_profit: f64,
}

impl Position {
    /// Cost basis of the position (size * entry price).
    pub fn cost_basis(&self) -> f64 {
        self.size * self.entry_price
    }
}

/// Valuation of one non-stable wallet asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetBalance {
    pub asset: String,
    /// Cost basis in quote currency (0 when no active position).
    pub balance: f64,
    pub unrealized_profit: f64,
}

/// Account-level valuation snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    /// Stable holdings plus cost basis of every asset balance.
    pub total_balance: f64,
    pub total_unrealized_profit: f64,
    pub assets: Vec<AssetBalance>,
}
