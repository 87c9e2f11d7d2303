//! Account valuation.
//!
//! A held asset's balance is its cost basis (size × average entry price),
//! not its mark value. Stable assets count 1:1 toward the total.

use tracing::debug;
use tradesync_core::{AssetBalance, Balance, Position, PositionSide, Trade};

use crate::engine::entry_price_for;

/// Long position for a wallet holding of `size` on `symbol`.
///
/// The entry price is replayed from `trades`; unrealized profit is
/// `(mark_price - entry) * size`.
pub fn long_position(symbol: &str, size: f64, trades: &[Trade], mark_price: f64) -> Position {
    let entry_price = entry_price_for(size, trades);
    Position {
        symbol: symbol.to_string(),
        entry_price,
        size,
        side: PositionSide::Long,
        unrealized_profit: (mark_price - entry_price) * size,
    }
}

/// Accumulates one account snapshot.
#[derive(Debug, Default)]
pub struct AccountValuation {
    stable_total: f64,
    assets: Vec<AssetBalance>,
    positions: Vec<Position>,
}

impl AccountValuation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a stable asset holding toward the total.
    pub fn add_stable(&mut self, amount: f64) {
        self.stable_total += amount;
    }

    /// Record a priced non-stable asset.
    ///
    /// Without a position the asset is listed with a zero balance.
    pub fn add_asset(&mut self, asset: &str, position: Option<Position>) {
        let balance = match position {
            Some(position) => {
                let balance = AssetBalance {
                    asset: asset.to_string(),
                    balance: position.cost_basis(),
                    unrealized_profit: position.unrealized_profit,
                };
                self.positions.push(position);
                balance
            }
            None => AssetBalance {
                asset: asset.to_string(),
                balance: 0.0,
                unrealized_profit: 0.0,
            },
        };
        self.assets.push(balance);
    }

    /// Finish the snapshot.
    pub fn into_snapshot(self) -> (Balance, Vec<Position>) {
        let asset_total: f64 = self.assets.iter().map(|a| a.balance).sum();
        let total_unrealized_profit = self.assets.iter().map(|a| a.unrealized_profit).sum();
        let balance = Balance {
            total_balance: self.stable_total + asset_total,
            total_unrealized_profit,
            assets: self.assets,
        };

        debug!(
            total_balance = balance.total_balance,
            total_unrealized_profit = balance.total_unrealized_profit,
            positions = self.positions.len(),
            "Account valued"
        );

        (balance, self.positions)
    }
}
