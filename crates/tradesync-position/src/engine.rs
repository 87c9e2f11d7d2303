//! Long-only position replay.
//!
//! BUY fills accumulate size and move the volume-weighted entry price.
//! SELL fills reduce size and leave the entry price unchanged; a SELL while
//! flat is ignored. Realized PnL is non-inverse: `qty * (close - entry)`.

use serde::{Deserialize, Serialize};
use tradesync_core::{Income, IncomeKind, Side, Trade};

/// Running long position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LongPosition {
    /// Held size, never negative.
    pub size: f64,
    /// Volume-weighted entry price of the held size.
    pub avg_price: f64,
}

impl LongPosition {
    pub fn flat() -> Self {
        Self::default()
    }

    pub fn is_flat(&self) -> bool {
        self.size <= 0.0
    }

    /// Add `quantity` bought at `price`.
    pub fn apply_buy(&mut self, quantity: f64, price: f64) {
        let quantity = quantity.abs();
        let new_size = self.size + quantity;
        if new_size <= 0.0 {
            return;
        }
        self.avg_price =
            self.avg_price * (self.size / new_size) + price * (quantity / new_size);
        self.size = new_size;
    }

    /// Remove `quantity` sold at `price`.
    ///
    /// Returns the realized PnL, or `None` when the position was flat.
    pub fn apply_sell(&mut self, quantity: f64, price: f64) -> Option<f64> {
        if self.is_flat() {
            return None;
        }
        let pnl = long_pnl(self.avg_price, price, quantity);
        self.size = (self.size - quantity.abs()).max(0.0);
        Some(pnl)
    }

    /// Apply a stored trade.
    pub fn apply(&mut self, trade: &Trade) -> Option<f64> {
        match trade.side {
            Side::Buy => {
                self.apply_buy(trade.quantity, trade.price);
                None
            }
            Side::Sell => self.apply_sell(trade.quantity, trade.price),
        }
    }
}

/// Realized PnL of closing `quantity` of a long entered at `entry_price`.
pub fn long_pnl(entry_price: f64, close_price: f64, quantity: f64) -> f64 {
    quantity.abs() * (close_price - entry_price)
}

/// Replay a symbol's trades and emit one income per position-reducing SELL.
///
/// `trades` must be sorted by timestamp. Returns the incomes together with
/// the final position state.
pub fn realized_incomes(trades: &[Trade]) -> (Vec<Income>, LongPosition) {
    let mut position = LongPosition::flat();
    let mut incomes = Vec::new();

    for trade in trades {
        if let Some(amount) = position.apply(trade) {
            incomes.push(Income {
                symbol: trade.symbol.clone(),
                asset: trade.asset.clone(),
                kind: IncomeKind::RealizedPnl,
                amount,
                timestamp_ms: trade.timestamp_ms,
                transaction_id: trade.order_id,
            });
        }
    }

    (incomes, position)
}

/// Average entry price for a position of `reported_size`.
///
/// Trades may be in any order; a sorted copy is replayed. Returns 0 when
/// `reported_size` is not positive.
pub fn entry_price_for(reported_size: f64, trades: &[Trade]) -> f64 {
    if reported_size <= 0.0 {
        return 0.0;
    }

    let mut sorted: Vec<&Trade> = trades.iter().collect();
    sorted.sort_by_key(|t| (t.timestamp_ms, t.order_id));

    let mut position = LongPosition::flat();
    for trade in sorted {
        position.apply(trade);
    }
    position.avg_price
}
