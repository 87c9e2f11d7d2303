//! Error types for tradesync-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid side: {0}")]
    InvalidSide(String),

    #[error("Invalid quantity for {symbol} order {order_id}: {quantity}")]
    InvalidQuantity {
        symbol: String,
        order_id: u64,
        quantity: f64,
    },

    #[error("Invalid price for {symbol} order {order_id}: {price}")]
    InvalidPrice {
        symbol: String,
        order_id: u64,
        price: f64,
    },

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
