//! Order-related types.
//!
//! Provides the fill/order side and the open-order snapshot record.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Side of a fill or order: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Side from the venue's buyer flag.
    pub fn from_is_buyer(is_buyer: bool) -> Self {
        if is_buyer {
            Self::Buy
        } else {
            Self::Sell
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, Self::Buy)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for Side {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BUY" => Ok(Self::Buy),
            "SELL" => Ok(Self::Sell),
            _ => Err(CoreError::InvalidSide(s.to_string())),
        }
    }
}

/// A currently open order on the venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Symbol the order rests on.
    pub symbol: String,
    /// Limit price.
    pub price: f64,
    /// Original quantity.
    pub quantity: f64,
    /// Order side.
    pub side: Side,
    /// Venue order type (e.g., "LIMIT", "STOP_LOSS_LIMIT").
    #[serde(rename = "type")]
    pub order_type: String,
}
