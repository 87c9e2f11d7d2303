//! Symbol catalog.
//!
//! Snapshot of the venue's symbol universe taken at startup. Ordering puts
//! tradable USDT-quoted symbols first so discovery reaches the most likely
//! traded markets early. Also resolves a symbol's base asset when raw
//! fills are turned into stored trades.

use std::collections::HashMap;

use tracing::info;
use tradesync_core::{CoreError, SymbolInfo};

/// Assets valued 1:1 in the account total.
pub const STABLE_ASSETS: [&str; 3] = ["USDT", "BUSD", "USD"];

/// Quote asset whose symbols are scanned first.
const PRIMARY_QUOTE: &str = "USDT";

/// Immutable symbol universe.
#[derive(Debug, Clone, Default)]
pub struct SymbolCatalog {
    /// Symbols in discovery order.
    symbols: Vec<SymbolInfo>,
    /// symbol -> index into `symbols`.
    index: HashMap<String, usize>,
}

impl SymbolCatalog {
    /// Build a catalog from the venue's symbol listing.
    pub fn new(listing: Vec<SymbolInfo>) -> Self {
        let (mut symbols, rest): (Vec<_>, Vec<_>) = listing
            .into_iter()
            .partition(|s| s.is_trading() && s.quote_asset == PRIMARY_QUOTE);
        symbols.extend(rest);

        let index = symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (s.symbol.clone(), i))
            .collect();

        info!(symbol_count = symbols.len(), "Symbol catalog built");

        Self { symbols, index }
    }

    /// All symbols in discovery order.
    pub fn symbols(&self) -> &[SymbolInfo] {
        &self.symbols
    }

    /// Tradable symbols in discovery order.
    pub fn trading(&self) -> impl Iterator<Item = &SymbolInfo> {
        self.symbols.iter().filter(|s| s.is_trading())
    }

    pub fn get(&self, symbol: &str) -> Option<&SymbolInfo> {
        self.index.get(symbol).map(|&i| &self.symbols[i])
    }

    /// Base asset of a symbol.
    pub fn base_asset(&self, symbol: &str) -> Result<&str, CoreError> {
        self.get(symbol)
            .map(|s| s.base_asset.as_str())
            .ok_or_else(|| CoreError::UnknownSymbol(symbol.to_string()))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Check if an asset is valued 1:1 in the account total.
    pub fn is_stable_asset(asset: &str) -> bool {
        STABLE_ASSETS.contains(&asset)
    }

    /// Candidate symbols quoting `asset` against a stable asset.
    pub fn stable_quote_symbols(asset: &str) -> Vec<String> {
        STABLE_ASSETS
            .iter()
            .map(|quote| format!("{asset}{quote}"))
            .collect()
    }
}
