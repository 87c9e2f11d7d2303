//! Worker configuration.
//!
//! Every periodic worker has `interval_ms` and `jitter_ms`; the delay
//! after a cycle is `interval_ms` plus a uniform draw in `[0, jitter_ms]`.

use serde::{Deserialize, Serialize};

use crate::schedule::CycleConfig;

// ============================================================================
// DiscoveryConfig
// ============================================================================

/// Symbol discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Idle delay after a full pass (ms).
    /// Default: 20000.
    #[serde(default = "default_discovery_interval_ms")]
    pub interval_ms: u64,
    #[serde(default)]
    pub jitter_ms: u64,
    /// History lookups issued per pass.
    /// Default: 3.
    #[serde(default = "default_probes_per_pass")]
    pub probes_per_pass: usize,
}

fn default_discovery_interval_ms() -> u64 {
    20_000
}

fn default_probes_per_pass() -> usize {
    3
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_discovery_interval_ms(),
            jitter_ms: 0,
            probes_per_pass: default_probes_per_pass(),
        }
    }
}

impl DiscoveryConfig {
    pub fn cycle(&self) -> CycleConfig {
        CycleConfig::new(self.interval_ms, self.jitter_ms)
    }
}

// ============================================================================
// TradeSyncConfig
// ============================================================================

/// Trade history synchronizer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeSyncConfig {
    /// Delay between cycles (ms).
    /// Default: 60000.
    #[serde(default = "default_trade_sync_interval_ms")]
    pub interval_ms: u64,
    #[serde(default)]
    pub jitter_ms: u64,
    /// Fills requested per page.
    /// Default: 1000.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Remote calls allowed per cycle, shared by all symbols.
    /// Default: 10.
    #[serde(default = "default_call_budget")]
    pub call_budget: usize,
}

fn default_trade_sync_interval_ms() -> u64 {
    60_000
}

fn default_page_size() -> usize {
    1000
}

fn default_call_budget() -> usize {
    10
}

impl Default for TradeSyncConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_trade_sync_interval_ms(),
            jitter_ms: 0,
            page_size: default_page_size(),
            call_budget: default_call_budget(),
        }
    }
}

impl TradeSyncConfig {
    pub fn cycle(&self) -> CycleConfig {
        CycleConfig::new(self.interval_ms, self.jitter_ms)
    }
}

// ============================================================================
// AccountSyncConfig / OrderSyncConfig
// ============================================================================

/// Balance and position snapshot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSyncConfig {
    /// Default: 20000.
    #[serde(default = "default_account_interval_ms")]
    pub interval_ms: u64,
    #[serde(default)]
    pub jitter_ms: u64,
}

fn default_account_interval_ms() -> u64 {
    20_000
}

impl Default for AccountSyncConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_account_interval_ms(),
            jitter_ms: 0,
        }
    }
}

impl AccountSyncConfig {
    pub fn cycle(&self) -> CycleConfig {
        CycleConfig::new(self.interval_ms, self.jitter_ms)
    }
}

/// Open order snapshot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSyncConfig {
    /// Default: 30000.
    #[serde(default = "default_orders_interval_ms")]
    pub interval_ms: u64,
    #[serde(default)]
    pub jitter_ms: u64,
}

fn default_orders_interval_ms() -> u64 {
    30_000
}

impl Default for OrderSyncConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_orders_interval_ms(),
            jitter_ms: 0,
        }
    }
}

impl OrderSyncConfig {
    pub fn cycle(&self) -> CycleConfig {
        CycleConfig::new(self.interval_ms, self.jitter_ms)
    }
}

// ============================================================================
// PriceFeedConfig
// ============================================================================

/// Live price feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceFeedConfig {
    /// Minimum spacing between recorded ticks per symbol (ms).
    /// Default: 5000.
    #[serde(default = "default_publish_interval_ms")]
    pub publish_interval_ms: u64,
}

fn default_publish_interval_ms() -> u64 {
    5_000
}

impl Default for PriceFeedConfig {
    fn default() -> Self {
        Self {
            publish_interval_ms: default_publish_interval_ms(),
        }
    }
}
