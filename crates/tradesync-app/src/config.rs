//! Application configuration.
//!
//! Loaded from TOML. Every field has a default, so an empty file is a valid
//! configuration; unrecognised keys are ignored. Credentials may be
//! overridden from the environment.

use std::fmt;

use serde::{Deserialize, Serialize};
use tradesync_sync::{
    AccountSyncConfig, DiscoveryConfig, OrderSyncConfig, PriceFeedConfig, TradeSyncConfig,
};

use crate::error::{AppError, AppResult};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "TRADESYNC_CONFIG";
/// Config file used when neither CLI nor environment names one.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
pub const API_KEY_ENV: &str = "TRADESYNC_API_KEY";
pub const API_SECRET_ENV: &str = "TRADESYNC_API_SECRET";

/// Symbol always present in the allowlist.
pub const REFERENCE_SYMBOL: &str = "BTCUSDT";

/// Venue implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VenueKind {
    /// In-process venue served from a JSON fixture.
    #[default]
    Replay,
}

/// Venue selection and credentials.
#[derive(Clone, Serialize, Deserialize)]
pub struct VenueConfig {
    #[serde(default)]
    pub kind: VenueKind,
    /// Fixture file for the replay venue.
    #[serde(default = "default_fixture_path")]
    pub fixture_path: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
}

fn default_fixture_path() -> String {
    "config/replay_fixture.json".to_string()
}

impl Default for VenueConfig {
    fn default() -> Self {
        Self {
            kind: VenueKind::default(),
            fixture_path: default_fixture_path(),
            api_key: String::new(),
            api_secret: String::new(),
        }
    }
}

impl fmt::Debug for VenueConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VenueConfig")
            .field("kind", &self.kind)
            .field("fixture_path", &self.fixture_path)
            .field("api_key", &redact(&self.api_key))
            .field("api_secret", &redact(&self.api_secret))
            .finish()
    }
}

fn redact(value: &str) -> &'static str {
    if value.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

/// Repository settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the journal.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Journal primary records so they survive restarts.
    #[serde(default = "default_journal")]
    pub journal: bool,
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_journal() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            journal: default_journal(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub venue: VenueConfig,
    /// Symbols whose live prices are streamed from startup.
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub trade_sync: TradeSyncConfig,
    #[serde(default)]
    pub account: AccountSyncConfig,
    #[serde(default)]
    pub orders: OrderSyncConfig,
    #[serde(default)]
    pub prices: PriceFeedConfig,
}

fn default_symbols() -> Vec<String> {
    vec![REFERENCE_SYMBOL.to_string()]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            venue: VenueConfig::default(),
            symbols: default_symbols(),
            store: StoreConfig::default(),
            discovery: DiscoveryConfig::default(),
            trade_sync: TradeSyncConfig::default(),
            account: AccountSyncConfig::default(),
            orders: OrderSyncConfig::default(),
            prices: PriceFeedConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from a file, then apply environment overrides.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config {path}: {e}")))?;

        let mut config = Self::from_toml_str(&content)?;
        config.apply_credentials(
            std::env::var(API_KEY_ENV).ok(),
            std::env::var(API_SECRET_ENV).ok(),
        );
        Ok(config)
    }

    /// Parse, normalize and validate TOML content.
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        let mut config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.ensure_reference_symbol();
        config.validate()?;
        Ok(config)
    }

    /// Override credentials with non-empty values.
    pub fn apply_credentials(&mut self, api_key: Option<String>, api_secret: Option<String>) {
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            self.venue.api_key = key;
        }
        if let Some(secret) = api_secret.filter(|s| !s.is_empty()) {
            self.venue.api_secret = secret;
        }
    }

    /// Add the reference symbol and drop duplicates, keeping order.
    pub fn ensure_reference_symbol(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.symbols.retain(|s| seen.insert(s.clone()));
        if !self.symbols.iter().any(|s| s == REFERENCE_SYMBOL) {
            self.symbols.insert(0, REFERENCE_SYMBOL.to_string());
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.trade_sync.page_size == 0 {
            return Err(AppError::Config("trade_sync.page_size must be > 0".to_string()));
        }
        if self.trade_sync.call_budget == 0 {
            return Err(AppError::Config("trade_sync.call_budget must be > 0".to_string()));
        }
        if self.discovery.probes_per_pass == 0 {
            return Err(AppError::Config(
                "discovery.probes_per_pass must be > 0".to_string(),
            ));
        }
        if self.prices.publish_interval_ms == 0 {
            return Err(AppError::Config(
                "prices.publish_interval_ms must be > 0".to_string(),
            ));
        }
        if self.store.journal && self.store.data_dir.is_empty() {
            return Err(AppError::Config(
                "store.data_dir must be set when the journal is enabled".to_string(),
            ));
        }
        Ok(())
    }
}
