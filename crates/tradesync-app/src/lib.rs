//! tradesync application.
//!
//! Wires the venue, repository and synchronization workers together:
//! - Symbol catalog fetched once at startup
//! - Discovery, trade sync, account and order snapshot workers
//! - Live price feed for the configured symbols
//! - Graceful shutdown on ctrl-c

pub mod app;
pub mod config;
pub mod error;

pub use app::{Application, RunningApp};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
