//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Venue error: {0}")]
    Venue(#[from] tradesync_venue::VenueError),

    #[error("Store error: {0}")]
    Store(#[from] tradesync_store::StoreError),

    #[error("Sync error: {0}")]
    Sync(#[from] tradesync_sync::SyncError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] tradesync_telemetry::TelemetryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
