//! Sync error types.

use thiserror::Error;
use tradesync_core::CoreError;
use tradesync_store::StoreError;
use tradesync_venue::VenueError;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Venue error: {0}")]
    Venue(#[from] VenueError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

impl SyncError {
    /// Failure confined to one symbol's turn (remote call or symbol lookup).
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Venue(_) | Self::Core(_))
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
