//! Persistence for tradesync.
//!
//! Defines the [`Repository`] contract the workers share and provides
//! [`MemoryRepository`], an in-memory implementation that can journal
//! primary records to a JSON Lines file and rebuild itself on restart.

pub mod error;
pub mod journal;
pub mod memory;
pub mod repository;

pub use error::{StoreError, StoreResult};
pub use journal::{Journal, JournalRecord};
pub use memory::MemoryRepository;
pub use repository::{Repository, SyncState};
