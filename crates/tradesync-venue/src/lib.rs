//! Exchange client contract and symbol catalog for tradesync.
//!
//! The venue is an external collaborator. This crate defines what the
//! synchronizer needs from it ([`ExchangeClient`]), the symbol universe
//! fetched once at startup ([`SymbolCatalog`]), and an in-process
//! [`ReplayVenue`] that serves account data from a JSON fixture.

pub mod catalog;
pub mod client;
pub mod error;
pub mod replay;

pub use catalog::{SymbolCatalog, STABLE_ASSETS};
pub use client::{ExchangeClient, FillQuery, TickReceiver, MAX_FILL_PAGE};
pub use error::{VenueError, VenueResult};
pub use replay::{ReplayFixture, ReplayVenue};
