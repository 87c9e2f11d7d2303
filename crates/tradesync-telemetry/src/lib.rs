//! Prometheus metrics and structured logging for tradesync.
//!
//! - Prometheus counters for remote calls, stored trades, worker cycles
//! - Structured logging with tracing (JSON in production)

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
