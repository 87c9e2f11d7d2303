//! Instrumented remote calls.

use std::future::Future;
use std::time::Instant;

use tradesync_telemetry::Metrics;
use tradesync_venue::VenueResult;

/// Await a venue call and record its outcome and latency.
pub(crate) async fn call<T>(
    endpoint: &'static str,
    fut: impl Future<Output = VenueResult<T>>,
) -> VenueResult<T> {
    let started = Instant::now();
    let result = fut.await;
    Metrics::remote_call(
        endpoint,
        result.is_ok(),
        started.elapsed().as_secs_f64() * 1000.0,
    );
    result
}
