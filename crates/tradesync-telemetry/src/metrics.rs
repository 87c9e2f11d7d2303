//! Prometheus metrics for tradesync.
//!
//! Covers:
//! - Remote venue calls by endpoint and outcome
//! - Trades stored by sync direction
//! - Income recomputation
//! - Worker cycle outcomes
//! - Live tick ingestion
//! - Account snapshot totals
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. If registration fails,
//! it indicates a fatal configuration error (e.g., duplicate metric names)
//! that should cause an immediate crash at startup rather than silent failure.
//! These panics only occur during static initialization, never at runtime.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_gauge_vec, register_histogram_vec,
    register_int_gauge, CounterVec, Gauge, GaugeVec, HistogramVec, IntGauge,
};

/// Remote venue calls.
/// Labels: endpoint (my_fills/account/tickers/open_orders/symbols/subscribe), outcome (ok/error)
pub static REMOTE_CALLS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tradesync_remote_calls_total",
        "Total remote venue calls",
        &["endpoint", "outcome"]
    )
    .unwrap()
});

/// Remote call latency in milliseconds.
pub static REMOTE_CALL_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "tradesync_remote_call_latency_ms",
        "Remote venue call latency in milliseconds",
        &["endpoint"],
        vec![1.0, 5.0, 10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 5000.0]
    )
    .unwrap()
});

/// Trades newly stored.
/// Labels: symbol, direction (backward/forward)
pub static TRADES_STORED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tradesync_trades_stored_total",
        "Total trades newly stored",
        &["symbol", "direction"]
    )
    .unwrap()
});

/// Fills rejected at ingestion.
pub static FILLS_REJECTED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tradesync_fills_rejected_total",
        "Total fills rejected at ingestion",
        &["symbol"]
    )
    .unwrap()
});

/// Income set recomputations.
pub static INCOMES_RECOMPUTED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tradesync_incomes_recomputed_total",
        "Total derived income recomputations",
        &["symbol"]
    )
    .unwrap()
});

/// Worker cycles.
/// Labels: worker, outcome (ok/error)
pub static WORKER_CYCLES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tradesync_worker_cycles_total",
        "Total worker cycles",
        &["worker", "outcome"]
    )
    .unwrap()
});

/// Ticks written to the repository.
pub static TICKS_RECORDED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tradesync_ticks_recorded_total",
        "Total ticks recorded",
        &["symbol"]
    )
    .unwrap()
});

/// Backward scan completion per symbol (1 = complete).
pub static BACKFILL_COMPLETE: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "tradesync_backfill_complete",
        "Backward history scan complete (1=complete)",
        &["symbol"]
    )
    .unwrap()
});

/// Active tick subscriptions.
pub static PRICE_SUBSCRIPTIONS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "tradesync_price_subscriptions",
        "Active live price subscriptions"
    )
    .unwrap()
});

/// Account total balance from the latest snapshot.
pub static ACCOUNT_TOTAL_BALANCE: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "tradesync_account_total_balance",
        "Account total balance in quote currency"
    )
    .unwrap()
});

/// Account unrealized profit from the latest snapshot.
pub static ACCOUNT_UNREALIZED_PROFIT: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "tradesync_account_unrealized_profit",
        "Account total unrealized profit in quote currency"
    )
    .unwrap()
});

/// Metrics helper.
pub struct Metrics;

impl Metrics {
    /// Record a remote call with its latency.
    pub fn remote_call(endpoint: &str, ok: bool, latency_ms: f64) {
        let outcome = if ok { "ok" } else { "error" };
        REMOTE_CALLS_TOTAL
            .with_label_values(&[endpoint, outcome])
            .inc();
        REMOTE_CALL_LATENCY_MS
            .with_label_values(&[endpoint])
            .observe(latency_ms);
    }

    /// Record newly stored trades.
    pub fn trades_stored(symbol: &str, direction: &str, count: usize) {
        if count == 0 {
            return;
        }
        TRADES_STORED_TOTAL
            .with_label_values(&[symbol, direction])
            .inc_by(count as f64);
    }

    pub fn fill_rejected(symbol: &str) {
        FILLS_REJECTED_TOTAL.with_label_values(&[symbol]).inc();
    }

    pub fn incomes_recomputed(symbol: &str) {
        INCOMES_RECOMPUTED_TOTAL.with_label_values(&[symbol]).inc();
    }

    /// Record a worker cycle outcome.
    pub fn worker_cycle(worker: &str, ok: bool) {
        let outcome = if ok { "ok" } else { "error" };
        WORKER_CYCLES_TOTAL
            .with_label_values(&[worker, outcome])
            .inc();
    }

    pub fn tick_recorded(symbol: &str) {
        TICKS_RECORDED_TOTAL.with_label_values(&[symbol]).inc();
    }

    pub fn backfill_complete(symbol: &str) {
        BACKFILL_COMPLETE.with_label_values(&[symbol]).set(1.0);
    }

    pub fn price_subscriptions_set(count: usize) {
        PRICE_SUBSCRIPTIONS.set(count as i64);
    }

    /// Update account totals.
    pub fn account_snapshot(total_balance: f64, unrealized_profit: f64) {
        ACCOUNT_TOTAL_BALANCE.set(total_balance);
        ACCOUNT_UNREALIZED_PROFIT.set(unrealized_profit);
    }

    /// Encode every registered metric in the Prometheus text format.
    pub fn render() -> String {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        if encoder.encode(&prometheus::gather(), &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}
