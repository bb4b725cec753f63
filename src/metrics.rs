//! Prometheus metrics for upstream fetches, normalization and the HTTP API.
//!
//! This module provides metrics for:
//! - Upstream fetch latency, volume and failures
//! - Records that could not be normalized
//! - HTTP request latency per endpoint

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::debug;

// === Metric Name Constants ===

/// Upstream fetch latency metric name.
pub const METRIC_FETCH_LATENCY: &str = "markets_fetch_latency_ms";
/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";
/// Markets fetched counter metric name.
pub const METRIC_MARKETS_FETCHED: &str = "markets_fetched_total";
/// Fetch failures counter metric name.
pub const METRIC_FETCH_FAILURES: &str = "markets_fetch_failures_total";
/// Normalization failures counter metric name.
pub const METRIC_NORMALIZE_FAILURES: &str = "markets_normalize_failures_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_FETCH_LATENCY,
        "Upstream markets fetch latency in milliseconds"
    );
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "HTTP request latency in milliseconds"
    );

    describe_counter!(
        METRIC_MARKETS_FETCHED,
        "Total number of raw markets fetched from the CLOB"
    );
    describe_counter!(
        METRIC_FETCH_FAILURES,
        "Total number of failed upstream fetches"
    );
    describe_counter!(
        METRIC_NORMALIZE_FAILURES,
        "Total number of raw records that could not be read as markets"
    );

    debug!("Metrics initialized");
}

/// Install the Prometheus recorder and return a handle for rendering.
pub fn install_prometheus() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    init_metrics();
    Ok(handle)
}

/// Record upstream fetch latency.
pub fn record_fetch_latency(start: Instant) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_FETCH_LATENCY).record(latency_ms);
}

/// Record HTTP request latency.
pub fn record_http_latency(start: Instant, endpoint: &'static str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_HTTP_REQUEST_LATENCY, "endpoint" => endpoint).record(latency_ms);
}

/// Add to the markets fetched counter.
pub fn add_markets_fetched(count: u64) {
    counter!(METRIC_MARKETS_FETCHED).increment(count);
}

/// Increment fetch failures counter.
pub fn inc_fetch_failures() {
    counter!(METRIC_FETCH_FAILURES).increment(1);
}

/// Increment normalization failures counter.
pub fn inc_normalize_failures() {
    counter!(METRIC_NORMALIZE_FAILURES).increment(1);
}

/// RAII guard for timing HTTP handlers.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    endpoint: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given endpoint.
    pub fn new(endpoint: &'static str) -> Self {
        Self {
            start: Instant::now(),
            endpoint,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        record_http_latency(self.start, self.endpoint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn latency_timer_measures_time() {
        let timer = LatencyTimer::new("/test");
        sleep(Duration::from_millis(10));
        let elapsed = timer.elapsed_ms();
        assert!(elapsed >= 9.0); // Allow some tolerance
        // Timer will record on drop
    }
}
