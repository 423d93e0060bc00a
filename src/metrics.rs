//! Prometheus metrics for request outcomes and store latency.

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::debug;

// === Metric Name Constants ===

/// Store query latency metric name.
pub const METRIC_STORE_QUERY_LATENCY: &str = "store_query_latency_ms";
/// HTTP handler latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";
/// Schools added counter metric name.
pub const METRIC_SCHOOLS_ADDED: &str = "schools_added_total";
/// Duplicate submissions counter metric name.
pub const METRIC_DUPLICATES_REJECTED: &str = "schools_duplicates_rejected_total";
/// Validation failures counter metric name.
pub const METRIC_VALIDATION_FAILURES: &str = "validation_failures_total";
/// Proximity list requests counter metric name.
pub const METRIC_LIST_REQUESTS: &str = "list_requests_total";
/// API error responses counter metric name.
pub const METRIC_API_ERRORS: &str = "api_errors_total";

/// Install the Prometheus recorder and describe all metrics.
/// Call this once at startup; the handle renders `/metrics`.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    describe_histogram!(
        METRIC_STORE_QUERY_LATENCY,
        "Store query latency in milliseconds"
    );
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "HTTP handler latency in milliseconds"
    );

    describe_counter!(METRIC_SCHOOLS_ADDED, "Total number of schools added");
    describe_counter!(
        METRIC_DUPLICATES_REJECTED,
        "Total number of duplicate school submissions"
    );
    describe_counter!(
        METRIC_VALIDATION_FAILURES,
        "Total number of requests rejected by validation"
    );
    describe_counter!(
        METRIC_LIST_REQUESTS,
        "Total number of proximity list requests served"
    );
    describe_counter!(METRIC_API_ERRORS, "Total number of error responses by kind");

    debug!("Metrics initialized");
    Ok(handle)
}

/// Increment schools added counter.
pub fn inc_schools_added() {
    counter!(METRIC_SCHOOLS_ADDED).increment(1);
}

/// Increment duplicate submissions counter.
pub fn inc_duplicates_rejected() {
    counter!(METRIC_DUPLICATES_REJECTED).increment(1);
}

/// Increment validation failures counter.
pub fn inc_validation_failures(endpoint: &'static str) {
    counter!(METRIC_VALIDATION_FAILURES, "endpoint" => endpoint).increment(1);
}

/// Increment list requests counter.
pub fn inc_list_requests() {
    counter!(METRIC_LIST_REQUESTS).increment(1);
}

/// Increment API errors counter.
pub fn inc_api_errors(kind: &'static str) {
    counter!(METRIC_API_ERRORS, "kind" => kind).increment(1);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
    label: (&'static str, &'static str),
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric and label pair.
    pub fn new(metric_name: &'static str, label: (&'static str, &'static str)) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
            label,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        let (key, value) = self.label;
        histogram!(self.metric_name, key => value).record(self.elapsed_ms());
    }
}

/// Create a latency timer for a store query.
pub fn timer_store_query(operation: &'static str) -> LatencyTimer {
    LatencyTimer::new(METRIC_STORE_QUERY_LATENCY, ("operation", operation))
}

/// Create a latency timer for an HTTP handler. Hold it for the whole
/// handler so error returns are timed too.
pub fn timer_http_request(endpoint: &'static str) -> LatencyTimer {
    LatencyTimer::new(METRIC_HTTP_REQUEST_LATENCY, ("endpoint", endpoint))
}
