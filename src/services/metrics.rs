// Prometheus metrics for the public resolver
// Registered in the default registry on first use and rendered at /metrics.

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter_vec, Encoder, Histogram, IntCounterVec, TextEncoder,
};

lazy_static! {
    static ref REDIRECT_OUTCOMES: IntCounterVec = register_int_counter_vec!(
        "qr_redirect_outcomes_total",
        "Resolved scans by outcome",
        &["outcome"]
    )
    .expect("redirect outcome counter registers once");

    static ref SCAN_RECORD_FAILURES: IntCounterVec = register_int_counter_vec!(
        "qr_scan_record_failures_total",
        "Scan writes that failed and were swallowed",
        &["write"]
    )
    .expect("scan failure counter registers once");

    static ref GEO_FAILURES: IntCounterVec = register_int_counter_vec!(
        "qr_geolocation_failures_total",
        "Geolocation lookups that degraded to Unknown",
        &["kind"]
    )
    .expect("geo failure counter registers once");

    static ref RESOLVE_LATENCY: Histogram = register_histogram!(
        "qr_resolve_duration_seconds",
        "Time spent resolving a scan, attribution and recording included",
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("resolve latency histogram registers once");
}

pub fn record_outcome(outcome: &str) {
    REDIRECT_OUTCOMES.with_label_values(&[outcome]).inc();
}

pub fn record_scan_failure(write: &str) {
    SCAN_RECORD_FAILURES.with_label_values(&[write]).inc();
}

pub fn record_geo_failure() {
    GEO_FAILURES.with_label_values(&["lookup"]).inc();
}

pub fn observe_resolve_seconds(seconds: f64) {
    RESOLVE_LATENCY.observe(seconds);
}

/// Current value of an outcome counter
pub fn outcome_count(outcome: &str) -> u64 {
    REDIRECT_OUTCOMES.with_label_values(&[outcome]).get()
}

/// Render the default registry in the Prometheus text format
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
