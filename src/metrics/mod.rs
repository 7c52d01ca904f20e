//! Metrics module
//!
//! Prometheus counters and histograms for the upload path, exposed on the
//! gateway's `/metrics` route.

use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_histogram_vec, Counter, CounterVec,
    HistogramVec,
};

lazy_static! {
    // Upload metrics
    pub static ref UPLOADS_TOTAL: CounterVec = register_counter_vec!(
        "media_gateway_uploads_total",
        "Total number of uploads",
        &["kind", "status"]  // status: success, failure, rejected
    ).unwrap();

    pub static ref UPLOAD_BYTES_TOTAL: Counter = register_counter!(
        "media_gateway_upload_bytes_total",
        "Total bytes forwarded to the provider"
    ).unwrap();

    pub static ref UPLOAD_DURATION: HistogramVec = register_histogram_vec!(
        "media_gateway_upload_duration_seconds",
        "Provider upload duration in seconds",
        &["kind"],
        vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    ).unwrap();

    // Error metrics
    pub static ref ERRORS_TOTAL: CounterVec = register_counter_vec!(
        "media_gateway_errors_total",
        "Total errors",
        &["type"]
    ).unwrap();
}

/// Record a successful upload
pub fn record_upload_success(kind: &str, bytes: u64) {
    UPLOADS_TOTAL.with_label_values(&[kind, "success"]).inc();
    UPLOAD_BYTES_TOTAL.inc_by(bytes as f64);
}

/// Record an upload the provider refused or that failed in transit
pub fn record_upload_failure(kind: &str) {
    UPLOADS_TOTAL.with_label_values(&[kind, "failure"]).inc();
}

/// Record an upload rejected locally before any provider call
pub fn record_upload_rejected(kind: &str) {
    UPLOADS_TOTAL.with_label_values(&[kind, "rejected"]).inc();
}

/// Record provider upload duration
pub fn record_upload_duration(kind: &str, duration_secs: f64) {
    UPLOAD_DURATION
        .with_label_values(&[kind])
        .observe(duration_secs);
}

/// Record an error
pub fn record_error(error_type: &str) {
    ERRORS_TOTAL.with_label_values(&[error_type]).inc();
}
