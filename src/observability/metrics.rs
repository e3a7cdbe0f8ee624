//! Prometheus metrics for the gateway
//!
//! - HTTP request metrics (count, duration)
//! - Authorization cache lookups (hit, miss)
//! - Permission checks against the control plane by outcome
//! - Metrics backend queries by service and status
//!
//! # Cardinality Control
//!
//! Namespaces, pod names and raw PromQL never become label values. HTTP paths
//! are the matched route template, and status codes are bucketed.
//!
//! Recording is a no-op until a recorder is installed, so library users that
//! never call [`super::recorder::init_metrics`] pay nothing.

use metrics::{counter, histogram};
use std::time::Duration;

/// Request status for metrics labeling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Success,
    Error,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Success => "success",
            RequestStatus::Error => "error",
        }
    }
}

/// Bucket HTTP status codes to control cardinality
pub fn bucket_status_code(status: u16) -> &'static str {
    match status {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}

/// HTTP request metrics recording
pub fn record_http_request(method: &str, path: &str, status_code: u16, duration: Duration) {
    let status_bucket = bucket_status_code(status_code);

    counter!(
        "http_request_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_bucket
    )
    .increment(1);

    histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_bucket
    )
    .record(duration.as_secs_f64());
}

/// Authorization cache lookup
pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("authorization_cache_lookup_total", "result" => result).increment(1);
}

/// Completed permission check against the control plane
///
/// `outcome` is one of `allowed`, `denied`, `connectivity_error`,
/// `authorization_error` or `aborted`.
pub fn record_authorization_check(outcome: &'static str, duration: Duration) {
    counter!("authorization_check_total", "outcome" => outcome).increment(1);
    histogram!("authorization_check_duration_seconds", "outcome" => outcome)
        .record(duration.as_secs_f64());

    tracing::debug!(
        outcome = %outcome,
        duration_ms = %duration.as_millis(),
        "Authorization check metrics recorded"
    );
}

/// Query submitted to the metrics backend
pub fn record_backend_query(service: &'static str, status: RequestStatus, duration: Duration) {
    counter!(
        "metrics_query_total",
        "service" => service,
        "status" => status.as_str()
    )
    .increment(1);

    histogram!(
        "metrics_query_duration_seconds",
        "service" => service,
        "status" => status.as_str()
    )
    .record(duration.as_secs_f64());
}
