//! Prometheus metrics for the middleware pipeline.
//!
//! Metrics are exposed on a dedicated listener when `METRICS_PORT` is set.
//! Recording functions are no-ops until a recorder is installed, so tests and
//! deployments without a metrics port pay nothing.
//!
//! # Available Metrics
//!
//! ## Counters
//! - `tejelanas_cache_lookups_total` - Response cache lookups (label: result = hit|miss)
//! - `tejelanas_cache_stores_total` - Responses written to the cache
//! - `tejelanas_rate_limit_rejections_total` - Requests rejected with 429
//! - `tejelanas_auth_failures_total` - Requests rejected with 401 (label: reason)
//!
//! ## Gauges
//! - `tejelanas_cache_entries` - Entries held by the store after the last purge

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

/// Metric names as constants for consistency.
pub mod names {
    pub const CACHE_LOOKUPS_TOTAL: &str = "tejelanas_cache_lookups_total";
    pub const CACHE_STORES_TOTAL: &str = "tejelanas_cache_stores_total";
    pub const RATE_LIMIT_REJECTIONS_TOTAL: &str = "tejelanas_rate_limit_rejections_total";
    pub const AUTH_FAILURES_TOTAL: &str = "tejelanas_auth_failures_total";
    pub const CACHE_ENTRIES: &str = "tejelanas_cache_entries";
}

/// Initialize the Prometheus metrics exporter.
///
/// Installs the global recorder, starts the HTTP listener on `metrics_addr`
/// and registers metric descriptions.
pub fn init_metrics(metrics_addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        names::CACHE_LOOKUPS_TOTAL,
        "Response cache lookups by result (hit or miss)"
    );
    describe_counter!(
        names::CACHE_STORES_TOTAL,
        "Total number of responses written to the cache"
    );
    describe_counter!(
        names::RATE_LIMIT_REJECTIONS_TOTAL,
        "Total number of requests rejected by the rate limiter"
    );
    describe_counter!(
        names::AUTH_FAILURES_TOTAL,
        "Total number of requests rejected by bearer authentication"
    );
    describe_gauge!(
        names::CACHE_ENTRIES,
        "Entries held by the cache store after the last purge"
    );

    info!(addr = %metrics_addr, "Prometheus metrics endpoint started");
    Ok(())
}

// =============================================================================
// Recording Functions
// =============================================================================

/// Record a response cache lookup.
pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!(names::CACHE_LOOKUPS_TOTAL, "result" => result).increment(1);
}

pub fn record_cache_store() {
    counter!(names::CACHE_STORES_TOTAL).increment(1);
}

pub fn record_rate_limit_rejection() {
    counter!(names::RATE_LIMIT_REJECTIONS_TOTAL).increment(1);
}

/// Record an authentication failure; `reason` is a short static label.
pub fn record_auth_failure(reason: &'static str) {
    counter!(names::AUTH_FAILURES_TOTAL, "reason" => reason).increment(1);
}

/// Update the store size gauge.
pub fn set_cache_entries(entries: usize) {
    gauge!(names::CACHE_ENTRIES).set(entries as f64);
}
