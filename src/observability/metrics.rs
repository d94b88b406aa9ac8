//! Metrics collection and exposition.
//!
//! # Metrics
//! - `sw_route_merges_total` (counter): annotated routes merged
//! - `sw_regenerations_total` (counter): successful worker generations
//! - `sw_generation_failures_total` (counter): failed generations
//! - `sw_generation_duration_seconds` (histogram): generation latency
//! - `sw_requests_total` (counter): plugin endpoint requests by path, status

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_route_merge() {
    counter!("sw_route_merges_total").increment(1);
}

pub fn record_regeneration(started: Instant) {
    counter!("sw_regenerations_total").increment(1);
    histogram!("sw_generation_duration_seconds").record(started.elapsed().as_secs_f64());
}

pub fn record_generation_failure() {
    counter!("sw_generation_failures_total").increment(1);
}

pub fn record_request(path: &'static str, status: u16) {
    counter!("sw_requests_total", "path" => path, "status" => status.to_string()).increment(1);
}
