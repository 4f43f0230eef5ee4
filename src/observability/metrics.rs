//! Metrics collection and exposition.
//!
//! # Metrics
//! - `service_http_requests_total` (counter): requests by method, status
//! - `service_http_request_duration_seconds` (histogram): latency distribution
//! - `service_in_flight_work` (gauge): units of work currently in flight
//! - `service_lifecycle_state` (gauge): 0=starting 1=running 2=draining 3=stopped
//! - `service_recovered_faults_total` (counter): faults caught at a recovery boundary
//! - `service_rate_limited_total` (counter): requests rejected by the limiter
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Exporter failure is logged, never fatal

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::lifecycle::LifecycleState;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one completed request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "service_http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("service_http_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn set_in_flight(count: usize) {
    gauge!("service_in_flight_work").set(count as f64);
}

pub fn record_lifecycle_state(state: LifecycleState) {
    gauge!("service_lifecycle_state").set(f64::from(state.code()));
}

/// `kind` is `request` or `background`.
pub fn record_recovered_fault(kind: &'static str) {
    counter!("service_recovered_faults_total", "kind" => kind).increment(1);
}

pub fn record_rate_limited() {
    counter!("service_rate_limited_total").increment(1);
}
