//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): responses by format, status
//! - `gateway_dispatch_duration_seconds` (histogram): time spent producing a response
//! - `gateway_delivery_failures_total` (counter): responses the front-end could not take
//! - `gateway_queue_errors_total` (counter): fatal inbound queue failures

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::message::DataFormat;

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one processed request.
pub fn record_request(format: &DataFormat, status: u16, start: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "format" => format.metric_label(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "gateway_dispatch_duration_seconds",
        "format" => format.metric_label()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_delivery_failure() {
    metrics::counter!("gateway_delivery_failures_total").increment(1);
}

pub fn record_queue_error() {
    metrics::counter!("gateway_queue_errors_total").increment(1);
}
