//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_dispatch_total` (counter): lookups by outcome
//! - `router_request_duration_seconds` (histogram): latency seen by the
//!   `trace` interceptor, by method and status
//! - `router_context_pool_idle` (gauge): contexts waiting for reuse
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; nothing is exported unless
//!   `init_metrics` installs the Prometheus recorder

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// How a dispatch was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Matched,
    NotFound,
    MethodNotAllowed,
}

impl DispatchOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            DispatchOutcome::Matched => "matched",
            DispatchOutcome::NotFound => "not_found",
            DispatchOutcome::MethodNotAllowed => "method_not_allowed",
        }
    }
}

/// Install the Prometheus recorder and its scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, address = %addr, "Failed to install metrics exporter"),
    }
}

pub fn record_dispatch(outcome: DispatchOutcome) {
    metrics::counter!("router_dispatch_total", "outcome" => outcome.as_str()).increment(1);
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::histogram!(
        "router_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_pool_idle(idle: usize) {
    metrics::gauge!("router_context_pool_idle").set(idle as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_labels() {
        assert_eq!(DispatchOutcome::Matched.as_str(), "matched");
        assert_eq!(DispatchOutcome::NotFound.as_str(), "not_found");
        assert_eq!(DispatchOutcome::MethodNotAllowed.as_str(), "method_not_allowed");
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_dispatch(DispatchOutcome::Matched);
        record_pool_idle(3);
        record_request("GET", 200, Instant::now());
    }
}
