//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the ticketrush server:
//! - HTTP request metrics (latency, counts)
//! - Dispatcher status (collected dynamically)
//! - Core allocation metrics (registered from `ticketrush_core::metrics`)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "ticketrush_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ticketrush_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "ticketrush_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Dispatcher Metrics (collected dynamically)
// =============================================================================

/// Dispatcher running state (1 = running, 0 = stopped).
pub static DISPATCHER_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "ticketrush_dispatcher_running",
        "Whether the dispatcher pull loop is running (1) or stopped (0)",
    )
    .unwrap()
});

/// Dispatcher intake state (1 = accepting, 0 = closed).
pub static DISPATCHER_ACCEPTING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "ticketrush_dispatcher_accepting",
        "Whether the dispatcher accepts new submissions (1) or is closed (0)",
    )
    .unwrap()
});

/// Tickets sold so far.
pub static TICKETS_PURCHASED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("ticketrush_tickets_purchased", "Number of tickets sold").unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Dispatcher
    registry
        .register(Box::new(DISPATCHER_RUNNING.clone()))
        .unwrap();
    registry
        .register(Box::new(DISPATCHER_ACCEPTING.clone()))
        .unwrap();
    registry
        .register(Box::new(TICKETS_PURCHASED.clone()))
        .unwrap();

    // Core metrics (intake, allocation, pool)
    for metric in ticketrush_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so gauges reflect the dispatcher and pool as
/// they are right now.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let status = state.dispatcher().status();
    DISPATCHER_RUNNING.set(i64::from(status.running));
    DISPATCHER_ACCEPTING.set(i64::from(status.accepting));

    let snapshot = state.store().snapshot();
    TICKETS_PURCHASED.set(snapshot.purchased as i64);
    ticketrush_core::metrics::TICKETS_AVAILABLE.set(snapshot.available as i64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics().unwrap();
        assert!(output.contains("ticketrush_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_core_metrics() {
        // Prometheus only outputs vectors that have at least one label set
        ticketrush_core::metrics::ALLOCATIONS
            .with_label_values(&["allocated"])
            .inc_by(0);
        ticketrush_core::metrics::TICKETS_AVAILABLE.set(0);
        DISPATCHER_RUNNING.set(0);

        let output = encode_metrics().unwrap();
        assert!(output.contains("ticketrush_allocations_total"));
        assert!(output.contains("ticketrush_tickets_available"));
        assert!(output.contains("ticketrush_requests_submitted_total"));
        assert!(output.contains("ticketrush_dispatcher_running"));
    }
}
