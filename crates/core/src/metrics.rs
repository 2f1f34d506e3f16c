//! Prometheus metrics for the allocation engine.
//!
//! This module provides metrics for:
//! - Intake (submissions accepted and refused)
//! - Allocation units (in flight, outcomes, wait time)
//! - Pool availability

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Intake Metrics
// =============================================================================

/// Purchase requests accepted into the intake.
pub static REQUESTS_SUBMITTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "ticketrush_requests_submitted_total",
        "Total purchase requests accepted into the intake",
    )
    .unwrap()
});

/// Submissions refused because the dispatcher was closed.
pub static SUBMISSIONS_REFUSED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "ticketrush_submissions_refused_total",
        "Total submissions refused after the intake was closed",
    )
    .unwrap()
});

// =============================================================================
// Allocation Metrics
// =============================================================================

/// Allocation outcomes by result.
pub static ALLOCATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ticketrush_allocations_total", "Total allocation outcomes"),
        &["result"], // "allocated", "no_tickets_available", "request_timed_out"
    )
    .unwrap()
});

/// Time from submission to allocation decision.
pub static ALLOCATION_WAIT: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "ticketrush_allocation_wait_seconds",
            "Time between submission and allocation decision",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.15, 0.2, 0.25, 0.3, 0.5, 1.0, 2.5, 5.0]),
        &["result"],
    )
    .unwrap()
});

/// Allocation units currently waiting or running.
pub static REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "ticketrush_requests_in_flight",
        "Number of accepted requests without an outcome yet",
    )
    .unwrap()
});

// =============================================================================
// Pool Metrics
// =============================================================================

/// Tickets left to sell, updated after every allocation.
pub static TICKETS_AVAILABLE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "ticketrush_tickets_available",
        "Number of tickets not yet sold",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Intake
        Box::new(REQUESTS_SUBMITTED.clone()),
        Box::new(SUBMISSIONS_REFUSED.clone()),
        // Allocation
        Box::new(ALLOCATIONS.clone()),
        Box::new(ALLOCATION_WAIT.clone()),
        Box::new(REQUESTS_IN_FLIGHT.clone()),
        // Pool
        Box::new(TICKETS_AVAILABLE.clone()),
    ]
}
