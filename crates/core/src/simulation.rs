//! Simulated buyer traffic.
//!
//! Submits one purchase request per simulated buyer, spaced by a fixed
//! arrival interval, each from its own task so submissions race the
//! dispatcher the way independent clients would.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::dispatcher::Dispatcher;
use crate::pool::RequesterId;

/// Configuration for the simulated buyers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Run the simulation at startup.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Number of simulated buyers; requester ids are `1..=buyers`.
    #[serde(default = "default_buyers")]
    pub buyers: u64,

    /// Pause between two buyer arrivals (milliseconds).
    #[serde(default = "default_arrival_interval")]
    pub arrival_interval_ms: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_buyers() -> u64 {
    20
}

fn default_arrival_interval() -> u64 {
    100
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            buyers: default_buyers(),
            arrival_interval_ms: default_arrival_interval(),
        }
    }
}

/// Submission tally of a simulation run.
///
/// Counts submissions only; allocation outcomes go to the dispatcher sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub accepted: u64,
    pub refused: u64,
}

/// Submit one request per simulated buyer and wait until every submission
/// call has returned.
pub async fn run_simulation(
    dispatcher: Arc<Dispatcher>,
    config: &SimulationConfig,
) -> SimulationReport {
    info!(
        buyers = config.buyers,
        arrival_interval_ms = config.arrival_interval_ms,
        "Starting buyer simulation"
    );

    let interval = Duration::from_millis(config.arrival_interval_ms);
    let mut submissions = Vec::with_capacity(config.buyers as usize);

    for requester_id in 1..=config.buyers {
        let dispatcher = Arc::clone(&dispatcher);
        submissions.push(tokio::spawn(async move {
            submit_one(&dispatcher, requester_id).await
        }));

        if requester_id < config.buyers && !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
    }

    let mut report = SimulationReport::default();
    for result in join_all(submissions).await {
        match result {
            Ok(true) => report.accepted += 1,
            Ok(false) => report.refused += 1,
            Err(e) => {
                warn!("Simulated buyer task failed: {}", e);
                report.refused += 1;
            }
        }
    }

    info!(
        accepted = report.accepted,
        refused = report.refused,
        "Buyer simulation finished submitting"
    );
    report
}

async fn submit_one(dispatcher: &Dispatcher, requester_id: RequesterId) -> bool {
    match dispatcher.submit(requester_id).await {
        Ok(()) => true,
        Err(e) => {
            warn!(requester_id, "Simulated purchase not submitted: {}", e);
            false
        }
    }
}
