//! Types for the allocation dispatcher.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Instant;

use crate::pool::RequesterId;

/// Errors returned to callers of the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DispatcherError {
    /// The intake has been closed; the request was not accepted.
    #[error("dispatcher is closed")]
    Closed,

    /// `start` was called on a dispatcher that is already running.
    #[error("dispatcher already started")]
    AlreadyStarted,
}

/// A purchase request travelling through the intake.
#[derive(Debug, Clone, Copy)]
pub struct PurchaseRequest {
    pub requester_id: RequesterId,
    pub submitted_at: Instant,
}

impl PurchaseRequest {
    pub fn new(requester_id: RequesterId) -> Self {
        Self {
            requester_id,
            submitted_at: Instant::now(),
        }
    }
}

/// Current status of the dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherStatus {
    /// Whether the pull loop is running.
    pub running: bool,
    /// Whether new submissions are accepted.
    pub accepting: bool,
    /// Requests accepted into the intake since creation.
    pub submitted: u64,
    /// Accepted requests without an outcome yet.
    pub in_flight: u64,
    /// Requests that received a ticket.
    pub allocated: u64,
    /// Requests that were turned away.
    pub rejected: u64,
}

impl DispatcherStatus {
    /// Requests that reached a terminal outcome.
    pub fn completed(&self) -> u64 {
        self.allocated + self.rejected
    }
}
