use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{info, warn};

use super::{OutcomeEnvelope, OutcomeEvent};

/// Receiver of allocation outcomes.
///
/// Called from allocation tasks after the store lock has been released.
/// Implementations must not block for long: every in-flight request reports
/// through the same sink.
pub trait OutcomeSink: Send + Sync {
    fn record(&self, outcome: &OutcomeEnvelope);
}

impl<F> OutcomeSink for F
where
    F: Fn(&OutcomeEnvelope) + Send + Sync,
{
    fn record(&self, outcome: &OutcomeEnvelope) {
        self(outcome)
    }
}

/// Writes each outcome to the `tracing` log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl OutcomeSink for TracingSink {
    fn record(&self, outcome: &OutcomeEnvelope) {
        match &outcome.event {
            OutcomeEvent::Allocated {
                requester_id,
                ticket_id,
                remaining,
            } => info!(
                requester_id,
                ticket_id,
                remaining,
                "Requester {} purchased ticket {} ({} remaining)",
                requester_id,
                ticket_id,
                remaining
            ),
            OutcomeEvent::Rejected {
                requester_id,
                reason,
            } => warn!(
                requester_id,
                reason = reason.as_str(),
                "Requester {} rejected: {}",
                requester_id,
                reason.as_str()
            ),
        }
    }
}

/// Keeps outcomes in memory, optionally bounded to the most recent `capacity`.
#[derive(Debug, Default)]
pub struct MemorySink {
    outcomes: Mutex<VecDeque<OutcomeEnvelope>>,
    capacity: Option<usize>,
}

impl MemorySink {
    /// Unbounded sink, keeps every outcome.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that drops the oldest outcome once `capacity` is reached.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: Some(capacity),
        }
    }

    /// All retained outcomes, oldest first.
    pub fn outcomes(&self) -> Vec<OutcomeEnvelope> {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// The `limit` most recent outcomes, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<OutcomeEnvelope> {
        let outcomes = self
            .outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let skip = outcomes.len().saturating_sub(limit);
        outcomes.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retained outcomes that received a ticket.
    pub fn allocated(&self) -> Vec<OutcomeEvent> {
        self.outcomes()
            .into_iter()
            .map(|o| o.event)
            .filter(OutcomeEvent::is_allocated)
            .collect()
    }

    /// Retained outcomes that were turned away.
    pub fn rejected(&self) -> Vec<OutcomeEvent> {
        self.outcomes()
            .into_iter()
            .map(|o| o.event)
            .filter(|e| !e.is_allocated())
            .collect()
    }
}

impl OutcomeSink for MemorySink {
    fn record(&self, outcome: &OutcomeEnvelope) {
        let mut outcomes = self
            .outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(capacity) = self.capacity {
            if capacity == 0 {
                return;
            }
            while outcomes.len() >= capacity {
                outcomes.pop_front();
            }
        }
        outcomes.push_back(outcome.clone());
    }
}

/// Forwards every outcome to each inner sink in order.
#[derive(Default, Clone)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn OutcomeSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink to the fan-out list.
    pub fn with(mut self, sink: Arc<dyn OutcomeSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl OutcomeSink for FanoutSink {
    fn record(&self, outcome: &OutcomeEnvelope) {
        for sink in &self.sinks {
            sink.record(outcome);
        }
    }
}
