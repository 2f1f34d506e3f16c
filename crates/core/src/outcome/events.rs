use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pool::{RequesterId, TicketId};

/// Why a purchase request did not receive a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The pool was exhausted when the request reached the store.
    NoTicketsAvailable,
    /// The request's deadline passed before it reached the store.
    RequestTimedOut,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoTicketsAvailable => "no_tickets_available",
            Self::RequestTimedOut => "request_timed_out",
        }
    }
}

/// Terminal outcome of one purchase request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutcomeEvent {
    Allocated {
        requester_id: RequesterId,
        ticket_id: TicketId,
        remaining: usize,
    },
    Rejected {
        requester_id: RequesterId,
        reason: RejectReason,
    },
}

impl OutcomeEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Allocated { .. } => "allocated",
            Self::Rejected { .. } => "rejected",
        }
    }

    pub fn requester_id(&self) -> RequesterId {
        match self {
            Self::Allocated { requester_id, .. } | Self::Rejected { requester_id, .. } => {
                *requester_id
            }
        }
    }

    /// Ticket handed out, if any.
    pub fn ticket_id(&self) -> Option<TicketId> {
        match self {
            Self::Allocated { ticket_id, .. } => Some(*ticket_id),
            Self::Rejected { .. } => None,
        }
    }

    pub fn is_allocated(&self) -> bool {
        matches!(self, Self::Allocated { .. })
    }

    /// Label used for the `result` dimension of allocation metrics.
    pub fn result_label(&self) -> &'static str {
        match self {
            Self::Allocated { .. } => "allocated",
            Self::Rejected { reason, .. } => reason.as_str(),
        }
    }
}

/// Envelope wrapping an outcome with the time it was decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeEnvelope {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: OutcomeEvent,
}

impl OutcomeEnvelope {
    /// Stamp `event` with the current time.
    pub fn now(event: OutcomeEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocated_serialization() {
        let event = OutcomeEvent::Allocated {
            requester_id: 3,
            ticket_id: 1,
            remaining: 9,
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "allocated");
        assert_eq!(json["ticket_id"], 1);
        assert_eq!(json["remaining"], 9);
    }

    #[test]
    fn test_rejected_serialization() {
        let event = OutcomeEvent::Rejected {
            requester_id: 12,
            reason: RejectReason::NoTicketsAvailable,
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"rejected\""));
        assert!(json.contains("\"reason\":\"no_tickets_available\""));

        let parsed: OutcomeEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_accessors() {
        let allocated = OutcomeEvent::Allocated {
            requester_id: 5,
            ticket_id: 2,
            remaining: 0,
        };
        assert_eq!(allocated.event_type(), "allocated");
        assert_eq!(allocated.requester_id(), 5);
        assert_eq!(allocated.ticket_id(), Some(2));
        assert!(allocated.is_allocated());

        let timed_out = OutcomeEvent::Rejected {
            requester_id: 6,
            reason: RejectReason::RequestTimedOut,
        };
        assert_eq!(timed_out.event_type(), "rejected");
        assert_eq!(timed_out.ticket_id(), None);
        assert_eq!(timed_out.result_label(), "request_timed_out");
    }

    #[test]
    fn test_envelope_flattens_event() {
        let envelope = OutcomeEnvelope::now(OutcomeEvent::Rejected {
            requester_id: 1,
            reason: RejectReason::NoTicketsAvailable,
        });

        let json = serde_json::to_value(&envelope).unwrap();
        assert!(json.get("timestamp").is_some());
        assert_eq!(json["type"], "rejected");
        assert_eq!(json["requester_id"], 1);
    }
}
