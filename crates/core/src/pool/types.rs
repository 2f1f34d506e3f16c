//! Types shared by the ticket pool and its callers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a ticket. Assigned sequentially from 1 at pool creation.
pub type TicketId = u64;

/// Opaque identifier of the entity asking for a ticket.
///
/// Not required to be unique: two requests carrying the same id are
/// handled independently.
pub type RequesterId = u64;

/// A single sellable ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Unique ticket number.
    pub id: TicketId,
    /// Whether the ticket has been sold. Never reverts once set.
    pub purchased: bool,
    /// Requester the ticket was sold to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchased_by: Option<RequesterId>,
}

impl Ticket {
    pub(crate) fn available(id: TicketId) -> Self {
        Self {
            id,
            purchased: false,
            purchased_by: None,
        }
    }
}

/// Result of a successful allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// Ticket handed to the requester.
    pub ticket_id: TicketId,
    /// Tickets still available right after this allocation.
    pub remaining: usize,
}

/// Errors returned by [`TicketStore::try_allocate`](super::TicketStore::try_allocate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocationError {
    /// Every ticket in the pool has already been sold.
    #[error("no tickets available")]
    NoTicketsAvailable,
}

/// Point-in-time view of the pool counters, read under a single lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub total: usize,
    pub available: usize,
    pub purchased: usize,
}

impl PoolSnapshot {
    /// True once no ticket is left to sell.
    pub fn is_sold_out(&self) -> bool {
        self.available == 0
    }
}
