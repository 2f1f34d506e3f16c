//! Ticket pool: the authoritative record of which tickets have been sold.

mod store;
mod types;

pub use store::TicketStore;
pub use types::{Allocation, AllocationError, PoolSnapshot, RequesterId, Ticket, TicketId};
