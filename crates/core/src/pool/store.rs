//! In-memory ticket store guarded by a single mutex.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::types::{Allocation, AllocationError, PoolSnapshot, RequesterId, Ticket, TicketId};

/// Ticket sequence and available counter, always read and written together.
#[derive(Debug)]
struct Inventory {
    tickets: Vec<Ticket>,
    available: usize,
}

impl Inventory {
    fn purchased(&self) -> usize {
        self.tickets.iter().filter(|t| t.purchased).count()
    }

    fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            total: self.tickets.len(),
            available: self.available,
            purchased: self.purchased(),
        }
    }
}

/// Authoritative record of ticket identities and their sold status.
///
/// All state lives in one [`Inventory`] behind one mutex, so the ticket
/// flags and the available counter can never be observed out of step.
/// The lock is only held for the scan-and-mark of a single allocation.
#[derive(Debug)]
pub struct TicketStore {
    inventory: Mutex<Inventory>,
}

impl TicketStore {
    /// Create a pool of `total_tickets` tickets numbered `1..=total_tickets`.
    ///
    /// A capacity of zero is accepted and yields a pool that rejects
    /// every request.
    pub fn new(total_tickets: usize) -> Self {
        let tickets = (1..=total_tickets as TicketId)
            .map(Ticket::available)
            .collect();

        Self {
            inventory: Mutex::new(Inventory {
                tickets,
                available: total_tickets,
            }),
        }
    }

    /// Sell one ticket to `requester_id`.
    ///
    /// The lowest-numbered unsold ticket is chosen. Returns
    /// [`AllocationError::NoTicketsAvailable`] without touching any state
    /// once the pool is exhausted.
    pub fn try_allocate(&self, requester_id: RequesterId) -> Result<Allocation, AllocationError> {
        let mut inventory = self.lock();

        if inventory.available == 0 {
            return Err(AllocationError::NoTicketsAvailable);
        }

        let ticket = inventory
            .tickets
            .iter_mut()
            .find(|t| !t.purchased)
            .ok_or(AllocationError::NoTicketsAvailable)?;
        ticket.purchased = true;
        ticket.purchased_by = Some(requester_id);
        let ticket_id = ticket.id;

        inventory.available -= 1;

        debug_assert_eq!(
            inventory.purchased() + inventory.available,
            inventory.tickets.len(),
            "purchased + available must equal total"
        );

        Ok(Allocation {
            ticket_id,
            remaining: inventory.available,
        })
    }

    /// Counters read under one lock acquisition.
    pub fn snapshot(&self) -> PoolSnapshot {
        self.lock().snapshot()
    }

    /// Copy of every ticket, ordered by id.
    pub fn tickets(&self) -> Vec<Ticket> {
        self.lock().tickets.clone()
    }

    /// Fixed pool capacity.
    pub fn total(&self) -> usize {
        self.lock().tickets.len()
    }

    /// Tickets not yet sold.
    pub fn available(&self) -> usize {
        self.lock().available
    }

    // No code path panics between the flag write and the counter update, so
    // a poisoned inventory is still consistent.
    fn lock(&self) -> MutexGuard<'_, Inventory> {
        self.inventory
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn test_new_store_has_sequential_ids() {
        let store = TicketStore::new(4);
        let ids: Vec<TicketId> = store.tickets().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(store.available(), 4);
        assert_eq!(store.total(), 4);
    }

    #[test]
    fn test_single_ticket_purchase() {
        let store = TicketStore::new(1);

        let allocation = store.try_allocate(1).unwrap();

        assert_eq!(allocation.ticket_id, 1);
        assert_eq!(allocation.remaining, 0);
        assert_eq!(store.available(), 0);
    }

    #[test]
    fn test_sequential_purchases_use_each_id_once() {
        let store = TicketStore::new(3);

        let ids: Vec<TicketId> = (1..=3)
            .map(|requester| store.try_allocate(requester).unwrap().ticket_id)
            .collect();

        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(store.available(), 0);
    }

    #[test]
    fn test_lowest_id_first() {
        let store = TicketStore::new(5);
        store.try_allocate(10).unwrap();
        store.try_allocate(20).unwrap();

        let tickets = store.tickets();
        assert!(tickets[0].purchased);
        assert!(tickets[1].purchased);
        assert!(!tickets[2].purchased);
        assert_eq!(tickets[0].purchased_by, Some(10));
        assert_eq!(tickets[1].purchased_by, Some(20));
    }

    #[test]
    fn test_exhausted_store_rejects_without_state_change() {
        let store = TicketStore::new(1);
        store.try_allocate(1).unwrap();
        let before = store.tickets();

        for requester in 2..10 {
            assert_eq!(
                store.try_allocate(requester),
                Err(AllocationError::NoTicketsAvailable)
            );
        }

        assert_eq!(store.tickets(), before);
        assert_eq!(store.available(), 0);
    }

    #[test]
    fn test_zero_capacity_rejects_everything() {
        let store = TicketStore::new(0);

        for requester in 1..=5 {
            assert_eq!(
                store.try_allocate(requester),
                Err(AllocationError::NoTicketsAvailable)
            );
        }

        assert_eq!(store.snapshot(), PoolSnapshot::default());
    }

    #[test]
    fn test_duplicate_requester_ids_are_independent() {
        let store = TicketStore::new(3);

        let first = store.try_allocate(42).unwrap();
        let second = store.try_allocate(42).unwrap();

        assert_ne!(first.ticket_id, second.ticket_id);
        assert_eq!(store.snapshot().purchased, 2);
    }

    #[test]
    fn test_snapshot_conservation() {
        let store = TicketStore::new(6);
        for requester in 0..4 {
            store.try_allocate(requester).unwrap();
            let snapshot = store.snapshot();
            assert_eq!(snapshot.purchased + snapshot.available, snapshot.total);
        }
        assert_eq!(store.snapshot().available, 2);
    }

    #[test]
    fn test_concurrent_threads_never_double_allocate() {
        let store = Arc::new(TicketStore::new(50));

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let mut won = Vec::new();
                    for i in 0..25 {
                        if let Ok(allocation) = store.try_allocate(worker * 100 + i) {
                            won.push(allocation.ticket_id);
                        }
                    }
                    won
                })
            })
            .collect();

        let mut all = Vec::new();
        for handle in handles {
            all.extend(handle.join().unwrap());
        }

        let unique: HashSet<TicketId> = all.iter().copied().collect();
        assert_eq!(all.len(), 50);
        assert_eq!(unique.len(), 50);
        assert_eq!(store.available(), 0);
        assert!(store.tickets().iter().all(|t| t.purchased));
    }
}
