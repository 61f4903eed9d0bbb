//! Fixed-capacity resource with a FIFO wait list
//!
//! A [`ServerPool`] never touches the event loop itself. `request` tells the
//! caller whether it holds a unit or has to park, and `release` hands back the
//! requester that was granted the freed unit so the caller can wake it.

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::num::NonZeroUsize;

use thiserror::Error;
use tracing::debug;

use crate::ActivityId;

/// Handle of a single request against a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ticket#{}", self.0)
    }
}

/// Result of [`ServerPool::request`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquire {
    /// A unit is held under this ticket from now on
    Granted(Ticket),
    /// The ticket sits at the tail of the wait list
    Queued(Ticket),
}

impl Acquire {
    pub fn ticket(&self) -> Ticket {
        match self {
            Acquire::Granted(ticket) | Acquire::Queued(ticket) => *ticket,
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, Acquire::Granted(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("{0} does not hold a unit")]
    NotHeld(Ticket),
}

pub struct ServerPool {
    capacity: NonZeroUsize,
    busy: usize,
    waiting: VecDeque<(Ticket, ActivityId)>,
    held: HashSet<Ticket>,
    next_ticket: u64,
}

impl ServerPool {
    pub fn new(capacity: NonZeroUsize) -> ServerPool {
        ServerPool {
            capacity,
            busy: 0,
            waiting: VecDeque::new(),
            held: HashSet::new(),
            next_ticket: 0,
        }
    }

    fn issue(&mut self) -> Ticket {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        ticket
    }

    /// Ask for one unit on behalf of `requester`.
    ///
    /// Grants immediately when a unit is free. Otherwise the request joins the
    /// tail of the wait list and the requester is expected to park until
    /// [`release`](Self::release) names it.
    pub fn request(&mut self, requester: ActivityId) -> Acquire {
        let ticket = self.issue();
        if self.busy < self.capacity.get() {
            self.busy += 1;
            self.held.insert(ticket);
            debug!(%ticket, %requester, busy = self.busy, "unit granted");
            Acquire::Granted(ticket)
        } else {
            self.waiting.push_back((ticket, requester));
            debug!(%ticket, %requester, queue = self.waiting.len(), "request queued");
            Acquire::Queued(ticket)
        }
    }

    /// Give back the unit held under `ticket`.
    ///
    /// When somebody is waiting the unit goes straight to the head of the wait
    /// list, and that requester is returned so it can be woken. A ticket that is
    /// not held is rejected before any counter moves.
    pub fn release(&mut self, ticket: Ticket) -> Result<Option<ActivityId>, PoolError> {
        if !self.held.remove(&ticket) {
            return Err(PoolError::NotHeld(ticket));
        }
        self.busy -= 1;

        match self.waiting.pop_front() {
            Some((next_ticket, requester)) => {
                self.held.insert(next_ticket);
                self.busy += 1;
                debug!(released = %ticket, granted = %next_ticket, %requester, "unit handed over");
                Ok(Some(requester))
            }
            None => {
                debug!(%ticket, busy = self.busy, "unit released");
                Ok(None)
            }
        }
    }

    /// Remove a ticket that is still waiting. Returns false if it was not queued.
    pub fn withdraw(&mut self, ticket: Ticket) -> bool {
        match self.waiting.iter().position(|(queued, _)| *queued == ticket) {
            Some(index) => {
                self.waiting.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn is_held(&self, ticket: Ticket) -> bool {
        self.held.contains(&ticket)
    }

    pub fn queue_length(&self) -> usize {
        self.waiting.len()
    }

    pub fn busy_count(&self) -> usize {
        self.busy
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }
}
