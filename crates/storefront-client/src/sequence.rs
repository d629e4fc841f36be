//! Request ordering.
//!
//! Each state-producing request takes a ticket before it is issued. When its
//! response arrives, it may only be applied if no newer ticket has been
//! issued since. Responses therefore never apply out of issue order, no
//! matter how the network reorders them.

use parking_lot::Mutex;

/// Identifies one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

/// Monotonic request counter owned by one controller.
#[derive(Debug, Default)]
pub struct RequestSequence {
    latest: Mutex<u64>,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a ticket for a request about to be issued. Supersedes all earlier tickets.
    pub fn issue(&self) -> Ticket {
        let mut latest = self.latest.lock();
        *latest += 1;
        Ticket(*latest)
    }

    /// Whether `ticket` is still the newest one issued.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        *self.latest.lock() == ticket.0
    }
}

/// What happened to a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The response became the new displayed state.
    Applied,

    /// A newer request was issued first; the response was dropped.
    Discarded,

    /// Nothing needed to be sent.
    Unchanged,
}
