//! Stale-response guard for overlapping fetches.
//!
//! Refresh triggers can fire faster than responses come back. Each fetch
//! begins an epoch; a response is applied only if its epoch is still the
//! newest, so a slow older response can never overwrite newer data.

use std::sync::atomic::{AtomicU64, Ordering};

/// Ticket identifying one fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Epoch(u64);

#[derive(Debug, Default)]
pub struct RequestEpoch(AtomicU64);

impl RequestEpoch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new fetch, invalidating every earlier ticket.
    pub fn begin(&self) -> Epoch {
        Epoch(self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether a response holding this ticket may still be applied.
    #[must_use]
    pub fn is_current(&self, epoch: Epoch) -> bool {
        self.0.load(Ordering::SeqCst) == epoch.0
    }

    /// Discards every outstanding ticket without starting a fetch. Used on
    /// sign-out so late responses from the old session are dropped.
    pub fn invalidate(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}
