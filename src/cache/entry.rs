//! Cache Entry Module
//!
//! Defines the state of one memoized key: in flight or completed.

use std::time::Duration;

use futures::future::{BoxFuture, Shared};
use tokio::time::Instant;

/// Computation shared by every caller attached to one key.
pub(crate) type SharedTask<V, E> = Shared<BoxFuture<'static, Result<V, E>>>;

// == Slot ==
/// State of a single key inside a task cache.
pub(crate) enum Slot<V, E> {
    /// A computation is running; `id` tells it apart from later ones for
    /// the same key.
    Pending { id: u64, task: SharedTask<V, E> },
    /// The computation finished successfully.
    Ready { value: V, completed_at: Instant },
}

impl<V, E> Slot<V, E> {
    // == Is Expired ==
    /// Checks whether a completed entry has outlived `ttl`.
    ///
    /// Boundary condition: an entry is expired once the elapsed time is
    /// greater than or equal to the TTL. In-flight entries never expire.
    pub(crate) fn is_expired(&self, ttl: Option<Duration>, now: Instant) -> bool {
        match (self, ttl) {
            (Slot::Ready { completed_at, .. }, Some(ttl)) => {
                now.saturating_duration_since(*completed_at) >= ttl
            }
            _ => false,
        }
    }

    /// Returns true if this is the in-flight computation `id`.
    pub(crate) fn is_pending(&self, id: u64) -> bool {
        matches!(self, Slot::Pending { id: pending, .. } if *pending == id)
    }

    pub(crate) fn is_ready(&self) -> bool {
        matches!(self, Slot::Ready { .. })
    }

    // == Time To Live ==
    /// Remaining lifetime of a completed entry, or None when it never expires
    /// or is still in flight.
    pub(crate) fn ttl_remaining(&self, ttl: Option<Duration>, now: Instant) -> Option<Duration> {
        match (self, ttl) {
            (Slot::Ready { completed_at, .. }, Some(ttl)) => {
                Some(ttl.saturating_sub(now.saturating_duration_since(*completed_at)))
            }
            _ => None,
        }
    }
}
