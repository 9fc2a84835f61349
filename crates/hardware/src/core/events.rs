//! Step-indexed event queue.
//!
//! This module implements the deferred-callback queue driven by the core's step counter.
//! It provides:
//! 1. **Scheduling:** `put` stages a listener for a trigger step; staged entries join the
//!    active set in `push_pre_queued`.
//! 2. **Draining:** `drain_due` detaches every entry due at the given step and hands it out
//!    as an owned batch, ascending by step and FIFO within a step.
//! 3. **Re-entrancy:** Because the batch is detached, a listener firing from it may call
//!    `put` on the same queue; the new entry is staged and never joins the batch in flight.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::common::EventQueueError;

/// Receiver of step notifications.
pub trait StepListener: Send + Sync {
    /// Called once when the step counter reaches the trigger step the listener was queued for.
    ///
    /// `queue` is the queue that fired the listener; rescheduling through it is allowed.
    fn on_step(&self, step: u64, queue: &mut EventQueue);
}

/// Shared handle to a listener; the queue keeps it alive until it fires.
pub type ListenerHandle = Arc<dyn StepListener>;

/// Ordering key: trigger step, then insertion sequence.
type Key = (u64, u64);

/// Pending step callbacks ordered by trigger step.
pub struct EventQueue {
    active: BTreeMap<Key, ListenerHandle>,
    staged: Vec<(Key, ListenerHandle)>,
    next_seq: u64,
    limit: Option<usize>,
}

impl fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventQueue")
            .field("active", &self.active.len())
            .field("staged", &self.staged.len())
            .field("next_trigger", &self.next_trigger())
            .field("limit", &self.limit)
            .finish()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new(None)
    }
}

impl EventQueue {
    /// Creates an empty queue; `limit` bounds the number of pending callbacks.
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            active: BTreeMap::new(),
            staged: Vec::new(),
            next_seq: 0,
            limit,
        }
    }

    /// Queues `listener` to fire once the step counter reaches `trigger_step`.
    ///
    /// A trigger step already in the past fires on the next drain.
    ///
    /// # Errors
    ///
    /// `EventQueueError::CapacityExceeded` when a limit is configured and reached.
    pub fn put(&mut self, trigger_step: u64, listener: ListenerHandle) -> Result<(), EventQueueError> {
        if let Some(limit) = self.limit {
            if self.len() >= limit {
                tracing::warn!(limit, trigger_step, "event queue full");
                return Err(EventQueueError::CapacityExceeded(limit));
            }
        }
        let key = (trigger_step, self.next_seq);
        self.next_seq += 1;
        self.staged.push((key, listener));
        Ok(())
    }

    /// Merges staged entries into the active set.
    pub fn push_pre_queued(&mut self) {
        self.active.extend(self.staged.drain(..));
    }

    /// Removes and returns every entry whose trigger step is at or before `current_step`.
    ///
    /// Staged entries are merged first, so a `put` followed by a drain observes the entry
    /// without an explicit `push_pre_queued`.
    pub fn drain_due(&mut self, current_step: u64) -> DueCallbacks {
        self.push_pre_queued();
        let later = match current_step.checked_add(1) {
            Some(next) => self.active.split_off(&(next, 0)),
            None => BTreeMap::new(),
        };
        let due = std::mem::replace(&mut self.active, later);
        DueCallbacks {
            inner: due.into_iter(),
        }
    }

    /// Trigger step of the earliest pending entry.
    pub fn next_trigger(&self) -> Option<u64> {
        let active = self.active.keys().next().map(|k| k.0);
        let staged = self.staged.iter().map(|(k, _)| k.0).min();
        match (active, staged) {
            (Some(a), Some(s)) => Some(a.min(s)),
            (a, s) => a.or(s),
        }
    }

    /// Number of pending entries, staged ones included.
    pub fn len(&self) -> usize {
        self.active.len() + self.staged.len()
    }

    /// Returns `true` when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every pending entry without firing it.
    pub fn clear(&mut self) {
        self.active.clear();
        self.staged.clear();
    }
}

/// Owned batch of due callbacks, yielded in firing order.
pub struct DueCallbacks {
    inner: std::collections::btree_map::IntoIter<Key, ListenerHandle>,
}

impl DueCallbacks {
    /// Returns the trigger step of each remaining entry with its listener.
    pub fn with_steps(self) -> impl Iterator<Item = (u64, ListenerHandle)> {
        self.inner.map(|((step, _), l)| (step, l))
    }
}

impl Iterator for DueCallbacks {
    type Item = ListenerHandle;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, l)| l)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for DueCallbacks {}

impl fmt::Debug for DueCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DueCallbacks").field("remaining", &self.inner.len()).finish()
    }
}
