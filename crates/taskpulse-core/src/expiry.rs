//! Auto-expiry of notifications.
//!
//! Instead of one timer per record, pending removals live in a min-heap of
//! `(expire_at, id)` pairs. The owner sleeps until [`ExpiryQueue::next_deadline`]
//! and then calls [`ExpiryQueue::drain_due`] once. Cancellation is lazy: a
//! cancelled id stays in the heap but is skipped when it surfaces.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::defaults;

/// How long notifications live and whether reading them keeps them alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    /// Delay between insertion and automatic removal.
    pub delay: Duration,
    /// Cancel the pending removal when a record is marked read.
    pub cancel_on_read: bool,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(defaults::NOTIFICATION_EXPIRY_MS),
            cancel_on_read: defaults::NOTIFICATION_CANCEL_ON_READ,
        }
    }
}

impl ExpiryPolicy {
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_cancel_on_read(mut self, cancel_on_read: bool) -> Self {
        self.cancel_on_read = cancel_on_read;
        self
    }
}

/// Min-heap of pending removals, keyed by notification id.
///
/// Generic over the instant type so callers can drive it with a mockable
/// clock.
#[derive(Debug, Clone)]
pub struct ExpiryQueue<T = Instant> {
    heap: BinaryHeap<Reverse<(T, Uuid)>>,
    pending: HashMap<Uuid, T>,
}

impl<T: Ord + Copy> Default for ExpiryQueue<T> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            pending: HashMap::new(),
        }
    }
}

impl<T: Ord + Copy> ExpiryQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule removal of `id` at `at`. An id that is already pending keeps
    /// its original deadline; returns whether a new entry was added.
    pub fn schedule(&mut self, id: Uuid, at: T) -> bool {
        if self.pending.contains_key(&id) {
            return false;
        }
        self.pending.insert(id, at);
        self.heap.push(Reverse((at, id)));
        true
    }

    /// Cancel a pending removal. Returns whether one was pending.
    pub fn cancel(&mut self, id: Uuid) -> bool {
        self.pending.remove(&id).is_some()
    }

    pub fn is_pending(&self, id: Uuid) -> bool {
        self.pending.contains_key(&id)
    }

    /// Earliest live deadline, discarding cancelled entries on the way.
    pub fn next_deadline(&mut self) -> Option<T> {
        while let Some(Reverse((at, id))) = self.heap.peek().copied() {
            if self.pending.get(&id) == Some(&at) {
                return Some(at);
            }
            self.heap.pop();
        }
        None
    }

    /// Remove and return every id whose deadline is at or before `now`,
    /// earliest first.
    pub fn drain_due(&mut self, now: T) -> Vec<Uuid> {
        let mut due = Vec::new();
        while let Some(Reverse((at, id))) = self.heap.peek().copied() {
            if at > now {
                break;
            }
            self.heap.pop();
            if self.pending.get(&id) == Some(&at) {
                self.pending.remove(&id);
                due.push(id);
            }
        }
        due
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.pending.clear();
    }

    /// Number of live (not cancelled) entries.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
