//! Timer heap for deadline management.
//!
//! A min-heap of `(deadline, callback)` pairs. Cancelled timers are dropped
//! from the callback table immediately and their heap entries are skipped
//! lazily when they reach the top.

use super::queue::Callback;
use slab::Slab;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

/// Handle to a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken {
    key: usize,
    generation: u64,
}

#[derive(Debug, Clone, Eq, PartialEq)]
struct TimerEntry {
    deadline: Instant,
    token: TimerToken,
}

impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (earliest deadline first).
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.token.generation.cmp(&self.token.generation))
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

struct Armed {
    generation: u64,
    callback: Callback,
}

/// Expired callbacks popped in one sweep.
pub(crate) type Expired = SmallVec<[Callback; 4]>;

/// A min-heap of timers ordered by deadline.
#[derive(Default)]
pub(crate) struct TimerHeap {
    heap: BinaryHeap<TimerEntry>,
    armed: Slab<Armed>,
    next_generation: u64,
}

impl TimerHeap {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live timers.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.armed.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.armed.is_empty()
    }

    /// Arms a callback for the given deadline.
    pub(crate) fn insert(&mut self, deadline: Instant, callback: Callback) -> TimerToken {
        let generation = self.next_generation;
        self.next_generation += 1;
        let key = self.armed.insert(Armed {
            generation,
            callback,
        });
        let token = TimerToken { key, generation };
        self.heap.push(TimerEntry { deadline, token });
        token
    }

    /// Disarms a timer. Returns the callback if it had not fired yet.
    pub(crate) fn cancel(&mut self, token: TimerToken) -> Option<Callback> {
        let live = self
            .armed
            .get(token.key)
            .is_some_and(|armed| armed.generation == token.generation);
        live.then(|| self.armed.remove(token.key).callback)
    }

    /// Returns the earliest live deadline, if any.
    pub(crate) fn peek_deadline(&mut self) -> Option<Instant> {
        while let Some(entry) = self.heap.peek() {
            if self.is_live(entry.token) {
                return Some(entry.deadline);
            }
            self.heap.pop();
        }
        None
    }

    /// Pops the callbacks of all timers whose deadline is `<= now`, earliest
    /// first.
    pub(crate) fn pop_expired(&mut self, now: Instant) -> Expired {
        let mut expired = Expired::new();
        while let Some(entry) = self.heap.peek() {
            if entry.deadline > now {
                break;
            }
            let token = entry.token;
            self.heap.pop();
            if let Some(callback) = self.cancel(token) {
                expired.push(callback);
            }
        }
        expired
    }

    /// Drops every timer without running it.
    #[cfg(test)]
    pub(crate) fn clear(&mut self) {
        self.heap.clear();
        self.armed.clear();
    }

    fn is_live(&self, token: TimerToken) -> bool {
        self.armed
            .get(token.key)
            .is_some_and(|armed| armed.generation == token.generation)
    }
}

impl std::fmt::Debug for TimerHeap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHeap")
            .field("armed", &self.armed.len())
            .field("entries", &self.heap.len())
            .finish()
    }
}
