//! FIFO of cancellable deferred callbacks.
//!
//! Every callback pushed here receives a generational [`DeferToken`]. The
//! token stays valid until the callback runs or is cancelled; a token whose
//! slot has since been reused by another callback never matches it.

use slab::Slab;
use std::collections::VecDeque;

pub(crate) type Callback = Box<dyn FnOnce()>;

/// Handle to a callback waiting in the deferred queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeferToken {
    key: usize,
    generation: u64,
}

struct Entry {
    generation: u64,
    callback: Callback,
}

/// The deferred-callback queue of one runtime thread.
#[derive(Default)]
pub(crate) struct LocalQueue {
    entries: Slab<Entry>,
    order: VecDeque<DeferToken>,
    next_generation: u64,
}

impl LocalQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Number of callbacks still waiting to run.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn push(&mut self, callback: Callback) -> DeferToken {
        let generation = self.next_generation;
        self.next_generation += 1;
        let key = self.entries.insert(Entry {
            generation,
            callback,
        });
        let token = DeferToken { key, generation };
        self.order.push_back(token);
        token
    }

    /// Removes a callback before it runs. Returns false if it already ran or
    /// was cancelled.
    pub(crate) fn cancel(&mut self, token: DeferToken) -> Option<Callback> {
        let live = self
            .entries
            .get(token.key)
            .is_some_and(|entry| entry.generation == token.generation);
        live.then(|| self.entries.remove(token.key).callback)
    }

    /// Pops the oldest live callback, skipping cancelled tokens.
    pub(crate) fn pop(&mut self) -> Option<Callback> {
        while let Some(token) = self.order.pop_front() {
            if let Some(callback) = self.cancel(token) {
                return Some(callback);
            }
        }
        None
    }
}

impl std::fmt::Debug for LocalQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalQueue")
            .field("len", &self.entries.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder() -> (Rc<RefCell<Vec<u32>>>, impl Fn(u32) -> Callback) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let make = move |n: u32| -> Callback {
            let sink = Rc::clone(&sink);
            Box::new(move || sink.borrow_mut().push(n))
        };
        (log, make)
    }

    #[test]
    fn pops_in_push_order() {
        let (log, make) = recorder();
        let mut queue = LocalQueue::new();
        queue.push(make(1));
        queue.push(make(2));
        queue.push(make(3));
        assert_eq!(queue.len(), 3);

        while let Some(callback) = queue.pop() {
            callback();
        }
        assert_eq!(*log.borrow(), vec![1, 2, 3]);
        assert!(queue.is_empty());
    }

    #[test]
    fn cancelled_callbacks_are_skipped() {
        let (log, make) = recorder();
        let mut queue = LocalQueue::new();
        queue.push(make(1));
        let token = queue.push(make(2));
        queue.push(make(3));

        assert!(queue.cancel(token).is_some());
        assert!(queue.cancel(token).is_none());
        while let Some(callback) = queue.pop() {
            callback();
        }
        assert_eq!(*log.borrow(), vec![1, 3]);
    }

    #[test]
    fn stale_token_does_not_cancel_reused_slot() {
        let (log, make) = recorder();
        let mut queue = LocalQueue::new();
        let stale = queue.push(make(1));
        if let Some(callback) = queue.pop() {
            callback();
        }
        // The slab reuses the freed key for the next entry.
        queue.push(make(2));
        assert!(queue.cancel(stale).is_none());
        while let Some(callback) = queue.pop() {
            callback();
        }
        assert_eq!(*log.borrow(), vec![1, 2]);
    }
}
