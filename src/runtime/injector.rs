//! Cross-thread completion injection.
//!
//! Work that finishes off the runtime thread (a blocking socket read, a
//! worker pool) reports back through a [`Completer`]. The completer pushes its
//! value onto a lock-free queue owned by the runtime thread and wakes the
//! thread if it is parked waiting for exactly that.
//!
//! The runtime thread keeps the matching continuation in its own table, keyed
//! by a generational slot, so values never carry closures across threads.

use crossbeam_queue::SegQueue;
use parking_lot::{Condvar, Mutex};
use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

pub(crate) type Payload = Box<dyn Any + Send>;

/// One report from a completer.
pub(crate) struct Injected {
    pub(crate) key: usize,
    pub(crate) generation: u64,
    /// `None` when the completer was dropped without completing.
    pub(crate) payload: Option<Payload>,
}

/// The injection queue of one runtime thread.
#[derive(Default)]
pub(crate) struct Injector {
    inner: SegQueue<Injected>,
    lock: Mutex<()>,
    ready: Condvar,
}

impl Injector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, injected: Injected) {
        self.inner.push(injected);
        let _guard = self.lock.lock();
        self.ready.notify_one();
    }

    pub(crate) fn pop(&self) -> Option<Injected> {
        self.inner.pop()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.inner.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Blocks until something is injected or `timeout` elapses. Returns
    /// immediately if the queue is already non-empty.
    pub(crate) fn park(&self, timeout: Option<Duration>) {
        let mut guard = self.lock.lock();
        if !self.inner.is_empty() {
            return;
        }
        match timeout {
            Some(timeout) => {
                let _ = self.ready.wait_for(&mut guard, timeout);
            }
            None => self.ready.wait(&mut guard),
        }
    }
}

impl std::fmt::Debug for Injector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Injector")
            .field("len", &self.inner.len())
            .finish_non_exhaustive()
    }
}

/// Sending half of a cross-thread completion.
///
/// Created by [`runtime::completion`](crate::runtime::completion) on the
/// runtime thread and moved to whichever thread produces the value. Dropping
/// it without calling [`complete`](Self::complete) abandons the completion:
/// the runtime forgets the continuation without running it.
#[must_use = "dropping a Completer abandons the completion"]
pub struct Completer<T> {
    key: usize,
    generation: u64,
    injector: Arc<Injector>,
    sent: bool,
    _value: PhantomData<fn(T)>,
}

impl<T: Send + 'static> Completer<T> {
    pub(crate) fn new(key: usize, generation: u64, injector: Arc<Injector>) -> Self {
        Self {
            key,
            generation,
            injector,
            sent: false,
            _value: PhantomData,
        }
    }

    /// Hands `value` to the runtime thread.
    pub fn complete(mut self, value: T) {
        self.sent = true;
        self.injector.push(Injected {
            key: self.key,
            generation: self.generation,
            payload: Some(Box::new(value)),
        });
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        if !self.sent {
            self.injector.push(Injected {
                key: self.key,
                generation: self.generation,
                payload: None,
            });
        }
    }
}

impl<T> std::fmt::Debug for Completer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completer")
            .field("key", &self.key)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}
