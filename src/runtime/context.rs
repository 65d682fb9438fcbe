//! Per-thread driver state.
//!
//! Each thread that builds futures owns one [`Driver`]: the deferred queue,
//! the timer heap and the table of outstanding cross-thread completions. All
//! entry points borrow the driver only long enough to push or pop; callbacks
//! always run with the borrow released so they may schedule more work.

use super::injector::{Completer, Injected, Injector, Payload};
use super::queue::{Callback, DeferToken, LocalQueue};
use super::timer::{TimerHeap, TimerToken};
use slab::Slab;
use std::cell::RefCell;
use std::sync::Arc;
use std::time::Instant;

type Continuation = Box<dyn FnOnce(Payload)>;

struct Pending {
    generation: u64,
    continuation: Continuation,
}

struct Driver {
    queue: LocalQueue,
    timers: TimerHeap,
    pending: Slab<Pending>,
    next_generation: u64,
    injector: Arc<Injector>,
}

impl Driver {
    fn new() -> Self {
        Self {
            queue: LocalQueue::new(),
            timers: TimerHeap::new(),
            pending: Slab::new(),
            next_generation: 0,
            injector: Arc::new(Injector::new()),
        }
    }
}

thread_local! {
    static DRIVER: RefCell<Driver> = RefCell::new(Driver::new());
}

fn with_driver<R>(f: impl FnOnce(&mut Driver) -> R) -> R {
    DRIVER.with(|driver| f(&mut driver.borrow_mut()))
}

/// Handle to a registered cross-thread completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompletionToken {
    key: usize,
    generation: u64,
}

impl CompletionToken {
    /// Forgets the continuation. A value that arrives later is dropped.
    /// Returns false if the completion already ran or was cancelled.
    pub fn cancel(self) -> bool {
        let continuation = with_driver(|driver| {
            let live = driver
                .pending
                .get(self.key)
                .is_some_and(|pending| pending.generation == self.generation);
            live.then(|| driver.pending.remove(self.key).continuation)
        });
        continuation.is_some()
    }
}

/// Queues `callback` to run on a later turn of this thread's runtime.
pub fn defer(callback: impl FnOnce() + 'static) -> DeferToken {
    with_driver(|driver| driver.queue.push(Box::new(callback)))
}

/// Removes a deferred callback before it runs. Returns false if it already
/// ran or was cancelled.
pub fn cancel(token: DeferToken) -> bool {
    let callback = with_driver(|driver| driver.queue.cancel(token));
    callback.is_some()
}

/// Runs `callback` once `deadline` has passed.
pub fn schedule_at(deadline: Instant, callback: impl FnOnce() + 'static) -> TimerToken {
    with_driver(|driver| driver.timers.insert(deadline, Box::new(callback)))
}

/// Disarms a timer. Returns false if it already fired or was cancelled.
pub fn cancel_timer(token: TimerToken) -> bool {
    let callback = with_driver(|driver| driver.timers.cancel(token));
    callback.is_some()
}

/// Registers a continuation that runs on this thread once the returned
/// [`Completer`] is completed from any thread.
pub fn completion<T, F>(continuation: F) -> (CompletionToken, Completer<T>)
where
    T: Send + 'static,
    F: FnOnce(T) + 'static,
{
    with_driver(|driver| {
        let generation = driver.next_generation;
        driver.next_generation += 1;
        let key = driver.pending.insert(Pending {
            generation,
            continuation: Box::new(move |payload: Payload| {
                if let Ok(value) = payload.downcast::<T>() {
                    continuation(*value);
                }
            }),
        });
        (
            CompletionToken { key, generation },
            Completer::new(key, generation, Arc::clone(&driver.injector)),
        )
    })
}

/// Pops the next deferred callback.
pub(crate) fn pop_deferred() -> Option<Callback> {
    with_driver(|driver| driver.queue.pop())
}

/// Pops every timer callback due at `now`.
pub(crate) fn pop_expired(now: Instant) -> super::timer::Expired {
    with_driver(|driver| driver.timers.pop_expired(now))
}

/// Resolves one injected report to its continuation, if it is still wanted.
fn resolve(injected: Injected) -> Option<Callback> {
    let Injected {
        key,
        generation,
        payload,
    } = injected;
    let continuation = with_driver(|driver| {
        let live = driver
            .pending
            .get(key)
            .is_some_and(|pending| pending.generation == generation);
        live.then(|| driver.pending.remove(key).continuation)
    })?;
    let payload = payload?;
    Some(Box::new(move || continuation(payload)))
}

/// Runs the continuations of everything injected so far. Returns how many
/// ran.
pub(crate) fn drain_injected() -> usize {
    let injector = with_driver(|driver| Arc::clone(&driver.injector));
    let mut ran = 0;
    while let Some(injected) = injector.pop() {
        if let Some(callback) = resolve(injected) {
            callback();
            ran += 1;
        }
    }
    ran
}

/// What the driver is still waiting on once nothing is runnable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Outstanding {
    pub(crate) deferred: usize,
    pub(crate) next_deadline: Option<Instant>,
    pub(crate) completions: usize,
    pub(crate) injected: bool,
}

impl Outstanding {
    pub(crate) const fn is_idle(&self) -> bool {
        self.deferred == 0
            && self.next_deadline.is_none()
            && self.completions == 0
            && !self.injected
    }
}

pub(crate) fn outstanding() -> Outstanding {
    with_driver(|driver| Outstanding {
        deferred: driver.queue.len(),
        next_deadline: driver.timers.peek_deadline(),
        completions: driver.pending.len(),
        injected: !driver.injector.is_empty(),
    })
}

/// Parks the thread until a completion is injected or `timeout` elapses.
pub(crate) fn park(timeout: Option<std::time::Duration>) {
    let injector = with_driver(|driver| Arc::clone(&driver.injector));
    injector.park(timeout);
}
