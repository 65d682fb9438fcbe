//! Single-value, lazy, cancellable channels.
//!
//! A [`channel`] returns a [`Task`] (the producer's write handle) and a
//! [`Future`] (the consumer's handle). Nothing happens until the consumer
//! calls [`Future::start`]; the producer learns about it through the hook it
//! registered with [`Task::start`]. The result reaches the consumer exactly
//! once, through the callback registered with [`Future::end`], unless the
//! consumer calls [`Future::abort`] first, in which case the producer's
//! abort hook runs and no result is ever delivered.
//!
//! ```
//! use tether::future;
//! use tether::runtime::Runtime;
//!
//! let (task, fut) = future::channel::<u32, String>();
//! let producer = task.clone();
//! task.start(move || {
//!     producer.done(7);
//! });
//!
//! let doubled = fut.map(|n| n * 2);
//! assert_eq!(Runtime::new().block_on(doubled), Ok(Ok(14)));
//! ```
//!
//! # Ownership
//!
//! A `Future` owns its control object and, through the hooks registered on
//! it, the upstream graph it was built from. A `Task` is a weak handle:
//! delivering through a task whose future has been dropped does nothing.

mod chain;
mod control;
mod join;
mod loop_fn;
mod map;
mod select;
mod select_all;

pub use join::join_all;
pub use loop_fn::{Loop, loop_break, loop_continue, loop_fn};
pub use select_all::{SelectAll, SelectOk, select_all, select_ok};

use control::Control;
use std::fmt;
use std::rc::{Rc, Weak};

/// Consumer handle of a single-value channel.
#[must_use = "futures do nothing unless started"]
pub struct Future<T, E> {
    control: Rc<Control<T, E>>,
}

/// Producer handle of a single-value channel.
pub struct Task<T, E> {
    control: Weak<Control<T, E>>,
}

/// Creates a connected task/future pair.
pub fn channel<T: 'static, E: 'static>() -> (Task<T, E>, Future<T, E>) {
    let control = Control::new();
    let task = Task {
        control: Rc::downgrade(&control),
    };
    (task, Future { control })
}

/// A future that succeeds with `item` once started.
pub fn ok<T: 'static, E: 'static>(item: T) -> Future<T, E> {
    result(Ok(item))
}

/// A future that fails with `error` once started.
pub fn err<T: 'static, E: 'static>(error: E) -> Future<T, E> {
    result(Err(error))
}

/// A future that settles with `result` once started.
pub fn result<T: 'static, E: 'static>(result: Result<T, E>) -> Future<T, E> {
    let (task, future) = channel();
    let producer = task.clone();
    task.start(move || {
        producer.end(result);
    });
    future
}

/// A future that never settles.
pub fn never<T: 'static, E: 'static>() -> Future<T, E> {
    channel().1
}

/// Builds the future with `f` only when it is started.
pub fn lazy<T, E, F>(f: F) -> Future<T, E>
where
    T: 'static,
    E: 'static,
    F: FnOnce() -> Future<T, E> + 'static,
{
    let (task, future) = channel();
    let producer = task.clone();
    task.start(move || producer.follow(f()));
    future
}

impl<T: 'static, E: 'static> Future<T, E> {
    /// Registers the callback that receives the result. A later call
    /// replaces the earlier callback.
    pub fn end<F: FnOnce(Result<T, E>) + 'static>(&self, f: F) -> &Self {
        self.control.subscribe(Box::new(f));
        self
    }

    /// Registers a result callback that only sees success; a failure is
    /// dropped. Replaces any earlier result callback.
    pub fn end_ok<F: FnOnce(T) + 'static>(&self, f: F) -> &Self {
        self.end(move |result| {
            if let Ok(item) = result {
                f(item);
            }
        })
    }

    /// Registers a result callback that only sees failure; a success is
    /// dropped. Replaces any earlier result callback.
    pub fn end_err<F: FnOnce(E) + 'static>(&self, f: F) -> &Self {
        self.end(move |result| {
            if let Err(error) = result {
                f(error);
            }
        })
    }

    /// Removes the result callback.
    pub fn unend(&self) -> &Self {
        self.control.unsubscribe();
        self
    }

    /// Authorizes the producer to start working. Only the first call has an
    /// effect.
    pub fn start(&self) -> &Self {
        self.control.start();
        self
    }

    /// Cancels the channel. The result callback will not run afterwards.
    pub fn abort(&self) -> &Self {
        self.control.abort();
        self
    }

    /// Returns true once the result was handed over or the future aborted.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.control.is_done()
    }

    /// A second strong handle to the same channel.
    pub(crate) fn handle(&self) -> Self {
        Self {
            control: Rc::clone(&self.control),
        }
    }

    pub(crate) fn downgrade(&self) -> WeakFuture<T, E> {
        WeakFuture {
            control: Rc::downgrade(&self.control),
        }
    }

    /// Builds a downstream channel whose start and abort hooks drive `self`
    /// and whose result is produced by `on_end` from this future's result.
    pub(crate) fn chain_with<U, F, H>(self, on_end: H) -> Future<U, F>
    where
        U: 'static,
        F: 'static,
        H: FnOnce(Result<T, E>, Task<U, F>) + 'static,
    {
        let (task, future) = channel();
        let downstream = task.clone();
        self.end(move |result| on_end(result, downstream));
        let upstream = self.handle();
        task.start(move || {
            upstream.start();
        })
        .abort(move || {
            self.abort();
        });
        future
    }
}

impl<T, E> fmt::Debug for Future<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Future")
            .field("strong", &Rc::strong_count(&self.control))
            .finish_non_exhaustive()
    }
}

impl<T: 'static, E: 'static> Task<T, E> {
    /// Delivers `result`. Ignored unless the channel is still pending.
    pub fn end(&self, result: Result<T, E>) -> &Self {
        if let Some(control) = self.control.upgrade() {
            control.end(result);
        }
        self
    }

    /// Delivers a success.
    pub fn done(&self, item: T) -> &Self {
        self.end(Ok(item))
    }

    /// Delivers a failure.
    pub fn fail(&self, error: E) -> &Self {
        self.end(Err(error))
    }

    /// Registers the hook run when the consumer starts the future.
    pub fn start<F: FnOnce() + 'static>(&self, f: F) -> &Self {
        if let Some(control) = self.control.upgrade() {
            control.set_start(Box::new(f));
        }
        self
    }

    /// Registers the hook run when the consumer aborts before delivery.
    pub fn abort<F: FnOnce() + 'static>(&self, f: F) -> &Self {
        if let Some(control) = self.control.upgrade() {
            control.set_abort(Box::new(f));
        }
        self
    }

    /// Returns true once delivering is pointless: the result was produced,
    /// the consumer aborted, or the future was dropped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.control
            .upgrade()
            .is_none_or(|control| control.is_closed())
    }

    /// Settles this task with whatever `next` settles with. Aborting this
    /// task's future aborts `next`.
    pub(crate) fn follow(&self, next: Future<T, E>) {
        if self.is_closed() {
            next.abort();
            return;
        }
        let task = self.clone();
        next.end(move |result| {
            task.end(result);
        });
        let running = next.handle();
        self.abort(move || {
            next.abort();
        });
        running.start();
    }
}

impl<T, E> Clone for Task<T, E> {
    fn clone(&self) -> Self {
        Self {
            control: Weak::clone(&self.control),
        }
    }
}

impl<T, E> fmt::Debug for Task<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("attached", &(self.control.strong_count() > 0))
            .finish_non_exhaustive()
    }
}

/// A non-owning reference to a future, used between siblings.
pub(crate) struct WeakFuture<T, E> {
    control: Weak<Control<T, E>>,
}

impl<T: 'static, E: 'static> WeakFuture<T, E> {
    pub(crate) fn abort(&self) {
        if let Some(control) = self.control.upgrade() {
            control.abort();
        }
    }
}
