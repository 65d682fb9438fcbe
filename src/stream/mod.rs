//! Multi-value channels with one-step backpressure.
//!
//! A [`channel`] returns a [`Sink`] (the producer's write handle) and a
//! [`Stream`] (the consumer's handle). Every [`Stream::start`] authorizes
//! exactly one [`Delivery`]:
//!
//! - `Ok(Some(item))`: the next item,
//! - `Ok(None)`: the stream ended normally and is now closed,
//! - `Err(error)`: a failure answering this request.
//!
//! The consumer asks for the next delivery by calling `start()` again,
//! typically from inside its `end` callback. Only `Ok(None)` closes the
//! channel. Per-item combinators such as [`map`](Stream::map) or
//! [`or_else`](Stream::or_else) pass an `Err` on and keep going, while
//! combinators that consume or merge a whole stream ([`fold`](Stream::fold),
//! [`select`](Stream::select), [`forward`](Stream::forward), ...) treat it
//! as terminal.
//!
//! ```
//! use tether::stream;
//! use tether::runtime::Runtime;
//!
//! let evens = stream::iter::<_, ()>(1..=10)
//!     .filter(|n| n % 2 == 0)
//!     .map(|n| n * 10)
//!     .collect();
//! assert_eq!(Runtime::new().block_on(evens), Ok(Ok(vec![20, 40, 60, 80, 100])));
//! ```

mod chain;
mod chunks;
mod control;
mod fold;
mod forward;
mod iter;
mod map;
mod next;
mod select;
mod sink;
mod skip;
mod take;
mod then;
mod zip;

pub use forward::Forward;
pub use iter::{empty, iter, once, repeat, unfold};
pub use next::Next;

use control::Control;
use std::fmt;
use std::rc::{Rc, Weak};

/// One answer to a stream request.
pub type Delivery<T, E> = Result<Option<T>, E>;

/// Consumer handle of a multi-value channel.
#[must_use = "streams do nothing unless started"]
pub struct Stream<T, E> {
    control: Rc<Control<T, E>>,
}

/// Producer handle of a multi-value channel.
pub struct Sink<T, E> {
    control: Weak<Control<T, E>>,
}

/// Creates a connected sink/stream pair.
pub fn channel<T: 'static, E: 'static>() -> (Sink<T, E>, Stream<T, E>) {
    let control = Control::new();
    let sink = Sink {
        control: Rc::downgrade(&control),
    };
    (sink, Stream { control })
}

impl<T: 'static, E: 'static> Stream<T, E> {
    /// Registers the callback that receives every delivery. A later call
    /// replaces the earlier callback.
    pub fn end<F: FnMut(Delivery<T, E>) + 'static>(&self, f: F) -> &Self {
        self.control.subscribe(Box::new(f));
        self
    }

    /// Removes the delivery callback.
    pub fn unend(&self) -> &Self {
        self.control.unsubscribe();
        self
    }

    /// Requests one delivery. Ignored while a request is outstanding.
    pub fn start(&self) -> &Self {
        self.control.request();
        self
    }

    /// Cancels the channel. No callback runs afterwards.
    pub fn abort(&self) -> &Self {
        self.control.abort();
        self
    }

    /// Returns true once the stream ended or was aborted.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.control.is_done()
    }

    pub(crate) fn handle(&self) -> Self {
        Self {
            control: Rc::clone(&self.control),
        }
    }

    pub(crate) fn downgrade(&self) -> WeakStream<T, E> {
        WeakStream {
            control: Rc::downgrade(&self.control),
        }
    }

    /// Builds a downstream channel whose requests and aborts go straight to
    /// `self` and whose deliveries are produced by `on_next`.
    pub(crate) fn adapt<U, G, H>(self, mut on_next: H) -> Stream<U, G>
    where
        U: 'static,
        G: 'static,
        H: FnMut(Delivery<T, E>, &Sink<U, G>, &WeakStream<T, E>) + 'static,
    {
        let (sink, stream) = channel();
        let downstream = sink.clone();
        let upstream = self.downgrade();
        self.end(move |delivery| on_next(delivery, &downstream, &upstream));
        let requester = self.handle();
        sink.start(move || {
            requester.start();
        })
        .abort(move || {
            self.abort();
        });
        stream
    }
}

impl<T, E> fmt::Debug for Stream<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("strong", &Rc::strong_count(&self.control))
            .finish_non_exhaustive()
    }
}

impl<T: 'static, E: 'static> Sink<T, E> {
    /// Answers the outstanding request with `delivery`.
    pub fn end(&self, delivery: Delivery<T, E>) -> &Self {
        if let Some(control) = self.control.upgrade() {
            control.deliver(delivery);
        }
        self
    }

    /// Delivers the next item.
    pub fn send(&self, item: T) -> &Self {
        self.end(Ok(Some(item)))
    }

    /// Ends the stream.
    pub fn done(&self) -> &Self {
        self.end(Ok(None))
    }

    /// Delivers a failure.
    pub fn fail(&self, error: E) -> &Self {
        self.end(Err(error))
    }

    /// Registers the hook run on every consumer request. If a request is
    /// already outstanding the hook runs right away, or, when registered
    /// from inside the running start hook, as soon as that hook returns.
    pub fn start<F: FnMut() + 'static>(&self, f: F) -> &Self {
        if let Some(control) = self.control.upgrade() {
            control.set_start(Box::new(f));
        }
        self
    }

    /// Registers the hook run when the consumer aborts.
    pub fn abort<F: FnOnce() + 'static>(&self, f: F) -> &Self {
        if let Some(control) = self.control.upgrade() {
            control.set_abort(Box::new(f));
        }
        self
    }

    /// Withdraws the start hook. Requests made afterwards wait for the next
    /// hook to be registered.
    pub fn stop(&self) -> &Self {
        if let Some(control) = self.control.upgrade() {
            control.clear_start();
        }
        self
    }

    /// Returns true once delivering is pointless.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.control
            .upgrade()
            .is_none_or(|control| control.is_closed())
    }

    /// Delivers a failure that ends the stream: any later request is
    /// answered with `Ok(None)`.
    pub(crate) fn fail_terminal(&self, error: E) {
        self.fail(error);
        let closer = self.clone();
        self.start(move || {
            closer.done();
        });
    }
}

impl<T, E> Clone for Sink<T, E> {
    fn clone(&self) -> Self {
        Self {
            control: Weak::clone(&self.control),
        }
    }
}

impl<T, E> fmt::Debug for Sink<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink")
            .field("attached", &(self.control.strong_count() > 0))
            .finish_non_exhaustive()
    }
}

/// A non-owning reference to a stream, used by callbacks registered on the
/// stream itself or on its siblings.
pub(crate) struct WeakStream<T, E> {
    control: Weak<Control<T, E>>,
}

impl<T: 'static, E: 'static> WeakStream<T, E> {
    pub(crate) fn start(&self) {
        if let Some(control) = self.control.upgrade() {
            control.request();
        }
    }

    pub(crate) fn abort(&self) {
        if let Some(control) = self.control.upgrade() {
            control.abort();
        }
    }
}

impl<T, E> Clone for WeakStream<T, E> {
    fn clone(&self) -> Self {
        Self {
            control: Weak::clone(&self.control),
        }
    }
}
