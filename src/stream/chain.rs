//! Concatenating streams.

use super::{Sink, Stream, channel};
use std::cell::RefCell;
use std::rc::Rc;

type Slot<T, E> = Rc<RefCell<Option<Stream<T, E>>>>;

impl<T: 'static, E: 'static> Stream<T, E> {
    /// Yields every item of `self`, then every item of `other`. Errors from
    /// either side pass through.
    pub fn chain(self, other: Self) -> Self {
        let (sink, stream) = channel();
        let second: Slot<T, E> = Rc::new(RefCell::new(Some(other)));

        let downstream = sink.clone();
        let pending = Rc::downgrade(&second);
        self.end(move |delivery| match delivery {
            Ok(None) => {
                let next = pending.upgrade().and_then(|slot| slot.borrow_mut().take());
                if let Some(next) = next {
                    switch_to(next, &downstream);
                }
            }
            other => {
                downstream.end(other);
            }
        });

        let requester = self.handle();
        sink.start(move || {
            requester.start();
        })
        .abort(move || {
            self.abort();
            let next = second.borrow_mut().take();
            if let Some(next) = next {
                next.abort();
            }
        });
        stream
    }

    /// Maps every item to a stream and yields the items of those streams in
    /// order. The next item of `self` is requested only once the current
    /// inner stream ended.
    pub fn flat_map<U, F>(self, mut f: F) -> Stream<U, E>
    where
        U: 'static,
        F: FnMut(T) -> Stream<U, E> + 'static,
    {
        let (sink, stream) = channel();
        let inner: Slot<U, E> = Rc::default();

        let downstream = sink.clone();
        let outer = self.downgrade();
        let slot = Rc::downgrade(&inner);
        self.end(move |delivery| match delivery {
            Ok(Some(item)) => {
                let Some(slot) = slot.upgrade() else {
                    return;
                };
                let next = f(item);
                let (answer, source, cell) = (downstream.clone(), outer.clone(), Rc::downgrade(&slot));
                next.end(move |delivery| match delivery {
                    Ok(None) => {
                        let finished = cell.upgrade().and_then(|slot| slot.borrow_mut().take());
                        drop(finished);
                        source.start();
                    }
                    other => {
                        answer.end(other);
                    }
                });
                let running = next.handle();
                let previous = slot.borrow_mut().replace(next);
                drop(previous);
                running.start();
            }
            Ok(None) => {
                downstream.done();
            }
            Err(error) => {
                downstream.fail(error);
            }
        });

        let (requester, current) = (self.handle(), Rc::clone(&inner));
        sink.start(move || {
            let active = current.borrow().as_ref().map(Stream::handle);
            if let Some(active) = active {
                active.start();
            } else {
                requester.start();
            }
        })
        .abort(move || {
            let active = inner.borrow_mut().take();
            if let Some(active) = active {
                active.abort();
            }
            self.abort();
        });
        stream
    }
}

/// Hands the downstream channel over to `next`, preserving an outstanding
/// request.
fn switch_to<T: 'static, E: 'static>(next: Stream<T, E>, downstream: &Sink<T, E>) {
    let forward = downstream.clone();
    next.end(move |delivery| {
        forward.end(delivery);
    });
    let (requester, running) = (next.handle(), next.handle());
    downstream
        .start(move || {
            requester.start();
        })
        .abort(move || {
            next.abort();
        });
    running.start();
}
