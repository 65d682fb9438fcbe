//! Stream sources.
//!
//! Every source answers requests from inside its start hook, so its
//! deliveries always reach the consumer on a later runtime turn. Draining a
//! long source therefore never deepens the stack.

use super::{Stream, channel};
use crate::future::Future;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Convert an iterator into a stream.
///
/// # Examples
///
/// ```
/// use tether::stream;
/// use tether::runtime::Runtime;
///
/// let stream = stream::iter::<_, ()>(vec![1, 2, 3]);
/// assert_eq!(Runtime::new().block_on(stream.collect()), Ok(Ok(vec![1, 2, 3])));
/// ```
pub fn iter<I, E>(i: I) -> Stream<I::Item, E>
where
    I: IntoIterator,
    I::IntoIter: 'static,
    I::Item: 'static,
    E: 'static,
{
    let (sink, stream) = channel();
    let producer = sink.clone();
    let mut iter = i.into_iter();
    sink.start(move || match iter.next() {
        Some(item) => {
            producer.send(item);
        }
        None => {
            producer.done();
        }
    });
    stream
}

/// A stream that ends on its first request.
pub fn empty<T: 'static, E: 'static>() -> Stream<T, E> {
    let (sink, stream) = channel();
    let producer = sink.clone();
    sink.start(move || {
        producer.done();
    });
    stream
}

/// A stream of exactly one item.
pub fn once<T: 'static, E: 'static>(item: T) -> Stream<T, E> {
    let (sink, stream) = channel();
    let producer = sink.clone();
    let mut item = Some(item);
    sink.start(move || match item.take() {
        Some(item) => {
            producer.send(item);
        }
        None => {
            producer.stop().done();
        }
    });
    stream
}

/// An endless stream of clones of `item`.
pub fn repeat<T: Clone + 'static, E: 'static>(item: T) -> Stream<T, E> {
    let (sink, stream) = channel();
    let producer = sink.clone();
    sink.start(move || {
        producer.send(item.clone());
    });
    stream
}

struct UnfoldState<T, S, E, F> {
    seed: Option<S>,
    step: Option<F>,
    current: Option<Future<(T, S), E>>,
}

/// Builds a stream from a seed and a step function.
///
/// On each request `f` is called with the current seed. `None` ends the
/// stream; `Some(future)` yields the item the future produces and keeps its
/// new seed for the next request. A failing future fails the request and
/// ends the stream. Aborting the stream aborts the future in flight.
pub fn unfold<T, S, E, F>(init: S, f: F) -> Stream<T, E>
where
    T: 'static,
    S: 'static,
    E: 'static,
    F: FnMut(S) -> Option<Future<(T, S), E>> + 'static,
{
    let (sink, stream) = channel();
    let state = Rc::new(RefCell::new(UnfoldState {
        seed: Some(init),
        step: Some(f),
        current: None,
    }));

    let driver = Rc::clone(&state);
    let producer = sink.clone();
    sink.start(move || {
        let (seed, step) = {
            let mut state = driver.borrow_mut();
            (state.seed.take(), state.step.take())
        };
        let (Some(seed), Some(mut step)) = (seed, step) else {
            producer.done();
            return;
        };
        let next = step(seed);
        driver.borrow_mut().step = Some(step);
        let Some(next) = next else {
            producer.done();
            return;
        };

        let weak: Weak<RefCell<UnfoldState<T, S, E, F>>> = Rc::downgrade(&driver);
        let sink = producer.clone();
        next.end(move |result| match result {
            Ok((item, seed)) => {
                if let Some(state) = weak.upgrade() {
                    state.borrow_mut().seed = Some(seed);
                }
                sink.send(item);
            }
            Err(error) => {
                sink.fail_terminal(error);
            }
        });
        let running = next.handle();
        let previous = driver.borrow_mut().current.replace(next);
        drop(previous);
        running.start();
    })
    .abort(move || {
        let current = state.borrow_mut().current.take();
        if let Some(current) = current {
            current.abort();
        }
    });
    stream
}
