//! Per-item combinators driven by a future.
//!
//! Each item is turned into a future; the stream answers the current
//! request with that future's result. Only one future is in flight at a time
//! and aborting the stream aborts it.

use super::{Delivery, Sink, Stream, channel};
use crate::future::Future;
use std::cell::RefCell;
use std::rc::Rc;

/// What to do with one upstream delivery.
enum Step<U, G> {
    /// Answer the request right away.
    Emit(Delivery<U, G>),
    /// Answer the request with the future's result.
    Await(Future<U, G>),
}

impl<T: 'static, E: 'static> Stream<T, E> {
    /// Runs `f` on every delivery, items and errors alike, and yields the
    /// results of the futures it returns. The end of the stream passes
    /// through untouched.
    pub fn then<U, G, F>(self, mut f: F) -> Stream<U, G>
    where
        U: 'static,
        G: 'static,
        F: FnMut(Result<T, E>) -> Future<U, G> + 'static,
    {
        self.per_item(move |delivery| match delivery {
            Ok(Some(item)) => Step::Await(f(Ok(item))),
            Ok(None) => Step::Emit(Ok(None)),
            Err(error) => Step::Await(f(Err(error))),
        })
    }

    /// Runs `f` on every item and yields the results of the futures it
    /// returns. Errors pass through.
    pub fn and_then<U, F>(self, mut f: F) -> Stream<U, E>
    where
        U: 'static,
        F: FnMut(T) -> Future<U, E> + 'static,
    {
        self.per_item(move |delivery| match delivery {
            Ok(Some(item)) => Step::Await(f(item)),
            Ok(None) => Step::Emit(Ok(None)),
            Err(error) => Step::Emit(Err(error)),
        })
    }

    /// Runs `f` on every error and yields the results of the futures it
    /// returns, so a failed item can be replaced. Items pass through.
    pub fn or_else<G, F>(self, mut f: F) -> Stream<T, G>
    where
        G: 'static,
        F: FnMut(E) -> Future<T, G> + 'static,
    {
        self.per_item(move |delivery| match delivery {
            Ok(item) => Step::Emit(Ok(item)),
            Err(error) => Step::Await(f(error)),
        })
    }

    fn per_item<U, G, H>(self, mut route: H) -> Stream<U, G>
    where
        U: 'static,
        G: 'static,
        H: FnMut(Delivery<T, E>) -> Step<U, G> + 'static,
    {
        let (sink, stream) = channel();
        let inflight: Rc<RefCell<Option<Future<U, G>>>> = Rc::default();

        let downstream = sink.clone();
        let slot = Rc::downgrade(&inflight);
        self.end(move |delivery| match route(delivery) {
            Step::Emit(delivery) => {
                downstream.end(delivery);
            }
            Step::Await(next) => {
                let answer: Sink<U, G> = downstream.clone();
                next.end(move |result| {
                    answer.end(result.map(Some));
                });
                let running = next.handle();
                if let Some(slot) = slot.upgrade() {
                    let previous = slot.borrow_mut().replace(next);
                    drop(previous);
                }
                running.start();
            }
        });

        let requester = self.handle();
        sink.start(move || {
            requester.start();
        })
        .abort(move || {
            let current = inflight.borrow_mut().take();
            if let Some(current) = current {
                current.abort();
            }
            self.abort();
        });
        stream
    }
}

#[cfg(test)]
mod tests {
    use crate::future;
    use crate::stream::{Delivery, channel, iter};
    use crate::test_utils::{init_test_logging, settle};
    use crate::time::delay_result;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use std::time::Duration;

    fn init_test(name: &str) {
        init_test_logging();
        crate::test_phase!(name);
    }

    #[test]
    fn and_then_awaits_each_item_in_order() {
        init_test("and_then_awaits_each_item_in_order");
        let stream = iter::<_, ()>(vec![30_u64, 1, 10]).and_then(|ms| {
            delay_result(Duration::from_millis(ms), Ok(ms))
        });
        let outcome = settle(stream.collect());
        crate::assert_with_log!(outcome == Some(Ok(vec![30, 1, 10])), "order", "[30, 1, 10]", outcome);
        crate::test_complete!("and_then_awaits_each_item_in_order");
    }

    #[test]
    fn or_else_recovers_and_continues() {
        init_test("or_else_recovers_and_continues");
        let (sink, stream) = channel::<u8, &str>();
        let recovered = stream.or_else(|e| future::ok::<u8, ()>(u8::try_from(e.len()).unwrap_or(u8::MAX)));
        let log: Rc<RefCell<Vec<Delivery<u8, ()>>>> = Rc::default();
        let out = Rc::clone(&log);
        recovered.end(move |delivery| out.borrow_mut().push(delivery));

        recovered.start();
        sink.send(1);
        recovered.start();
        sink.fail("three");
        crate::runtime::Runtime::new().run_until_idle();
        recovered.start();
        sink.send(2);
        recovered.start();
        sink.done();

        let expected = vec![Ok(Some(1)), Ok(Some(5)), Ok(Some(2)), Ok(None)];
        crate::assert_with_log!(*log.borrow() == expected, "log", expected, log.borrow());
        crate::test_complete!("or_else_recovers_and_continues");
    }

    #[test]
    fn then_sees_items_and_errors() {
        init_test("then_sees_items_and_errors");
        let (sink, stream) = channel::<u8, u8>();
        let described = stream.then(|r| future::ok::<String, ()>(format!("{r:?}")));
        let log: Rc<RefCell<Vec<Delivery<String, ()>>>> = Rc::default();
        let out = Rc::clone(&log);
        described.end(move |delivery| out.borrow_mut().push(delivery));

        let runtime = crate::runtime::Runtime::new();
        described.start();
        sink.send(1);
        runtime.run_until_idle();
        described.start();
        sink.fail(2);
        runtime.run_until_idle();

        let expected = vec![Ok(Some("Ok(1)".to_string())), Ok(Some("Err(2)".to_string()))];
        crate::assert_with_log!(*log.borrow() == expected, "log", expected, log.borrow());
        crate::test_complete!("then_sees_items_and_errors");
    }

    #[test]
    fn abort_reaches_inflight_future() {
        init_test("abort_reaches_inflight_future");
        let (task, pending) = future::channel::<u8, ()>();
        let aborted = Rc::new(Cell::new(false));
        let flag = Rc::clone(&aborted);
        task.abort(move || flag.set(true));
        let mut pending = Some(pending);

        let (sink, stream) = channel::<u8, ()>();
        let awaited = stream.and_then(move |_| pending.take().unwrap_or_else(future::never));
        awaited.end(|_| {});
        awaited.start();
        sink.send(1);
        awaited.abort();
        crate::assert_with_log!(aborted.get(), "inflight aborted", true, aborted.get());
        assert!(sink.is_closed());
        crate::test_complete!("abort_reaches_inflight_future");
    }
}
