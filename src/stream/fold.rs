//! Terminal consumers: draining a stream into a future.

use super::Stream;
use crate::future::{self, Future};
use std::cell::RefCell;
use std::rc::Rc;

struct FoldState<A, E, F> {
    acc: Option<A>,
    step: Option<F>,
    inflight: Option<Future<A, E>>,
}

impl<T: 'static, E: 'static> Stream<T, E> {
    /// Threads an accumulator through every item. `f` returns a future of
    /// the next accumulator; the next item is requested once it resolves.
    ///
    /// The first error, from the stream or from `f`, aborts the stream and
    /// fails the fold.
    pub fn fold<A, F>(self, init: A, f: F) -> Future<A, E>
    where
        A: 'static,
        F: FnMut(A, T) -> Future<A, E> + 'static,
    {
        let (task, folded) = future::channel();
        let state = Rc::new(RefCell::new(FoldState {
            acc: Some(init),
            step: Some(f),
            inflight: None,
        }));

        let weak = Rc::downgrade(&state);
        let (answer, source) = (task.clone(), self.downgrade());
        self.end(move |delivery| match delivery {
            Ok(Some(item)) => {
                let Some(state) = weak.upgrade() else {
                    return;
                };
                let (acc, step) = {
                    let mut state = state.borrow_mut();
                    (state.acc.take(), state.step.take())
                };
                let (Some(acc), Some(mut step)) = (acc, step) else {
                    return;
                };
                let next = step(acc, item);
                state.borrow_mut().step = Some(step);

                let (slot, answer, source) = (Rc::downgrade(&state), answer.clone(), source.clone());
                next.end(move |result| match result {
                    Ok(acc) => {
                        if let Some(state) = slot.upgrade() {
                            state.borrow_mut().acc = Some(acc);
                        }
                        source.start();
                    }
                    Err(error) => {
                        source.abort();
                        answer.fail(error);
                    }
                });
                let running = next.handle();
                let previous = state.borrow_mut().inflight.replace(next);
                drop(previous);
                running.start();
            }
            Ok(None) => {
                let acc = weak.upgrade().and_then(|state| state.borrow_mut().acc.take());
                if let Some(acc) = acc {
                    answer.done(acc);
                }
            }
            Err(error) => {
                source.abort();
                answer.fail(error);
            }
        });

        let requester = self.handle();
        task.start(move || {
            requester.start();
        })
        .abort(move || {
            let current = state.borrow_mut().inflight.take();
            if let Some(current) = current {
                current.abort();
            }
            self.abort();
        });
        folded
    }

    /// Collects every item. The first error aborts the stream and fails the
    /// collection.
    pub fn collect(self) -> Future<Vec<T>, E> {
        let (task, collected) = future::channel();
        let items: Rc<RefCell<Vec<T>>> = Rc::default();

        let (answer, source) = (task.clone(), self.downgrade());
        self.end(move |delivery| match delivery {
            Ok(Some(item)) => {
                items.borrow_mut().push(item);
                source.start();
            }
            Ok(None) => {
                let items = items.take();
                answer.done(items);
            }
            Err(error) => {
                source.abort();
                answer.fail(error);
            }
        });

        let requester = self.handle();
        task.start(move || {
            requester.start();
        })
        .abort(move || {
            self.abort();
        });
        collected
    }

    /// Runs `f` on every item, one at a time, waiting for each returned
    /// future before requesting the next item.
    ///
    /// The first error aborts the stream and fails the returned future.
    pub fn for_each<F>(self, mut f: F) -> Future<(), E>
    where
        F: FnMut(T) -> Future<(), E> + 'static,
    {
        self.fold((), move |(), item| f(item))
    }
}

#[cfg(test)]
mod tests {
    use crate::future;
    use crate::runtime::Runtime;
    use crate::stream::{channel, iter};
    use crate::test_utils::{init_test_logging, settle};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn init_test(name: &str) {
        init_test_logging();
        crate::test_phase!(name);
    }

    #[test]
    fn fold_threads_accumulator() {
        init_test("fold_threads_accumulator");
        let sum = iter::<_, ()>(1..=10).fold(0, |acc, n| future::ok(acc + n));
        let outcome = settle(sum);
        crate::assert_with_log!(outcome == Some(Ok(55)), "sum", 55, outcome);
        crate::test_complete!("fold_threads_accumulator");
    }

    #[test]
    fn fold_step_failure_aborts_stream() {
        init_test("fold_step_failure_aborts_stream");
        let (sink, stream) = channel::<u8, &str>();
        let feeder = sink.clone();
        sink.start(move || {
            feeder.send(1);
        });
        let aborted = Rc::new(Cell::new(false));
        let flag = Rc::clone(&aborted);
        sink.abort(move || flag.set(true));

        let folded = stream.fold(0_u8, |_, _| future::err("refused"));
        let outcome = settle(folded);
        crate::assert_with_log!(outcome == Some(Err("refused")), "error", "refused", outcome);
        crate::assert_with_log!(aborted.get(), "stream aborted", true, aborted.get());
        crate::test_complete!("fold_step_failure_aborts_stream");
    }

    #[test]
    fn collect_fails_on_first_stream_error() {
        init_test("collect_fails_on_first_stream_error");
        let (sink, stream) = channel::<u8, &str>();
        let collected = stream.collect();
        let outcome = Rc::new(RefCell::new(None));
        let out = Rc::clone(&outcome);
        collected.end(move |result| *out.borrow_mut() = Some(result));
        collected.start();
        sink.send(1);
        sink.fail("lost");
        sink.send(2);
        crate::assert_with_log!(
            *outcome.borrow() == Some(Err("lost")),
            "outcome",
            "Err(lost)",
            outcome.borrow()
        );
        assert!(sink.is_closed());
        crate::test_complete!("collect_fails_on_first_stream_error");
    }

    #[test]
    fn for_each_runs_sequentially() {
        init_test("for_each_runs_sequentially");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let done = iter::<_, ()>(vec!['a', 'b', 'c']).for_each(move |c| {
            log.borrow_mut().push(c);
            future::ok(())
        });
        let outcome = settle(done);
        crate::assert_with_log!(outcome == Some(Ok(())), "outcome", "Ok(())", outcome);
        crate::assert_with_log!(*seen.borrow() == vec!['a', 'b', 'c'], "seen", "abc", seen.borrow());
        crate::test_complete!("for_each_runs_sequentially");
    }

    #[test]
    fn aborting_collect_aborts_stream() {
        init_test("aborting_collect_aborts_stream");
        let (sink, stream) = channel::<u8, ()>();
        let aborted = Rc::new(Cell::new(false));
        let flag = Rc::clone(&aborted);
        sink.abort(move || flag.set(true));
        let collected = stream.collect();
        collected.start();
        collected.abort();
        Runtime::new().run_until_idle();
        crate::assert_with_log!(aborted.get(), "aborted", true, aborted.get());
        crate::test_complete!("aborting_collect_aborts_stream");
    }
}
