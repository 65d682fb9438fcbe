//! Taking a single delivery as a future.

use super::Stream;
use crate::future::{self, Future};
use std::cell::RefCell;
use std::rc::Rc;

/// Result of [`Stream::future`]: the next item (`None` at the end of the
/// stream) together with the stream itself.
pub type Next<T, E> = Future<(Option<T>, Stream<T, E>), (E, Stream<T, E>)>;

impl<T: 'static, E: 'static> Stream<T, E> {
    /// Requests one delivery and resolves with it, handing the stream back
    /// so it can be polled again.
    ///
    /// # Examples
    ///
    /// ```
    /// use tether::stream;
    /// use tether::runtime::Runtime;
    ///
    /// let runtime = Runtime::new();
    /// let (first, rest) = runtime
    ///     .block_on(stream::iter::<_, ()>(vec![1, 2]).future())
    ///     .unwrap()
    ///     .unwrap();
    /// assert_eq!(first, Some(1));
    /// let (second, _rest) = runtime.block_on(rest.future()).unwrap().unwrap();
    /// assert_eq!(second, Some(2));
    /// ```
    pub fn future(self) -> Next<T, E> {
        let (task, next) = future::channel();
        let held = Rc::new(RefCell::new(Some(self.handle())));

        let (slot, answer) = (Rc::downgrade(&held), task.clone());
        self.end(move |delivery| {
            let Some(stream) = slot.upgrade().and_then(|slot| slot.borrow_mut().take()) else {
                return;
            };
            stream.unend();
            match delivery {
                Ok(item) => answer.done((item, stream)),
                Err(error) => answer.fail((error, stream)),
            };
        });
        drop(self);

        let requester = Rc::clone(&held);
        task.start(move || {
            let stream = requester.borrow().as_ref().map(Stream::handle);
            if let Some(stream) = stream {
                stream.start();
            }
        })
        .abort(move || {
            let stream = held.borrow_mut().take();
            if let Some(stream) = stream {
                stream.abort();
            }
        });
        next
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::Runtime;
    use crate::stream::{channel, iter};
    use crate::test_utils::{init_test_logging, settle};
    use std::cell::Cell;
    use std::rc::Rc;

    fn init_test(name: &str) {
        init_test_logging();
        crate::test_phase!(name);
    }

    #[test]
    fn future_yields_items_then_end() {
        init_test("future_yields_items_then_end");
        let runtime = Runtime::new();
        let Ok(Ok((first, rest))) = runtime.block_on(iter::<_, ()>(vec![7]).future()) else {
            panic!("first delivery");
        };
        crate::assert_with_log!(first == Some(7), "first", Some(7), first);
        let Ok(Ok((second, rest))) = runtime.block_on(rest.future()) else {
            panic!("second delivery");
        };
        crate::assert_with_log!(second.is_none(), "end", None::<i32>, second);
        assert!(rest.is_done());
        crate::test_complete!("future_yields_items_then_end");
    }

    #[test]
    fn future_hands_back_stream_with_error() {
        init_test("future_hands_back_stream_with_error");
        let (sink, stream) = channel::<u8, &str>();
        let feeder = sink.clone();
        let mut calls = 0;
        sink.start(move || {
            calls += 1;
            if calls == 1 {
                feeder.fail("first");
            } else {
                feeder.send(2);
            }
        });
        let Some(Err((error, stream))) = settle(stream.future()) else {
            panic!("expected failure");
        };
        crate::assert_with_log!(error == "first", "error", "first", error);
        let outcome = settle(stream.future()).and_then(Result::ok).map(|(item, _)| item);
        crate::assert_with_log!(outcome == Some(Some(2)), "after error", Some(Some(2)), outcome);
        crate::test_complete!("future_hands_back_stream_with_error");
    }

    #[test]
    fn aborting_future_aborts_stream() {
        init_test("aborting_future_aborts_stream");
        let (sink, stream) = channel::<u8, ()>();
        let aborted = Rc::new(Cell::new(false));
        let flag = Rc::clone(&aborted);
        sink.abort(move || flag.set(true));
        let next = stream.future();
        next.start();
        next.abort();
        crate::assert_with_log!(aborted.get(), "aborted", true, aborted.get());
        crate::test_complete!("aborting_future_aborts_stream");
    }
}
