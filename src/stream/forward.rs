//! Draining a stream into a sink.

use super::{Sink, Stream};
use crate::future::{self, Future};
use std::cell::RefCell;
use std::rc::Rc;

/// Result of [`Stream::forward`]: the idle sink and the drained stream.
pub type Forward<T, E> = Future<(Sink<T, E>, Stream<T, E>), E>;

impl<T: 'static, E: 'static> Stream<T, E> {
    /// Sends every item into `sink`, one per request from the sink's
    /// consumer, and resolves with the pair once the stream ends.
    ///
    /// The sink is not closed: it is handed back idle, and a request its
    /// consumer made in the meantime is kept for the sink's next producer.
    /// A stream error aborts the stream and fails the returned future. If
    /// the sink's consumer aborts, the stream is aborted and the future
    /// resolves with both handles.
    pub fn forward(self, sink: Sink<T, E>) -> Forward<T, E> {
        let (task, forwarded) = future::channel();
        let held = Rc::new(RefCell::new(Some(self)));

        let (wiring, target, answer) = (Rc::clone(&held), sink.clone(), task.clone());
        task.start(move || {
            let stream = wiring.borrow().as_ref().map(Stream::handle);
            let Some(stream) = stream else {
                return;
            };
            let (slot, producer, resolver) = (Rc::downgrade(&wiring), target.clone(), answer.clone());
            stream.end(move |delivery| match delivery {
                Ok(Some(item)) => {
                    producer.send(item);
                }
                Ok(None) => {
                    let Some(stream) = slot.upgrade().and_then(|slot| slot.borrow_mut().take())
                    else {
                        return;
                    };
                    producer.stop();
                    stream.unend();
                    resolver.done((producer.clone(), stream));
                }
                Err(error) => {
                    let stream = slot.upgrade().and_then(|slot| slot.borrow_mut().take());
                    producer.stop();
                    if let Some(stream) = stream {
                        stream.abort();
                    }
                    resolver.fail(error);
                }
            });

            let (aborts, producer) = (Rc::downgrade(&wiring), target.clone());
            target
                .abort(move || {
                    let stream = aborts.upgrade().and_then(|slot| slot.borrow_mut().take());
                    if let Some(stream) = stream {
                        stream.abort();
                        answer.done((producer, stream));
                    }
                })
                .start(move || {
                    stream.start();
                });
        })
        .abort(move || {
            let stream = held.borrow_mut().take();
            sink.stop();
            if let Some(stream) = stream {
                stream.abort();
            }
        });
        forwarded
    }
}

impl<T: 'static, E: 'static> Sink<T, E> {
    /// Drains `stream` into this sink. See [`Stream::forward`].
    pub fn send_all(&self, stream: Stream<T, E>) -> Forward<T, E> {
        stream.forward(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::Runtime;
    use crate::stream::{Delivery, Forward, channel, iter};
    use crate::test_utils::{init_test_logging, settle};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn init_test(name: &str) {
        init_test_logging();
        crate::test_phase!(name);
    }

    #[test]
    fn forward_hands_back_sink_with_outstanding_request() {
        init_test("forward_hands_back_sink_with_outstanding_request");
        let (sink, out) = channel::<u8, ()>();
        let log: Rc<RefCell<Vec<Delivery<u8, ()>>>> = Rc::default();
        let store = Rc::clone(&log);
        let requester = out.downgrade();
        out.end(move |delivery| {
            store.borrow_mut().push(delivery);
            requester.start();
        });
        out.start();

        let Some(Ok((sink, drained))) = settle(iter::<_, ()>(vec![1, 2]).forward(sink)) else {
            panic!("forward failed");
        };
        assert!(drained.is_done());
        sink.send(9);
        let Some(Ok((sink, _))) = settle(sink.send_all(iter(vec![3]))) else {
            panic!("send_all failed");
        };
        assert!(!sink.is_closed());

        let expected = vec![Ok(Some(1)), Ok(Some(2)), Ok(Some(9)), Ok(Some(3))];
        crate::assert_with_log!(*log.borrow() == expected, "log", expected, log.borrow());
        crate::test_complete!("forward_hands_back_sink_with_outstanding_request");
    }

    #[test]
    fn handoff_from_inside_start_hook_keeps_request() {
        init_test("handoff_from_inside_start_hook_keeps_request");
        let (sink, out) = channel::<u8, ()>();
        let producer = sink.clone();
        let forwarding: Rc<RefCell<Option<Forward<u8, ()>>>> = Rc::default();
        let keep = Rc::clone(&forwarding);
        let first_hook_runs = Rc::new(Cell::new(0));
        let runs = Rc::clone(&first_hook_runs);
        sink.start(move || {
            runs.set(runs.get() + 1);
            let feed = producer.send_all(iter(vec![1, 2, 3]));
            feed.start();
            *keep.borrow_mut() = Some(feed);
        });

        let outcome = settle(out.take(3).collect());
        crate::assert_with_log!(outcome == Some(Ok(vec![1, 2, 3])), "items", vec![1, 2, 3], outcome);
        crate::assert_with_log!(first_hook_runs.get() == 1, "first hook runs", 1, first_hook_runs.get());
        crate::test_complete!("handoff_from_inside_start_hook_keeps_request");
    }

    #[test]
    fn stream_error_fails_forward_and_aborts_stream() {
        init_test("stream_error_fails_forward_and_aborts_stream");
        let (source, stream) = channel::<u8, &str>();
        let feeder = source.clone();
        source.start(move || {
            feeder.fail("broken");
        });
        let aborted = Rc::new(Cell::new(false));
        let flag = Rc::clone(&aborted);
        source.abort(move || flag.set(true));

        let (sink, out) = channel::<u8, &str>();
        out.end(|_| {});
        out.start();
        let outcome = settle(stream.forward(sink)).map(|result| result.err());
        crate::assert_with_log!(outcome == Some(Some("broken")), "error", "broken", outcome);
        crate::assert_with_log!(aborted.get(), "stream aborted", true, aborted.get());
        crate::test_complete!("stream_error_fails_forward_and_aborts_stream");
    }

    #[test]
    fn consumer_abort_stops_forwarding() {
        init_test("consumer_abort_stops_forwarding");
        let (source, stream) = channel::<u8, ()>();
        let aborted = Rc::new(Cell::new(false));
        let flag = Rc::clone(&aborted);
        source.abort(move || flag.set(true));

        let (sink, out) = channel::<u8, ()>();
        let forwarding = stream.forward(sink);
        let settled = Rc::new(Cell::new(false));
        let seen = Rc::clone(&settled);
        forwarding.end(move |result| seen.set(result.is_ok()));
        forwarding.start();
        out.start();
        out.abort();
        Runtime::new().run_until_idle();

        crate::assert_with_log!(aborted.get(), "stream aborted", true, aborted.get());
        crate::assert_with_log!(settled.get(), "forward settled", true, settled.get());
        crate::test_complete!("consumer_abort_stops_forwarding");
    }
}
