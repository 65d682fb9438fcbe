//! Keeping a prefix of a stream.

use super::{Stream, channel};
use crate::future::Future;
use std::cell::RefCell;
use std::rc::Rc;

impl<T: 'static, E: 'static> Stream<T, E> {
    /// Yields at most `n` items. The upstream is aborted as soon as the
    /// `n`-th item arrives, or on the first request when `n` is zero.
    pub fn take(self, n: usize) -> Self {
        if n == 0 {
            let (sink, stream) = channel();
            let (producer, upstream) = (sink.clone(), self.handle());
            sink.start(move || {
                upstream.abort();
                producer.done();
            })
            .abort(move || {
                self.abort();
            });
            return stream;
        }

        let mut remaining = n;
        self.adapt(move |delivery, sink, upstream| match delivery {
            Ok(Some(item)) => {
                remaining -= 1;
                if remaining == 0 {
                    upstream.abort();
                    sink.send(item);
                    let closer = sink.clone();
                    sink.start(move || {
                        closer.done();
                    });
                } else {
                    sink.send(item);
                }
            }
            other => {
                sink.end(other);
            }
        })
    }

    /// Yields items while the predicate future resolves to `true`. The
    /// first `false` aborts the upstream and ends the stream.
    ///
    /// A failing predicate aborts the upstream and ends the stream with the
    /// predicate's error.
    pub fn take_while<F>(self, mut predicate: F) -> Self
    where
        F: FnMut(&T) -> Future<bool, E> + 'static,
    {
        let (sink, stream) = channel();
        let inflight: Rc<RefCell<Option<Future<bool, E>>>> = Rc::default();

        let downstream = sink.clone();
        let upstream = self.downgrade();
        let slot = Rc::downgrade(&inflight);
        self.end(move |delivery| match delivery {
            Ok(Some(item)) => {
                let verdict = predicate(&item);
                let (answer, source) = (downstream.clone(), upstream.clone());
                let mut item = Some(item);
                verdict.end(move |result| match result {
                    Ok(true) => {
                        if let Some(item) = item.take() {
                            answer.send(item);
                        }
                    }
                    Ok(false) => {
                        source.abort();
                        answer.done();
                    }
                    Err(error) => {
                        source.abort();
                        answer.fail_terminal(error);
                    }
                });
                let running = verdict.handle();
                if let Some(slot) = slot.upgrade() {
                    let previous = slot.borrow_mut().replace(verdict);
                    drop(previous);
                }
                running.start();
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
            let current = inflight.borrow_mut().take();
            if let Some(current) = current {
                current.abort();
            }
            self.abort();
        });
        stream
    }
}
