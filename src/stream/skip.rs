//! Dropping a prefix of a stream.

use super::{Stream, channel};
use crate::future::Future;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

impl<T: 'static, E: 'static> Stream<T, E> {
    /// Drops the first `n` items. Errors pass through and do not count.
    pub fn skip(self, n: usize) -> Self {
        let mut remaining = n;
        self.adapt(move |delivery, sink, upstream| match delivery {
            Ok(Some(_)) if remaining > 0 => {
                remaining -= 1;
                upstream.start();
            }
            other => {
                sink.end(other);
            }
        })
    }

    /// Drops items while the predicate future resolves to `true`, then
    /// yields the first rejected item and everything after it.
    ///
    /// A failing predicate aborts the upstream and ends the stream with the
    /// predicate's error.
    pub fn skip_while<F>(self, mut predicate: F) -> Self
    where
        F: FnMut(&T) -> Future<bool, E> + 'static,
    {
        let (sink, stream) = channel();
        let inflight: Rc<RefCell<Option<Future<bool, E>>>> = Rc::default();
        let skipping = Rc::new(Cell::new(true));

        let downstream = sink.clone();
        let upstream = self.downgrade();
        let slot = Rc::downgrade(&inflight);
        self.end(move |delivery| match delivery {
            Ok(Some(item)) if skipping.get() => {
                let verdict = predicate(&item);
                let (answer, source, flag) = (downstream.clone(), upstream.clone(), Rc::clone(&skipping));
                let mut item = Some(item);
                verdict.end(move |result| match result {
                    Ok(true) => source.start(),
                    Ok(false) => {
                        flag.set(false);
                        if let Some(item) = item.take() {
                            answer.send(item);
                        }
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
