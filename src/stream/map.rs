//! Per-item transforms that need no future.

use super::{Delivery, Stream};

impl<T: 'static, E: 'static> Stream<T, E> {
    /// Transforms every item.
    pub fn map<U, F>(self, mut f: F) -> Stream<U, E>
    where
        U: 'static,
        F: FnMut(T) -> U + 'static,
    {
        self.adapt(move |delivery, sink, _| {
            sink.end(delivery.map(|item| item.map(&mut f)));
        })
    }

    /// Transforms every error.
    pub fn map_err<G, F>(self, mut f: F) -> Stream<T, G>
    where
        G: 'static,
        F: FnMut(E) -> G + 'static,
    {
        self.adapt(move |delivery, sink, _| {
            sink.end(delivery.map_err(&mut f));
        })
    }

    /// Keeps only the items matching `predicate`. Each rejected item is
    /// answered by requesting the next one upstream.
    pub fn filter<F>(self, mut predicate: F) -> Self
    where
        F: FnMut(&T) -> bool + 'static,
    {
        self.adapt(move |delivery, sink, upstream| match delivery {
            Ok(Some(item)) if !predicate(&item) => upstream.start(),
            other => {
                sink.end(other);
            }
        })
    }

    /// Transforms items and drops those mapped to `None`.
    pub fn filter_map<U, F>(self, mut f: F) -> Stream<U, E>
    where
        U: 'static,
        F: FnMut(T) -> Option<U> + 'static,
    {
        self.adapt(move |delivery, sink, upstream| match delivery {
            Ok(Some(item)) => match f(item) {
                Some(mapped) => {
                    sink.send(mapped);
                }
                None => upstream.start(),
            },
            Ok(None) => {
                sink.done();
            }
            Err(error) => {
                sink.fail(error);
            }
        })
    }

    /// Observes every delivery without changing it.
    pub fn inspect<F>(self, mut f: F) -> Self
    where
        F: FnMut(&Delivery<T, E>) + 'static,
    {
        self.adapt(move |delivery, sink, _| {
            f(&delivery);
            sink.end(delivery);
        })
    }
}
