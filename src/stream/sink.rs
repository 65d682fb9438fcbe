//! Sink adapters.
//!
//! Each adapter opens a fresh channel for the caller to produce into and
//! pipes that channel, transformed, into the original sink. Requests on the
//! original sink travel up the pipe; aborting it aborts the pipe.

use super::{Sink, Stream, channel};
use crate::future::Future;

impl<T: 'static, E: 'static> Sink<T, E> {
    /// Returns a sink whose items are turned into futures by `f`; each
    /// future's result is sent here.
    pub fn with<U, F>(&self, f: F) -> Sink<U, E>
    where
        U: 'static,
        F: FnMut(U) -> Future<T, E> + 'static,
    {
        let (sink, stream) = channel();
        pipe(stream.and_then(f), self);
        sink
    }

    /// Returns a sink whose items are expanded into streams by `f`; the items
    /// of those streams are sent here in order.
    pub fn with_flat_map<U, F>(&self, f: F) -> Sink<U, E>
    where
        U: 'static,
        F: FnMut(U) -> Stream<T, E> + 'static,
    {
        let (sink, stream) = channel();
        pipe(stream.flat_map(f), self);
        sink
    }

    /// Returns a sink whose items are transformed by `f` before being sent
    /// here.
    pub fn map<U, F>(&self, f: F) -> Sink<U, E>
    where
        U: 'static,
        F: FnMut(U) -> T + 'static,
    {
        let (sink, stream) = channel();
        pipe(stream.map(f), self);
        sink
    }

    /// Returns a sink whose errors are transformed by `f` before being sent
    /// here.
    pub fn map_err<G, F>(&self, f: F) -> Sink<T, G>
    where
        G: 'static,
        F: FnMut(G) -> E + 'static,
    {
        let (sink, stream) = channel();
        pipe(stream.map_err(f), self);
        sink
    }
}

/// Makes `stream` the producer of `target`.
pub(crate) fn pipe<T: 'static, E: 'static>(stream: Stream<T, E>, target: &Sink<T, E>) {
    let forward = target.clone();
    stream.end(move |delivery| {
        forward.end(delivery);
    });
    let requester = stream.handle();
    target
        .start(move || {
            requester.start();
        })
        .abort(move || {
            stream.abort();
        });
}
