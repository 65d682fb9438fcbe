//! Batching items.

use super::Stream;

impl<T: 'static, E: 'static> Stream<T, E> {
    /// Groups items into vectors of `capacity` items. The last batch may be
    /// shorter and is yielded before the end of the stream. Errors pass
    /// through as they arrive, leaving the batch being filled untouched.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn chunks(self, capacity: usize) -> Stream<Vec<T>, E> {
        assert!(capacity > 0, "chunk capacity must be positive");
        let mut batch = Vec::with_capacity(capacity);
        self.adapt(move |delivery, sink, upstream| match delivery {
            Ok(Some(item)) => {
                batch.push(item);
                if batch.len() < capacity {
                    upstream.start();
                } else {
                    let full = std::mem::replace(&mut batch, Vec::with_capacity(capacity));
                    sink.send(full);
                }
            }
            Ok(None) if batch.is_empty() => {
                sink.done();
            }
            Ok(None) => {
                sink.send(std::mem::take(&mut batch));
                let closer = sink.clone();
                sink.start(move || {
                    closer.done();
                });
            }
            Err(error) => {
                sink.fail(error);
            }
        })
    }
}
