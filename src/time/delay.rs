//! Delays and timeouts.

use crate::future::{self, Future};
use crate::runtime::{self, TimerToken};
use crate::tracing_compat::trace;
use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// A future that succeeds with `()` once `duration` has passed since it was
/// started.
pub fn delay(duration: Duration) -> Future<(), Infallible> {
    delay_result(duration, Ok(()))
}

/// A future that settles with `result` once `duration` has passed since it
/// was started.
pub fn delay_result<T: 'static, E: 'static>(duration: Duration, result: Result<T, E>) -> Future<T, E> {
    let (task, future) = future::channel();
    let armed: Rc<Cell<Option<TimerToken>>> = Rc::default();

    let producer = task.clone();
    let start_armed = Rc::clone(&armed);
    task.start(move || {
        let deadline = Instant::now() + duration;
        let token = runtime::schedule_at(deadline, move || {
            producer.end(result);
        });
        trace!(?duration, "delay armed");
        start_armed.set(Some(token));
    })
    .abort(move || {
        if let Some(token) = armed.take() {
            runtime::cancel_timer(token);
        }
    });
    future
}

/// Races `future` against a delay that fails with `error` after `duration`.
/// Whichever loses is aborted.
pub fn timeout<T: 'static, E: 'static>(future: Future<T, E>, duration: Duration, error: E) -> Future<T, E> {
    future.select(delay_result(duration, Err(error)))
}
