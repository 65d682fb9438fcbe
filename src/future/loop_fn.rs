//! Asynchronous loops without stack growth.

use super::{Future, Task, channel};
use crate::either::Either;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Outcome of one loop step: `Either::A` breaks with a value, `Either::B`
/// continues with new state.
pub type Loop<T, S> = Either<T, S>;

/// Ends the loop with `item`.
pub const fn loop_break<T, S>(item: T) -> Loop<T, S> {
    Either::A(item)
}

/// Runs another step with `state`.
pub const fn loop_continue<T, S>(state: S) -> Loop<T, S> {
    Either::B(state)
}

struct LoopState<T, S, E, F> {
    step: Option<F>,
    current: Option<Future<Loop<T, S>, E>>,
}

/// Repeatedly runs `step`, feeding each `Continue` state back in, until a
/// step breaks or fails.
///
/// Every step result reaches the loop through the runtime, so a loop of
/// synchronous steps advances one step per turn instead of recursing.
/// Aborting the loop aborts the step in flight.
pub fn loop_fn<T, S, E, F>(initial: S, step: F) -> Future<T, E>
where
    T: 'static,
    S: 'static,
    E: 'static,
    F: FnMut(S) -> Future<Loop<T, S>, E> + 'static,
{
    let (task, future) = channel();
    let state = Rc::new(RefCell::new(LoopState {
        step: Some(step),
        current: None,
    }));

    let driver = Rc::clone(&state);
    let producer = task.clone();
    task.start(move || run_step(&driver, producer, initial))
        .abort(move || {
            let current = state.borrow_mut().current.take();
            if let Some(current) = current {
                current.abort();
            }
        });
    future
}

fn run_step<T, S, E, F>(state: &Rc<RefCell<LoopState<T, S, E, F>>>, task: Task<T, E>, input: S)
where
    T: 'static,
    S: 'static,
    E: 'static,
    F: FnMut(S) -> Future<Loop<T, S>, E> + 'static,
{
    let Some(mut step) = state.borrow_mut().step.take() else {
        return;
    };
    let next = step(input);
    state.borrow_mut().step = Some(step);

    let weak: Weak<RefCell<LoopState<T, S, E, F>>> = Rc::downgrade(state);
    next.end(move |result| {
        let Some(state) = weak.upgrade() else {
            return;
        };
        match result {
            Ok(Either::B(input)) => run_step(&state, task, input),
            Ok(Either::A(item)) => {
                task.done(item);
            }
            Err(error) => {
                task.fail(error);
            }
        }
    });
    let running = next.handle();
    let previous = state.borrow_mut().current.replace(next);
    drop(previous);
    running.start();
}
