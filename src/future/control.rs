//! The control object behind a [`Future`](super::Future)/[`Task`](super::Task)
//! pair.
//!
//! ```text
//!   Pending{start, abort, subscriber}
//!        |  end(result)                      abort()
//!        v                                     |
//!   Ended{result, subscriber}  -- flush --> Done <-+
//! ```
//!
//! `Ended` holds a result that has been produced but not handed over, either
//! because no subscriber is registered yet or because the delivery was
//! deferred by the reentrancy guard. No `RefCell` borrow is held while a hook
//! or subscriber runs.

use crate::guard::ReentrancyGuard;
use crate::tracing_compat::trace;
use std::cell::RefCell;
use std::mem;
use std::rc::Rc;

pub(crate) type Hook = Box<dyn FnOnce()>;
pub(crate) type Subscriber<T, E> = Box<dyn FnOnce(Result<T, E>)>;

struct Hooks<T, E> {
    start: Option<Hook>,
    abort: Option<Hook>,
    subscriber: Option<Subscriber<T, E>>,
}

enum State<T, E> {
    Pending(Hooks<T, E>),
    Ended {
        result: Result<T, E>,
        subscriber: Option<Subscriber<T, E>>,
    },
    Done,
}

pub(crate) struct Control<T, E> {
    state: RefCell<State<T, E>>,
    guard: ReentrancyGuard,
}

impl<T: 'static, E: 'static> Control<T, E> {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self {
            state: RefCell::new(State::Pending(Hooks {
                start: None,
                abort: None,
                subscriber: None,
            })),
            guard: ReentrancyGuard::new(),
        })
    }

    pub(crate) fn is_done(&self) -> bool {
        matches!(*self.state.borrow(), State::Done)
    }

    /// True once the producer can no longer deliver.
    pub(crate) fn is_closed(&self) -> bool {
        !matches!(*self.state.borrow(), State::Pending(_))
    }

    pub(crate) fn set_start(&self, hook: Hook) {
        let old = match &mut *self.state.borrow_mut() {
            State::Pending(hooks) => hooks.start.replace(hook),
            _ => Some(hook),
        };
        drop(old);
    }

    pub(crate) fn set_abort(&self, hook: Hook) {
        let old = match &mut *self.state.borrow_mut() {
            State::Pending(hooks) => hooks.abort.replace(hook),
            _ => Some(hook),
        };
        drop(old);
    }

    pub(crate) fn subscribe(&self, subscriber: Subscriber<T, E>) {
        let mut state = self.state.borrow_mut();
        match mem::replace(&mut *state, State::Done) {
            State::Pending(mut hooks) => {
                let old = hooks.subscriber.replace(subscriber);
                *state = State::Pending(hooks);
                drop(state);
                drop(old);
            }
            State::Ended { result, subscriber: old } if self.guard.has_pending() => {
                *state = State::Ended {
                    result,
                    subscriber: Some(subscriber),
                };
                drop(state);
                drop(old);
            }
            State::Ended { result, subscriber: old } => {
                drop(state);
                drop(old);
                subscriber(result);
            }
            State::Done => {
                drop(state);
                drop(subscriber);
            }
        }
    }

    pub(crate) fn unsubscribe(&self) {
        let old = match &mut *self.state.borrow_mut() {
            State::Pending(hooks) => hooks.subscriber.take(),
            State::Ended { subscriber, .. } => subscriber.take(),
            State::Done => None,
        };
        drop(old);
    }

    /// Consumes the start hook and runs it under the guard.
    pub(crate) fn start(&self) {
        let hook = match &mut *self.state.borrow_mut() {
            State::Pending(hooks) => hooks.start.take(),
            _ => None,
        };
        if let Some(hook) = hook {
            let _entered = self.guard.enter();
            hook();
        }
    }

    /// Producer-side delivery. Only the first call while pending counts.
    pub(crate) fn end(self: &Rc<Self>, result: Result<T, E>) {
        let mut state = self.state.borrow_mut();
        let hooks = match mem::replace(&mut *state, State::Done) {
            State::Pending(hooks) => hooks,
            other => {
                *state = other;
                return;
            }
        };
        let Hooks {
            start,
            abort,
            subscriber,
        } = hooks;

        if self.guard.is_executing() {
            *state = State::Ended { result, subscriber };
            drop(state);
            trace!("future delivery deferred");
            let weak = Rc::downgrade(self);
            self.guard.defer(move || {
                if let Some(control) = weak.upgrade() {
                    control.flush();
                }
            });
        } else if let Some(subscriber) = subscriber {
            drop(state);
            drop((start, abort));
            subscriber(result);
            return;
        } else {
            *state = State::Ended {
                result,
                subscriber: None,
            };
            drop(state);
        }
        drop((start, abort));
    }

    /// Runs a deferred delivery.
    fn flush(&self) {
        self.guard.settle();
        let mut state = self.state.borrow_mut();
        match mem::replace(&mut *state, State::Done) {
            State::Ended {
                result,
                subscriber: Some(subscriber),
            } => {
                drop(state);
                subscriber(result);
            }
            other => *state = other,
        }
    }

    /// Consumer-side cancellation. Runs the abort hook only if the producer
    /// has not delivered yet.
    pub(crate) fn abort(&self) {
        if self.guard.cancel() {
            trace!("deferred future delivery cancelled");
        }
        let old = mem::replace(&mut *self.state.borrow_mut(), State::Done);
        if let State::Pending(Hooks { abort, .. }) = old {
            if let Some(hook) = abort {
                hook();
            }
        }
    }
}
