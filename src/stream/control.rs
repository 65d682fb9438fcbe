//! The control object behind a [`Stream`](super::Stream)/[`Sink`](super::Sink)
//! pair.
//!
//! Unlike a future's control, the start hook and the subscriber are
//! persistent `FnMut`s: each `start()` runs the hook once and each delivery
//! runs the subscriber once. Both are taken out of the cell while they run
//! and put back afterwards unless they were replaced in the meantime, which
//! the epoch counters detect.
//!
//! At most one delivery is outstanding. A delivery made while the start
//! hook is on the stack, or while no subscriber is registered, is queued
//! here until it can be handed over.

use super::Delivery;
use crate::guard::ReentrancyGuard;
use crate::tracing_compat::trace;
use std::cell::RefCell;
use std::mem;
use std::rc::Rc;

pub(crate) type StartHook = Box<dyn FnMut()>;
pub(crate) type AbortHook = Box<dyn FnOnce()>;
pub(crate) type Subscriber<T, E> = Box<dyn FnMut(Delivery<T, E>)>;

struct Open<T, E> {
    start: Option<StartHook>,
    start_epoch: u64,
    abort: Option<AbortHook>,
    subscriber: Option<Subscriber<T, E>>,
    subscriber_epoch: u64,
    /// The consumer asked for a delivery that has not been made yet.
    requested: bool,
    /// A delivery waiting to be handed to the subscriber.
    queued: Option<Delivery<T, E>>,
}

enum State<T, E> {
    Open(Open<T, E>),
    Done,
}

pub(crate) struct Control<T, E> {
    state: RefCell<State<T, E>>,
    guard: ReentrancyGuard,
}

impl<T: 'static, E: 'static> Control<T, E> {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self {
            state: RefCell::new(State::Open(Open {
                start: None,
                start_epoch: 0,
                abort: None,
                subscriber: None,
                subscriber_epoch: 0,
                requested: false,
                queued: None,
            })),
            guard: ReentrancyGuard::new(),
        })
    }

    pub(crate) fn is_done(&self) -> bool {
        matches!(*self.state.borrow(), State::Done)
    }

    /// True once no further delivery will be accepted.
    pub(crate) fn is_closed(&self) -> bool {
        match &*self.state.borrow() {
            State::Open(open) => matches!(open.queued, Some(Ok(None))),
            State::Done => true,
        }
    }

    pub(crate) fn subscribe(self: &Rc<Self>, subscriber: Subscriber<T, E>) {
        let (old, ready) = match &mut *self.state.borrow_mut() {
            State::Open(open) => {
                open.subscriber_epoch += 1;
                let old = open.subscriber.replace(subscriber);
                let ready = if self.guard.has_pending() {
                    None
                } else {
                    open.queued.take()
                };
                (old, ready)
            }
            State::Done => (Some(subscriber), None),
        };
        drop(old);
        if let Some(delivery) = ready {
            self.hand_over(delivery);
        }
    }

    pub(crate) fn unsubscribe(&self) {
        let old = match &mut *self.state.borrow_mut() {
            State::Open(open) => {
                open.subscriber_epoch += 1;
                open.subscriber.take()
            }
            State::Done => None,
        };
        drop(old);
    }

    pub(crate) fn set_start(self: &Rc<Self>, hook: StartHook) {
        let (old, replay) = match &mut *self.state.borrow_mut() {
            State::Open(open) => {
                open.start_epoch += 1;
                let old = open.start.replace(hook);
                let replay =
                    open.requested && open.queued.is_none() && !self.guard.is_executing();
                (old, replay)
            }
            State::Done => (Some(hook), false),
        };
        drop(old);
        if replay {
            trace!("replaying outstanding stream request");
            self.run_start_hook();
        }
    }

    /// Withdraws the start hook; later requests are remembered but not
    /// acted on until a new hook is registered.
    pub(crate) fn clear_start(&self) {
        let old = match &mut *self.state.borrow_mut() {
            State::Open(open) => {
                open.start_epoch += 1;
                open.start.take()
            }
            State::Done => None,
        };
        drop(old);
    }

    pub(crate) fn set_abort(&self, hook: AbortHook) {
        let old = match &mut *self.state.borrow_mut() {
            State::Open(open) => open.abort.replace(hook),
            State::Done => Some(hook),
        };
        drop(old);
    }

    /// Consumer request for exactly one delivery. Ignored while a request is
    /// outstanding or a delivery is waiting.
    pub(crate) fn request(self: &Rc<Self>) {
        {
            let mut state = self.state.borrow_mut();
            let State::Open(open) = &mut *state else {
                return;
            };
            if open.requested || open.queued.is_some() {
                return;
            }
            open.requested = true;
        }
        self.run_start_hook();
    }

    /// Runs the start hook under the guard. A hook registered while the old
    /// one ran, with the request still unanswered, runs next.
    fn run_start_hook(self: &Rc<Self>) {
        loop {
            let taken = match &mut *self.state.borrow_mut() {
                State::Open(open) => open.start.take().map(|hook| (hook, open.start_epoch)),
                State::Done => None,
            };
            let Some((mut hook, epoch)) = taken else {
                return;
            };
            {
                let _entered = self.guard.enter();
                hook();
            }
            let (unused, replay) = match &mut *self.state.borrow_mut() {
                State::Open(open) if open.start_epoch == epoch && open.start.is_none() => {
                    open.start = Some(hook);
                    (None, false)
                }
                State::Open(open) => {
                    let replay = open.start.is_some() && open.requested && open.queued.is_none();
                    (Some(hook), replay)
                }
                State::Done => (Some(hook), false),
            };
            drop(unused);
            if !replay {
                return;
            }
            trace!("replaying outstanding stream request");
        }
    }

    /// Producer-side delivery. Ignored unless a request is outstanding.
    pub(crate) fn deliver(self: &Rc<Self>, delivery: Delivery<T, E>) {
        let closing = matches!(delivery, Ok(None));
        let mut retired = None;
        let inline = {
            let mut state = self.state.borrow_mut();
            let State::Open(open) = &mut *state else {
                return;
            };
            if !open.requested || open.queued.is_some() {
                trace!("stream delivery without request dropped");
                return;
            }
            open.requested = false;
            if closing {
                retired = Some((open.start.take(), open.abort.take()));
            }
            if self.guard.is_executing() || open.subscriber.is_none() {
                open.queued = Some(delivery);
                None
            } else {
                Some(delivery)
            }
        };
        drop(retired);

        match inline {
            Some(delivery) => self.hand_over(delivery),
            None if self.guard.is_executing() => {
                trace!("stream delivery deferred");
                let weak = Rc::downgrade(self);
                self.guard.defer(move || {
                    if let Some(control) = weak.upgrade() {
                        control.flush();
                    }
                });
            }
            None => {}
        }
    }

    fn flush(self: &Rc<Self>) {
        self.guard.settle();
        let queued = match &mut *self.state.borrow_mut() {
            State::Open(open) if open.subscriber.is_some() => open.queued.take(),
            _ => None,
        };
        if let Some(delivery) = queued {
            self.hand_over(delivery);
        }
    }

    /// Runs the subscriber with `delivery`, then with anything delivered
    /// while it ran. A closing delivery moves the channel to done before the
    /// subscriber sees it.
    fn hand_over(&self, delivery: Delivery<T, E>) {
        let mut next = Some(delivery);
        while let Some(delivery) = next.take() {
            let closing = matches!(delivery, Ok(None));
            let mut state = self.state.borrow_mut();
            let State::Open(open) = &mut *state else {
                return;
            };
            let Some(mut subscriber) = open.subscriber.take() else {
                open.queued = Some(delivery);
                return;
            };
            let epoch = open.subscriber_epoch;
            let retired = closing.then(|| mem::replace(&mut *state, State::Done));
            drop(state);
            drop(retired);

            subscriber(delivery);

            if closing {
                return;
            }
            let unused = match &mut *self.state.borrow_mut() {
                State::Open(open) if open.subscriber_epoch == epoch && open.subscriber.is_none() => {
                    open.subscriber = Some(subscriber);
                    if !self.guard.has_pending() {
                        next = open.queued.take();
                    }
                    None
                }
                _ => Some(subscriber),
            };
            drop(unused);
        }
    }

    /// Consumer-side cancellation.
    pub(crate) fn abort(&self) {
        if self.guard.cancel() {
            trace!("deferred stream delivery cancelled");
        }
        let old = mem::replace(&mut *self.state.borrow_mut(), State::Done);
        if let State::Open(Open {
            abort: Some(hook), ..
        }) = old
        {
            hook();
        }
    }
}
