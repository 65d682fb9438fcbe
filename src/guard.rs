//! Reentrancy guard for producer start hooks.
//!
//! A producer may deliver synchronously from inside its own start hook (an
//! already-known value, an iterator source). If that delivery ran the
//! consumer's callback inline, and the callback immediately requested the
//! next item, every item of a long stream would add stack frames. The guard
//! marks the window in which a start hook is on the stack; deliveries that
//! happen inside it are pushed to the runtime queue instead, keeping the
//! stack depth constant.

use crate::runtime::{self, DeferToken};
use std::cell::Cell;

/// Tracks whether a start hook is executing and owns the token of at most
/// one deferred delivery.
#[derive(Debug, Default)]
pub(crate) struct ReentrancyGuard {
    executing: Cell<bool>,
    pending: Cell<Option<DeferToken>>,
}

/// Clears the executing marker when dropped.
#[must_use]
pub(crate) struct Entered<'a> {
    guard: &'a ReentrancyGuard,
    was_executing: bool,
}

impl Drop for Entered<'_> {
    fn drop(&mut self) {
        self.guard.executing.set(self.was_executing);
    }
}

impl ReentrancyGuard {
    pub(crate) const fn new() -> Self {
        Self {
            executing: Cell::new(false),
            pending: Cell::new(None),
        }
    }

    /// Marks a start hook as executing until the returned value drops.
    pub(crate) fn enter(&self) -> Entered<'_> {
        let was_executing = self.executing.replace(true);
        Entered {
            guard: self,
            was_executing,
        }
    }

    pub(crate) fn is_executing(&self) -> bool {
        self.executing.get()
    }

    /// Returns true while a deferred delivery is queued.
    pub(crate) fn has_pending(&self) -> bool {
        let pending = self.pending.get();
        pending.is_some()
    }

    /// Queues `deliver` for the next runtime turn and remembers its token.
    pub(crate) fn defer(&self, deliver: impl FnOnce() + 'static) {
        let token = runtime::defer(deliver);
        if let Some(stale) = self.pending.replace(Some(token)) {
            runtime::cancel(stale);
        }
    }

    /// Forgets the pending token. Called by the deferred delivery itself.
    pub(crate) fn settle(&self) {
        self.pending.set(None);
    }

    /// Cancels the pending delivery, if any. Returns true if one was queued.
    pub(crate) fn cancel(&self) -> bool {
        self.pending.take().is_some_and(runtime::cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Runtime;
    use std::rc::Rc;

    #[test]
    fn enter_marks_and_restores() {
        let guard = ReentrancyGuard::new();
        assert!(!guard.is_executing());
        {
            let _outer = guard.enter();
            assert!(guard.is_executing());
            {
                let _inner = guard.enter();
                assert!(guard.is_executing());
            }
            assert!(guard.is_executing());
        }
        assert!(!guard.is_executing());
    }

    #[test]
    fn deferred_delivery_runs_next_turn() {
        let guard = Rc::new(ReentrancyGuard::new());
        let ran = Rc::new(Cell::new(false));
        let (flag, owner) = (Rc::clone(&ran), Rc::clone(&guard));
        guard.defer(move || {
            owner.settle();
            flag.set(true);
        });
        assert!(guard.has_pending());
        assert!(!ran.get());

        Runtime::new().run_until_idle();
        assert!(ran.get());
        assert!(!guard.has_pending());
        assert!(!guard.cancel());
    }

    #[test]
    fn cancel_drops_deferred_delivery() {
        let guard = ReentrancyGuard::new();
        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        guard.defer(move || flag.set(true));

        assert!(guard.cancel());
        Runtime::new().run_until_idle();
        assert!(!ran.get());
    }
}
