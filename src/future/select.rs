//! Racing two futures.

use super::{Future, channel};
use crate::either::Either;

impl<T: 'static, E: 'static> Future<T, E> {
    /// Starts both futures; the first to settle wins and the other is
    /// aborted. When both settle in the same turn, `self` wins.
    pub fn select(self, other: Self) -> Self {
        let (task, future) = channel();
        let (left_task, right_task) = (task.clone(), task.clone());
        let (left, right) = (self.downgrade(), other.downgrade());
        self.end(move |result| {
            right.abort();
            left_task.end(result);
        });
        other.end(move |result| {
            left.abort();
            right_task.end(result);
        });
        let (first, second) = (self.handle(), other.handle());
        task.start(move || {
            first.start();
            second.start();
        })
        .abort(move || {
            self.abort();
            other.abort();
        });
        future
    }

    /// Like [`select`](Self::select) for futures of different types; the
    /// outcome is tagged `Either::A` when `self` won and `Either::B` when
    /// `other` won.
    pub fn select_either<U, G>(self, other: Future<U, G>) -> Future<Either<T, U>, Either<E, G>>
    where
        U: 'static,
        G: 'static,
    {
        let (task, future) = channel();
        let (left_task, right_task) = (task.clone(), task.clone());
        let (left, right) = (self.downgrade(), other.downgrade());
        self.end(move |result| {
            right.abort();
            left_task.end(result.map(Either::A).map_err(Either::A));
        });
        other.end(move |result| {
            left.abort();
            right_task.end(result.map(Either::B).map_err(Either::B));
        });
        let (first, second) = (self.handle(), other.handle());
        task.start(move || {
            first.start();
            second.start();
        })
        .abort(move || {
            self.abort();
            other.abort();
        });
        future
    }
}

#[cfg(test)]
mod tests {
    use crate::either::Either;
    use crate::future::{channel, err, never, ok};
    use crate::test_utils::{init_test_logging, settle};
    use crate::time::delay_result;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    fn init_test(name: &str) {
        init_test_logging();
        crate::test_phase!(name);
    }

    #[test]
    fn earlier_success_beats_later_failure() {
        init_test("earlier_success_beats_later_failure");
        let aborts = Rc::new(Cell::new(0_u32));
        let (task, slow) = channel::<bool, &str>();
        let counter = Rc::clone(&aborts);
        task.start(|| {}).abort(move || counter.set(counter.get() + 1));

        let fast = delay_result(Duration::from_millis(1), Ok(false));
        let outcome = settle(fast.select(slow));
        crate::runtime::Runtime::new().run_until_idle();
        crate::assert_with_log!(outcome == Some(Ok(false)), "outcome", Some(Ok::<_, &str>(false)), outcome);
        crate::assert_with_log!(aborts.get() == 1, "loser aborts", 1, aborts.get());
        crate::test_complete!("earlier_success_beats_later_failure");
    }

    #[test]
    fn earlier_timer_wins() {
        init_test("earlier_timer_wins");
        let fast = delay_result::<&str, ()>(Duration::from_millis(10), Ok("fast"));
        let slow = delay_result::<&str, ()>(Duration::from_millis(11), Ok("slow"));
        let outcome = settle(slow.select(fast));
        crate::assert_with_log!(outcome == Some(Ok("fast")), "winner", Some(Ok::<&str, ()>("fast")), outcome);
        crate::test_complete!("earlier_timer_wins");
    }

    #[test]
    fn same_turn_tie_goes_to_self() {
        init_test("same_turn_tie_goes_to_self");
        let outcome = settle(ok::<u8, ()>(1).select(ok(2)));
        crate::assert_with_log!(outcome == Some(Ok(1)), "tie", Some(Ok::<u8, ()>(1)), outcome);
        crate::test_complete!("same_turn_tie_goes_to_self");
    }

    #[test]
    fn loser_is_aborted() {
        init_test("loser_is_aborted");
        let (task, loser) = channel::<u8, &str>();
        let aborted = Rc::new(Cell::new(false));
        let flag = Rc::clone(&aborted);
        task.abort(move || flag.set(true));

        let outcome = settle(err::<u8, &str>("first").select(loser));
        crate::assert_with_log!(outcome == Some(Err("first")), "error wins", Some(Err::<u8, &str>("first")), outcome);
        crate::assert_with_log!(aborted.get(), "loser aborted", true, aborted.get());
        crate::test_complete!("loser_is_aborted");
    }

    #[test]
    fn abort_reaches_both_sides() {
        init_test("abort_reaches_both_sides");
        let aborts = Rc::new(Cell::new(0));
        let (left_task, left) = channel::<u8, ()>();
        let (right_task, right) = channel::<u8, ()>();
        for task in [&left_task, &right_task] {
            let aborts = Rc::clone(&aborts);
            task.abort(move || aborts.set(aborts.get() + 1));
        }
        let raced = left.select(right);
        raced.start().abort();
        crate::assert_with_log!(aborts.get() == 2, "aborts", 2, aborts.get());
        crate::test_complete!("abort_reaches_both_sides");
    }

    #[test]
    fn select_either_tags_sides() {
        init_test("select_either_tags_sides");
        let outcome = settle(never::<u8, ()>().select_either(ok::<&str, bool>("b")));
        crate::assert_with_log!(outcome == Some(Ok(Either::B("b"))), "b wins", Some(Ok::<_, Either<(), bool>>(Either::<u8, _>::B("b"))), outcome);

        let outcome = settle(err::<u8, ()>(()).select_either(never::<&str, bool>()));
        crate::assert_with_log!(outcome == Some(Err(Either::A(()))), "a fails", Some(Err::<Either<u8, &str>, _>(Either::<(), bool>::A(()))), outcome);
        crate::test_complete!("select_either_tags_sides");
    }
}
