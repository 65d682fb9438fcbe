//! Racing a list of futures.

use super::{Future, channel};
use std::cell::RefCell;
use std::rc::Rc;

/// Settles with the first input to settle, its index and the inputs that are
/// still running.
pub type SelectAll<T, E> = Future<(T, usize, Vec<Future<T, E>>), (E, usize, Vec<Future<T, E>>)>;

/// Succeeds with the first input to succeed and the inputs still running.
pub type SelectOk<T, E> = Future<(T, Vec<Future<T, E>>), E>;

type Racers<T, E> = Rc<RefCell<Vec<Option<Future<T, E>>>>>;

fn enlist<T, E>(futures: Vec<Future<T, E>>) -> Racers<T, E> {
    Rc::new(RefCell::new(futures.into_iter().map(Some).collect()))
}

fn start_all<T: 'static, E: 'static>(racers: &Racers<T, E>) {
    let running: Vec<_> = racers.borrow().iter().flatten().map(Future::handle).collect();
    for future in running {
        future.start();
    }
}

fn abort_all<T: 'static, E: 'static>(racers: &Racers<T, E>) {
    let running: Vec<_> = racers.borrow_mut().iter_mut().filter_map(Option::take).collect();
    for future in running {
        future.abort();
    }
}

/// Detaches and returns every input still in the race.
fn remaining<T: 'static, E: 'static>(racers: &Racers<T, E>) -> Vec<Future<T, E>> {
    let rest: Vec<_> = racers.borrow_mut().iter_mut().filter_map(Option::take).collect();
    for future in &rest {
        future.unend();
    }
    rest
}

/// Starts every future and settles with the first one to settle.
///
/// The other inputs keep running and are handed back, no longer attached to
/// this combinator; aborting the combinator before it settles aborts them
/// all. An empty list never settles.
pub fn select_all<T: 'static, E: 'static>(futures: Vec<Future<T, E>>) -> SelectAll<T, E> {
    let (task, future) = channel();
    let racers = enlist(futures);

    let count = racers.borrow().len();
    for index in 0..count {
        let entry = racers.borrow()[index].as_ref().map(Future::handle);
        let Some(entry) = entry else { continue };
        let weak = Rc::downgrade(&racers);
        let task = task.clone();
        entry.end(move |result| {
            let Some(racers) = weak.upgrade() else {
                return;
            };
            let winner = racers.borrow_mut()[index].take();
            let rest = remaining(&racers);
            drop(winner);
            match result {
                Ok(item) => task.done((item, index, rest)),
                Err(error) => task.fail((error, index, rest)),
            };
        });
    }

    let starter = Rc::clone(&racers);
    task.start(move || start_all(&starter))
        .abort(move || abort_all(&racers));
    future
}

/// Starts every future and succeeds with the first success. Failures drop
/// out of the race; if every input fails, fails with the error of the input
/// that failed last. An empty list never settles.
pub fn select_ok<T: 'static, E: 'static>(futures: Vec<Future<T, E>>) -> SelectOk<T, E> {
    let (task, future) = channel();
    let racers = enlist(futures);

    let count = racers.borrow().len();
    for index in 0..count {
        let entry = racers.borrow()[index].as_ref().map(Future::handle);
        let Some(entry) = entry else { continue };
        let weak = Rc::downgrade(&racers);
        let task = task.clone();
        entry.end(move |result| {
            let Some(racers) = weak.upgrade() else {
                return;
            };
            let settled = racers.borrow_mut()[index].take();
            drop(settled);
            match result {
                Ok(item) => {
                    let rest = remaining(&racers);
                    task.done((item, rest));
                }
                Err(error) => {
                    let exhausted = racers.borrow().iter().all(Option::is_none);
                    if exhausted {
                        task.fail(error);
                    }
                }
            }
        });
    }

    let starter = Rc::clone(&racers);
    task.start(move || start_all(&starter))
        .abort(move || abort_all(&racers));
    future
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::future::{err, never, ok};
    use crate::runtime::Runtime;
    use crate::test_utils::{init_test_logging, settle};
    use crate::time::delay_result;
    use std::cell::Cell;
    use std::time::Duration;

    fn init_test(name: &str) {
        init_test_logging();
        crate::test_phase!(name);
    }

    #[test]
    fn select_all_reports_winner_and_rest() {
        init_test("select_all_reports_winner_and_rest");
        let futures = vec![
            delay_result::<&str, ()>(Duration::from_millis(30), Ok("slow")),
            delay_result(Duration::from_millis(2), Ok("fast")),
            delay_result(Duration::from_millis(10), Ok("middle")),
        ];
        let outcome = settle(select_all(futures)).expect("settles");
        let (item, index, rest) = outcome.expect("success");
        crate::assert_with_log!(item == "fast", "item", "fast", item);
        crate::assert_with_log!(index == 1, "index", 1, index);
        crate::assert_with_log!(rest.len() == 2, "rest", 2, rest.len());

        // The rest keep running and can be raced again.
        let outcome = settle(select_all(rest)).expect("settles");
        let (item, index, rest) = outcome.expect("success");
        crate::assert_with_log!(item == "middle", "item", "middle", item);
        crate::assert_with_log!(index == 1, "index", 1, index);
        crate::assert_with_log!(rest.len() == 1, "rest", 1, rest.len());
        crate::test_complete!("select_all_reports_winner_and_rest");
    }

    #[test]
    fn select_all_reports_first_error() {
        init_test("select_all_reports_first_error");
        let outcome = settle(select_all(vec![never::<u8, &str>(), err("bad")])).expect("settles");
        let Err((error, index, rest)) = outcome else {
            panic!("expected failure");
        };
        crate::assert_with_log!(error == "bad", "error", "bad", error);
        crate::assert_with_log!(index == 1, "index", 1, index);
        crate::assert_with_log!(rest.len() == 1, "rest", 1, rest.len());
        crate::test_complete!("select_all_reports_first_error");
    }

    #[test]
    fn select_all_abort_reaches_every_input() {
        init_test("select_all_abort_reaches_every_input");
        let aborts = Rc::new(Cell::new(0));
        let mut futures = Vec::new();
        for _ in 0..3 {
            let (task, fut) = channel::<u8, ()>();
            let aborts = Rc::clone(&aborts);
            task.abort(move || aborts.set(aborts.get() + 1));
            futures.push(fut);
        }
        let raced = select_all(futures);
        raced.start().abort();
        crate::assert_with_log!(aborts.get() == 3, "aborts", 3, aborts.get());
        crate::test_complete!("select_all_abort_reaches_every_input");
    }

    #[test]
    fn select_all_empty_never_settles() {
        init_test("select_all_empty_never_settles");
        let outcome = Runtime::new().block_on(select_all::<u8, ()>(Vec::new()));
        assert!(outcome.is_err());
        crate::test_complete!("select_all_empty_never_settles");
    }

    #[test]
    fn select_ok_skips_failures() {
        init_test("select_ok_skips_failures");
        let futures = vec![
            err::<u8, &str>("a"),
            delay_result(Duration::from_millis(3), Ok(2)),
            delay_result(Duration::from_millis(50), Ok(3)),
        ];
        let (item, rest) = settle(select_ok(futures)).expect("settles").expect("success");
        crate::assert_with_log!(item == 2, "item", 2, item);
        crate::assert_with_log!(rest.len() == 1, "rest", 1, rest.len());
        crate::test_complete!("select_ok_skips_failures");
    }

    #[test]
    fn select_ok_fails_with_last_error() {
        init_test("select_ok_fails_with_last_error");
        let futures = vec![
            delay_result::<u8, &str>(Duration::from_millis(8), Err("last")),
            err("first"),
            delay_result(Duration::from_millis(2), Err("second")),
        ];
        let outcome = settle(select_ok(futures)).expect("settles");
        let Err(error) = outcome else {
            panic!("expected failure");
        };
        crate::assert_with_log!(error == "last", "error", "last", error);
        crate::test_complete!("select_ok_fails_with_last_error");
    }

    #[test]
    fn select_ok_single_success() {
        init_test("select_ok_single_success");
        let (item, rest) = settle(select_ok(vec![ok::<u8, ()>(1)])).expect("settles").expect("success");
        crate::assert_with_log!(item == 1 && rest.is_empty(), "outcome", (1, 0), (item, rest.len()));
        crate::test_complete!("select_ok_single_success");
    }
}
