//! Sequencing combinators: run a second future depending on the first
//! one's outcome.

use super::Future;

impl<T: 'static, E: 'static> Future<T, E> {
    /// Always continues with the future built from the full result.
    pub fn then<U, G, F>(self, f: F) -> Future<U, G>
    where
        U: 'static,
        G: 'static,
        F: FnOnce(Result<T, E>) -> Future<U, G> + 'static,
    {
        self.chain_with(move |result, task| task.follow(f(result)))
    }

    /// Continues with `next` after a success. On failure `next` is aborted
    /// without ever being started.
    pub fn and<U: 'static>(self, next: Future<U, E>) -> Future<U, E> {
        self.chain_with(move |result, task| match result {
            Ok(_) => task.follow(next),
            Err(error) => {
                next.abort();
                task.fail(error);
            }
        })
    }

    /// Continues with the future built from the success value.
    pub fn and_then<U, F>(self, f: F) -> Future<U, E>
    where
        U: 'static,
        F: FnOnce(T) -> Future<U, E> + 'static,
    {
        self.chain_with(move |result, task| match result {
            Ok(item) => task.follow(f(item)),
            Err(error) => {
                task.fail(error);
            }
        })
    }

    /// Falls back to `other` after a failure. On success `other` is aborted
    /// without ever being started.
    pub fn or<G: 'static>(self, other: Future<T, G>) -> Future<T, G> {
        self.chain_with(move |result, task| match result {
            Ok(item) => {
                other.abort();
                task.done(item);
            }
            Err(_) => task.follow(other),
        })
    }

    /// Falls back to the future built from the error.
    pub fn or_else<G, F>(self, f: F) -> Future<T, G>
    where
        G: 'static,
        F: FnOnce(E) -> Future<T, G> + 'static,
    {
        self.chain_with(move |result, task| match result {
            Ok(item) => {
                task.done(item);
            }
            Err(error) => task.follow(f(error)),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::future::{channel, err, ok};
    use crate::test_utils::{init_test_logging, settle};
    use std::cell::Cell;
    use std::rc::Rc;

    fn init_test(name: &str) {
        init_test_logging();
        crate::test_phase!(name);
    }

    #[test]
    fn then_sees_both_outcomes() {
        init_test("then_sees_both_outcomes");
        let from_ok = settle(ok::<u8, u8>(1).then(|r| ok::<String, ()>(format!("{r:?}"))));
        crate::assert_with_log!(from_ok == Some(Ok("Ok(1)".to_string())), "ok", "Ok(1)", from_ok);
        let from_err = settle(err::<u8, u8>(2).then(|r| ok::<String, ()>(format!("{r:?}"))));
        crate::assert_with_log!(from_err == Some(Ok("Err(2)".to_string())), "err", "Err(2)", from_err);
        crate::test_complete!("then_sees_both_outcomes");
    }

    #[test]
    fn and_then_short_circuits() {
        init_test("and_then_short_circuits");
        let called = Rc::new(Cell::new(false));
        let flag = Rc::clone(&called);
        let outcome = settle(err::<u8, &str>("stop").and_then(move |n| {
            flag.set(true);
            ok(n + 1)
        }));
        crate::assert_with_log!(outcome == Some(Err("stop")), "outcome", Some(Err::<u8, &str>("stop")), outcome);
        crate::assert_with_log!(!called.get(), "continuation", false, called.get());

        let chained = settle(ok::<u8, &str>(1).and_then(|n| ok(n + 1)).and_then(|n| ok(n * 3)));
        crate::assert_with_log!(chained == Some(Ok(6)), "chained", Some(Ok::<u8, &str>(6)), chained);
        crate::test_complete!("and_then_short_circuits");
    }

    #[test]
    fn and_aborts_unused_second_future() {
        init_test("and_aborts_unused_second_future");
        let (task, second) = channel::<u8, &str>();
        let (started, aborted) = (Rc::new(Cell::new(false)), Rc::new(Cell::new(false)));
        let (s, a) = (Rc::clone(&started), Rc::clone(&aborted));
        task.start(move || s.set(true));
        task.abort(move || a.set(true));

        let outcome = settle(err::<u8, &str>("first").and(second));
        crate::assert_with_log!(outcome == Some(Err("first")), "outcome", Some(Err::<u8, &str>("first")), outcome);
        crate::assert_with_log!(!started.get(), "second started", false, started.get());
        crate::assert_with_log!(aborted.get(), "second aborted", true, aborted.get());

        let outcome = settle(ok::<u8, &str>(1).and(ok(2)));
        crate::assert_with_log!(outcome == Some(Ok(2)), "and ok", Some(Ok::<u8, &str>(2)), outcome);
        crate::test_complete!("and_aborts_unused_second_future");
    }

    #[test]
    fn or_variants_recover_failures() {
        init_test("or_variants_recover_failures");
        let outcome = settle(err::<u8, &str>("x").or(ok::<u8, ()>(7)));
        crate::assert_with_log!(outcome == Some(Ok(7)), "or", Some(Ok::<u8, ()>(7)), outcome);
        let outcome = settle(ok::<u8, &str>(1).or(err::<u8, ()>(())));
        crate::assert_with_log!(outcome == Some(Ok(1)), "or ok", Some(Ok::<u8, ()>(1)), outcome);
        let outcome = settle(err::<u8, &str>("four").or_else(|e| ok::<u8, ()>(u8::try_from(e.len()).unwrap_or(0))));
        crate::assert_with_log!(outcome == Some(Ok(4)), "or_else", Some(Ok::<u8, ()>(4)), outcome);
        crate::test_complete!("or_variants_recover_failures");
    }

    #[test]
    fn abort_reaches_running_continuation() {
        init_test("abort_reaches_running_continuation");
        let (task, inner) = channel::<u8, ()>();
        let aborted = Rc::new(Cell::new(false));
        let flag = Rc::clone(&aborted);
        task.abort(move || flag.set(true));

        let (outer_task, outer) = channel::<u8, ()>();
        let chained = outer.and_then(move |_| inner);
        chained.start();
        outer_task.done(1);
        chained.abort();
        crate::assert_with_log!(aborted.get(), "inner aborted", true, aborted.get());
        crate::test_complete!("abort_reaches_running_continuation");
    }
}
