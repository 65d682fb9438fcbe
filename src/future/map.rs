//! Result-transforming combinators.

use super::Future;

impl<T: 'static, E: 'static> Future<T, E> {
    /// Transforms the success value.
    pub fn map<U, F>(self, f: F) -> Future<U, E>
    where
        U: 'static,
        F: FnOnce(T) -> U + 'static,
    {
        self.chain_with(move |result, task| {
            task.end(result.map(f));
        })
    }

    /// Transforms the error value.
    pub fn map_err<G, F>(self, f: F) -> Future<T, G>
    where
        G: 'static,
        F: FnOnce(E) -> G + 'static,
    {
        self.chain_with(move |result, task| {
            task.end(result.map_err(f));
        })
    }

    /// Observes the result without changing it.
    pub fn inspect<F>(self, f: F) -> Self
    where
        F: FnOnce(&Result<T, E>) + 'static,
    {
        self.chain_with(move |result, task| {
            f(&result);
            task.end(result);
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
    fn map_transforms_success_only() {
        init_test("map_transforms_success_only");
        let mapped = settle(ok::<u32, &str>(4).map(|n| n * 10));
        crate::assert_with_log!(mapped == Some(Ok(40)), "ok", Some(Ok::<u32, &str>(40)), mapped);
        let untouched = settle(err::<u32, &str>("bad").map(|n| n * 10));
        crate::assert_with_log!(untouched == Some(Err("bad")), "err", Some(Err::<u32, &str>("bad")), untouched);
        crate::test_complete!("map_transforms_success_only");
    }

    #[test]
    fn map_err_transforms_failure_only() {
        init_test("map_err_transforms_failure_only");
        let mapped = settle(err::<u32, &str>("bad").map_err(str::len));
        crate::assert_with_log!(mapped == Some(Err(3)), "err", Some(Err::<u32, usize>(3)), mapped);
        let untouched = settle(ok::<u32, &str>(1).map_err(str::len));
        crate::assert_with_log!(untouched == Some(Ok(1)), "ok", Some(Ok::<u32, usize>(1)), untouched);
        crate::test_complete!("map_err_transforms_failure_only");
    }

    #[test]
    fn inspect_sees_result() {
        init_test("inspect_sees_result");
        let seen = Rc::new(Cell::new(None));
        let out = Rc::clone(&seen);
        let outcome = settle(ok::<u8, ()>(2).inspect(move |r| out.set(Some(*r))));
        crate::assert_with_log!(seen.get() == Some(Ok(2)), "seen", Some(Ok::<u8, ()>(2)), seen.get());
        crate::assert_with_log!(outcome == Some(Ok(2)), "outcome", Some(Ok::<u8, ()>(2)), outcome);
        crate::test_complete!("inspect_sees_result");
    }

    #[test]
    fn start_and_abort_propagate_upstream() {
        init_test("start_and_abort_propagate_upstream");
        let (task, fut) = channel::<u8, ()>();
        let (starts, aborts) = (Rc::new(Cell::new(0)), Rc::new(Cell::new(0)));
        let (s, a) = (Rc::clone(&starts), Rc::clone(&aborts));
        task.start(move || s.set(s.get() + 1));
        task.abort(move || a.set(a.get() + 1));

        let mapped = fut.map(|n| n + 1).map_err(|()| 0_u8);
        crate::assert_with_log!(starts.get() == 0, "lazy", 0, starts.get());
        mapped.start();
        crate::assert_with_log!(starts.get() == 1, "started", 1, starts.get());
        mapped.abort();
        crate::assert_with_log!(aborts.get() == 1, "aborted", 1, aborts.get());
        assert!(task.is_closed());
        crate::test_complete!("start_and_abort_propagate_upstream");
    }
}
