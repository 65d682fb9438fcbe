//! Waiting for several futures.

use super::{Future, channel, ok};
use std::cell::RefCell;
use std::rc::Rc;

impl<T: 'static, E: 'static> Future<T, E> {
    /// Runs both futures and succeeds with both values. The first failure
    /// aborts the other side and fails the join at once.
    pub fn join<U: 'static>(self, other: Future<U, E>) -> Future<(T, U), E> {
        let (task, future) = channel();
        let slots: Rc<RefCell<(Option<T>, Option<U>)>> = Rc::default();
        let (left_task, right_task) = (task.clone(), task.clone());
        let (left, right) = (self.downgrade(), other.downgrade());

        let left_slots = Rc::clone(&slots);
        self.end(move |result| match result {
            Ok(a) => {
                let b = left_slots.borrow_mut().1.take();
                match b {
                    Some(b) => {
                        left_task.done((a, b));
                    }
                    None => left_slots.borrow_mut().0 = Some(a),
                }
            }
            Err(error) => {
                right.abort();
                left_task.fail(error);
            }
        });
        other.end(move |result| match result {
            Ok(b) => {
                let a = slots.borrow_mut().0.take();
                match a {
                    Some(a) => {
                        right_task.done((a, b));
                    }
                    None => slots.borrow_mut().1 = Some(b),
                }
            }
            Err(error) => {
                left.abort();
                right_task.fail(error);
            }
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

/// Runs every future and succeeds with all values in input order. An empty
/// list succeeds with an empty vector once started.
pub fn join_all<T: 'static, E: 'static>(futures: Vec<Future<T, E>>) -> Future<Vec<T>, E> {
    let mut futures = futures.into_iter();
    let Some(first) = futures.next() else {
        return ok(Vec::new());
    };
    futures.fold(first.map(|item| vec![item]), |joined, next| {
        joined.join(next).map(|(mut items, item)| {
            items.push(item);
            items
        })
    })
}
