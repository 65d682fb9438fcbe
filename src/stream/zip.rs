//! Pairing two streams item by item.

use super::{Stream, channel};
use std::cell::RefCell;
use std::mem;
use std::rc::Rc;

type Pair<T, U> = Rc<RefCell<(Option<T>, Option<U>)>>;

impl<T: 'static, E: 'static> Stream<T, E> {
    /// Pairs the items of `self` and `other` in order.
    ///
    /// The zipped stream ends as soon as either side ends, aborting the
    /// other. An error from either side aborts both and ends the stream
    /// after it is delivered.
    pub fn zip<U: 'static>(self, other: Stream<U, E>) -> Stream<(T, U), E> {
        let (sink, stream) = channel();
        let pair: Pair<T, U> = Rc::new(RefCell::new((None, None)));

        let (slots, downstream, rival) = (Rc::clone(&pair), sink.clone(), other.downgrade());
        self.end(move |delivery| match delivery {
            Ok(Some(item)) => {
                let ready = {
                    let mut slots = slots.borrow_mut();
                    slots.0 = Some(item);
                    take_pair(&mut slots)
                };
                if let Some(pair) = ready {
                    downstream.send(pair);
                }
            }
            Ok(None) => {
                rival.abort();
                downstream.done();
            }
            Err(error) => {
                rival.abort();
                downstream.fail_terminal(error);
            }
        });

        let (slots, downstream, rival) = (Rc::clone(&pair), sink.clone(), self.downgrade());
        other.end(move |delivery| match delivery {
            Ok(Some(item)) => {
                let ready = {
                    let mut slots = slots.borrow_mut();
                    slots.1 = Some(item);
                    take_pair(&mut slots)
                };
                if let Some(pair) = ready {
                    downstream.send(pair);
                }
            }
            Ok(None) => {
                rival.abort();
                downstream.done();
            }
            Err(error) => {
                rival.abort();
                downstream.fail_terminal(error);
            }
        });

        let (left, right) = (self.handle(), other.handle());
        sink.start(move || {
            let (need_left, need_right) = {
                let slots = pair.borrow();
                (slots.0.is_none(), slots.1.is_none())
            };
            if need_left {
                left.start();
            }
            if need_right {
                right.start();
            }
        })
        .abort(move || {
            self.abort();
            other.abort();
        });
        stream
    }
}

fn take_pair<T, U>(slots: &mut (Option<T>, Option<U>)) -> Option<(T, U)> {
    if slots.0.is_some() && slots.1.is_some() {
        let (left, right) = mem::take(slots);
        left.zip(right)
    } else {
        None
    }
}
