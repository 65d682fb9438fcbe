//! Fair merge of two streams.

use super::{Delivery, Sink, Stream, WeakStream, channel};
use std::cell::RefCell;
use std::mem;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

impl Side {
    const fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }

    const fn other(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

struct Merge<T, E> {
    /// One buffered item per side.
    slots: [Option<T>; 2],
    ended: [bool; 2],
    /// An error waiting for the next downstream request.
    failure: Option<E>,
    /// Downstream asked and nothing was buffered.
    wanted: bool,
    /// Side whose buffered item goes first on the next request.
    prefer: Side,
}

type Shared<T, E> = Rc<RefCell<Merge<T, E>>>;

impl<T: 'static, E: 'static> Stream<T, E> {
    /// Interleaves `self` and `other`, taking items from each side in turn
    /// when both have one ready.
    ///
    /// An error from either side aborts both and ends the merged stream
    /// after it is delivered. The merged stream ends once both sides ended.
    pub fn select(self, other: Self) -> Self {
        let (sink, stream) = channel();
        let merge: Shared<T, E> = Rc::new(RefCell::new(Merge {
            slots: [None, None],
            ended: [false, false],
            failure: None,
            wanted: false,
            prefer: Side::Left,
        }));

        let weak = [self.downgrade(), other.downgrade()];
        listen(&self, Side::Left, &merge, &sink, weak.clone());
        listen(&other, Side::Right, &merge, &sink, weak);

        let sides = [self.handle(), other.handle()];
        let producer = sink.clone();
        sink.start(move || request(&merge, &producer, &sides))
            .abort(move || {
                self.abort();
                other.abort();
            });
        stream
    }
}

fn listen<T: 'static, E: 'static>(
    side_stream: &Stream<T, E>,
    side: Side,
    merge: &Shared<T, E>,
    sink: &Sink<T, E>,
    sides: [WeakStream<T, E>; 2],
) {
    let (merge, sink) = (Rc::clone(merge), sink.clone());
    side_stream.end(move |delivery: Delivery<T, E>| {
        let mut state = merge.borrow_mut();
        match delivery {
            Ok(Some(item)) => {
                if state.wanted {
                    state.wanted = false;
                    state.prefer = side.other();
                    drop(state);
                    sink.send(item);
                } else {
                    state.slots[side.index()] = Some(item);
                }
            }
            Ok(None) => {
                state.ended[side.index()] = true;
                let finished = state.wanted && state.ended == [true, true];
                if finished {
                    state.wanted = false;
                }
                drop(state);
                if finished {
                    sink.done();
                }
            }
            Err(error) => {
                state.ended = [true, true];
                let dropped = mem::take(&mut state.slots);
                let immediate = if mem::take(&mut state.wanted) {
                    Some(error)
                } else {
                    state.failure = Some(error);
                    None
                };
                drop(state);
                drop(dropped);
                for stream in &sides {
                    stream.abort();
                }
                if let Some(error) = immediate {
                    sink.fail_terminal(error);
                }
            }
        }
    });
}

fn request<T: 'static, E: 'static>(
    merge: &Shared<T, E>,
    sink: &Sink<T, E>,
    sides: &[Stream<T, E>; 2],
) {
    let mut state = merge.borrow_mut();
    if let Some(error) = state.failure.take() {
        drop(state);
        sink.fail_terminal(error);
        return;
    }
    let first = state.prefer;
    let taken = [first, first.other()]
        .into_iter()
        .find_map(|side| state.slots[side.index()].take().map(|item| (side, item)));
    let idle: Vec<Side> = [Side::Left, Side::Right]
        .into_iter()
        .filter(|side| !state.ended[side.index()] && state.slots[side.index()].is_none())
        .collect();

    match taken {
        Some((side, item)) => {
            state.wanted = false;
            state.prefer = side.other();
            drop(state);
            sink.send(item);
        }
        None if state.ended == [true, true] => {
            state.wanted = false;
            drop(state);
            sink.done();
            return;
        }
        None => {
            state.wanted = true;
            drop(state);
        }
    }
    for side in idle {
        sides[side.index()].start();
    }
}
