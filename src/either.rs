//! A closed two-variant sum type.
//!
//! [`Either`] is the symmetric counterpart of [`Result`]: neither side is
//! privileged, so every accessor exists once for `A` and once for `B`. The
//! engine uses it to tag which branch of a [`select_either`] won and as the
//! step outcome of [`loop_fn`].
//!
//! [`select_either`]: crate::future::Future::select_either
//! [`loop_fn`]: crate::future::loop_fn

use core::fmt;

/// A value that is either an `A` or a `B`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Either<A, B> {
    /// The left-hand variant.
    A(A),
    /// The right-hand variant.
    B(B),
}

impl<A, B> Either<A, B> {
    /// Returns true if this is the `A` variant.
    #[must_use]
    pub const fn is_a(&self) -> bool {
        matches!(self, Self::A(_))
    }

    /// Returns true if this is the `B` variant.
    #[must_use]
    pub const fn is_b(&self) -> bool {
        matches!(self, Self::B(_))
    }

    /// Converts into the `A` value, if any.
    pub fn a(self) -> Option<A> {
        match self {
            Self::A(a) => Some(a),
            Self::B(_) => None,
        }
    }

    /// Converts into the `B` value, if any.
    pub fn b(self) -> Option<B> {
        match self {
            Self::A(_) => None,
            Self::B(b) => Some(b),
        }
    }

    /// Returns `Ok(a)` for the `A` variant and `Err(err)` otherwise.
    pub fn a_or<E>(self, err: E) -> Result<A, E> {
        match self {
            Self::A(a) => Ok(a),
            Self::B(_) => Err(err),
        }
    }

    /// Returns `Ok(a)` for the `A` variant and builds the error from `B`
    /// otherwise.
    pub fn a_or_else<E, F: FnOnce(B) -> E>(self, f: F) -> Result<A, E> {
        match self {
            Self::A(a) => Ok(a),
            Self::B(b) => Err(f(b)),
        }
    }

    /// Returns `Ok(b)` for the `B` variant and `Err(err)` otherwise.
    pub fn b_or<E>(self, err: E) -> Result<B, E> {
        match self {
            Self::A(_) => Err(err),
            Self::B(b) => Ok(b),
        }
    }

    /// Returns `Ok(b)` for the `B` variant and builds the error from `A`
    /// otherwise.
    pub fn b_or_else<E, F: FnOnce(A) -> E>(self, f: F) -> Result<B, E> {
        match self {
            Self::A(a) => Err(f(a)),
            Self::B(b) => Ok(b),
        }
    }

    /// Maps the `A` value, leaving `B` untouched.
    pub fn map_a<C, F: FnOnce(A) -> C>(self, f: F) -> Either<C, B> {
        match self {
            Self::A(a) => Either::A(f(a)),
            Self::B(b) => Either::B(b),
        }
    }

    /// Maps the `B` value, leaving `A` untouched.
    pub fn map_b<C, F: FnOnce(B) -> C>(self, f: F) -> Either<A, C> {
        match self {
            Self::A(a) => Either::A(a),
            Self::B(b) => Either::B(f(b)),
        }
    }

    /// Applies `f` to an `A` value or returns `default`.
    pub fn map_a_or<T, F: FnOnce(A) -> T>(self, default: T, f: F) -> T {
        match self {
            Self::A(a) => f(a),
            Self::B(_) => default,
        }
    }

    /// Applies `f` to an `A` value or `default` to the `B` value.
    pub fn map_a_or_else<T, D, F>(self, default: D, f: F) -> T
    where
        D: FnOnce(B) -> T,
        F: FnOnce(A) -> T,
    {
        match self {
            Self::A(a) => f(a),
            Self::B(b) => default(b),
        }
    }

    /// Applies `f` to a `B` value or returns `default`.
    pub fn map_b_or<T, F: FnOnce(B) -> T>(self, default: T, f: F) -> T {
        match self {
            Self::A(_) => default,
            Self::B(b) => f(b),
        }
    }

    /// Applies `f` to a `B` value or `default` to the `A` value.
    pub fn map_b_or_else<T, D, F>(self, default: D, f: F) -> T
    where
        D: FnOnce(A) -> T,
        F: FnOnce(B) -> T,
    {
        match self {
            Self::A(a) => default(a),
            Self::B(b) => f(b),
        }
    }

    /// Folds both variants into one value.
    pub fn either<T, FA, FB>(self, fa: FA, fb: FB) -> T
    where
        FA: FnOnce(A) -> T,
        FB: FnOnce(B) -> T,
    {
        match self {
            Self::A(a) => fa(a),
            Self::B(b) => fb(b),
        }
    }

    /// Returns the `A` value.
    ///
    /// # Panics
    ///
    /// Panics if this is the `B` variant.
    #[track_caller]
    pub fn unwrap_a(self) -> A
    where
        B: fmt::Debug,
    {
        match self {
            Self::A(a) => a,
            Self::B(b) => panic!("called `Either::unwrap_a()` on a `B` value: {b:?}"),
        }
    }

    /// Returns the `A` value or `default`.
    pub fn unwrap_a_or(self, default: A) -> A {
        self.a().unwrap_or(default)
    }

    /// Returns the `A` value or converts the `B` value with `f`.
    pub fn unwrap_a_or_else<F: FnOnce(B) -> A>(self, f: F) -> A {
        match self {
            Self::A(a) => a,
            Self::B(b) => f(b),
        }
    }

    /// Returns the `B` value.
    ///
    /// # Panics
    ///
    /// Panics if this is the `A` variant.
    #[track_caller]
    pub fn unwrap_b(self) -> B
    where
        A: fmt::Debug,
    {
        match self {
            Self::A(a) => panic!("called `Either::unwrap_b()` on an `A` value: {a:?}"),
            Self::B(b) => b,
        }
    }

    /// Returns the `B` value or `default`.
    pub fn unwrap_b_or(self, default: B) -> B {
        self.b().unwrap_or(default)
    }

    /// Returns the `B` value or converts the `A` value with `f`.
    pub fn unwrap_b_or_else<F: FnOnce(A) -> B>(self, f: F) -> B {
        match self {
            Self::A(a) => f(a),
            Self::B(b) => b,
        }
    }

    /// Exchanges the two sides.
    pub fn swap(self) -> Either<B, A> {
        match self {
            Self::A(a) => Either::B(a),
            Self::B(b) => Either::A(b),
        }
    }

    /// Borrows the contained value.
    pub const fn as_ref(&self) -> Either<&A, &B> {
        match self {
            Self::A(a) => Either::A(a),
            Self::B(b) => Either::B(b),
        }
    }
}

impl<T> Either<T, T> {
    /// Returns the value regardless of side.
    pub fn into_inner(self) -> T {
        match self {
            Self::A(v) | Self::B(v) => v,
        }
    }
}

impl<A: fmt::Display, B: fmt::Display> fmt::Display for Either<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A(a) => a.fmt(f),
            Self::B(b) => b.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_are_symmetric() {
        let a: Either<u8, &str> = Either::A(1);
        let b: Either<u8, &str> = Either::B("x");

        assert!(a.is_a() && !a.is_b());
        assert!(b.is_b() && !b.is_a());
        assert_eq!(a.a(), Some(1));
        assert_eq!(a.b(), None);
        assert_eq!(b.b(), Some("x"));
        assert_eq!(b.a(), None);
        assert_eq!(a.a_or("no"), Ok(1));
        assert_eq!(b.a_or("no"), Err("no"));
        assert_eq!(b.b_or(0), Ok("x"));
        assert_eq!(a.b_or_else(u32::from), Err(1u32));
    }

    #[test]
    fn map_touches_one_side_only() {
        let a: Either<i32, i32> = Either::A(2);
        assert_eq!(a.map_a(|v| v * 10), Either::A(20));
        assert_eq!(a.map_b(|v| v * 10), Either::A(2));
        assert_eq!(a.map_a_or(0, |v| v + 1), 3);
        assert_eq!(a.map_b_or(0, |v| v + 1), 0);
        assert_eq!(a.map_b_or_else(|v| -v, |v| v), -2);
    }

    #[test]
    fn swap_and_fold() {
        let a: Either<&str, u8> = Either::A("left");
        assert_eq!(a.swap(), Either::B("left"));
        assert_eq!(a.swap().swap(), a);
        assert_eq!(a.either(str::len, usize::from), 4);
        assert_eq!(Either::<u8, u8>::B(7).into_inner(), 7);
    }

    #[test]
    fn unwrap_variants() {
        assert_eq!(Either::<u8, u8>::A(1).unwrap_a(), 1);
        assert_eq!(Either::<u8, u8>::A(1).unwrap_b_or(9), 9);
        assert_eq!(Either::<u8, u8>::B(3).unwrap_a_or_else(|b| b * 2), 6);
    }

    #[test]
    #[should_panic(expected = "unwrap_b")]
    fn unwrap_wrong_side_panics() {
        let _ = Either::<u8, u8>::A(1).unwrap_b();
    }

    #[test]
    fn std_option_result_round_trips() {
        assert_eq!(Some(5).ok_or("e"), Ok(5));
        assert_eq!(None::<i32>.ok_or("e"), Err("e"));
        assert_eq!(Some(5).map(core::convert::identity), Some(5));
        assert_eq!(Ok::<i32, &str>(5).map(core::convert::identity), Ok(5));
        assert_eq!(Err::<i32, &str>("e").map(core::convert::identity), Err("e"));
    }
}
