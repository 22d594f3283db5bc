//! Identity contracts and equality strategies used to match elements.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::difference::Difference;

/// An entity that can be matched across snapshots and then diffed.
///
/// [`is_same`](Self::is_same) answers "are these two instances before/after
/// of the same logical element", which is narrower than full equality.
/// [`diff_hash_code`](Self::diff_hash_code) must agree with it: `a.is_same(b)`
/// implies `a.diff_hash_code() == b.diff_hash_code()`.
pub trait DiffCapable {
    /// The structural delta produced by [`difference`](Self::difference).
    type Diff<'a>: Difference
    where
        Self: 'a;

    /// Returns `true` if `other` is the same logical element as `self`.
    fn is_same(&self, other: &Self) -> bool;

    /// Hash consistent with [`is_same`](Self::is_same).
    fn diff_hash_code(&self) -> i32;

    /// Computes what changed from `past` to `self`.
    ///
    /// Only meaningful when `self.is_same(past)` holds.
    fn difference<'a>(&'a self, past: &'a Self) -> Self::Diff<'a>;
}

/// Hashing and equality used to build lookup sets over `T`.
pub trait EqualityStrategy<T: ?Sized> {
    /// Feeds the strategy's hash of `value` into `state`.
    fn hash<H: Hasher>(value: &T, state: &mut H);

    /// Returns `true` if `a` and `b` are equal under this strategy.
    fn equals(a: &T, b: &T) -> bool;
}

/// Natural value equality via [`Hash`] and [`Eq`].
pub enum NaturalEquality {}

impl<T: Hash + Eq + ?Sized> EqualityStrategy<T> for NaturalEquality {
    fn hash<H: Hasher>(value: &T, state: &mut H) {
        value.hash(state);
    }

    fn equals(a: &T, b: &T) -> bool {
        a == b
    }
}

/// Identity equality via [`DiffCapable`].
pub enum IdentityEquality {}

impl<T: DiffCapable + ?Sized> EqualityStrategy<T> for IdentityEquality {
    fn hash<H: Hasher>(value: &T, state: &mut H) {
        state.write_i32(value.diff_hash_code());
    }

    fn equals(a: &T, b: &T) -> bool {
        a.is_same(b)
    }
}

/// A borrowed value whose [`Hash`] and [`Eq`] come from strategy `S`.
///
/// Lets the standard-shaped `IndexSet`/`IndexMap` containers key elements by
/// a custom equality without touching the element type's own impls.
pub struct Keyed<'a, T: ?Sized, S> {
    value: &'a T,
    _strategy: PhantomData<fn() -> S>,
}

impl<'a, T: ?Sized, S> Keyed<'a, T, S> {
    /// Wraps `value`.
    pub fn new(value: &'a T) -> Self {
        Self {
            value,
            _strategy: PhantomData,
        }
    }

    /// Returns the wrapped value.
    pub fn get(&self) -> &'a T {
        self.value
    }
}

impl<T: ?Sized, S> Clone for Keyed<'_, T, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized, S> Copy for Keyed<'_, T, S> {}

impl<T: ?Sized, S: EqualityStrategy<T>> Hash for Keyed<'_, T, S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        S::hash(self.value, state);
    }
}

impl<T: ?Sized, S: EqualityStrategy<T>> PartialEq for Keyed<'_, T, S> {
    fn eq(&self, other: &Self) -> bool {
        S::equals(self.value, other.value)
    }
}

impl<T: ?Sized, S: EqualityStrategy<T>> Eq for Keyed<'_, T, S> {}

impl<T: fmt::Debug + ?Sized, S> fmt::Debug for Keyed<'_, T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Keyed").field(&self.value).finish()
    }
}
