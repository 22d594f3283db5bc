//! Added/removed/changed computation over two collections.
//!
//! Both flavors share the same partitioning: each side is indexed by the
//! flavor's equality strategy, duplicates collapse to one representative,
//! and iteration follows first-seen order of the source slice.
//!
//! - [`presence_diff`] compares bare presence using natural equality.
//! - [`deep_diff`] matches by [`DiffCapable`] identity and diffs matched pairs.

use std::convert::Infallible;
use std::hash::Hash;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;

use crate::difference::{Change, Difference, Elements, Specifier};
use crate::strategy::{DiffCapable, EqualityStrategy, IdentityEquality, Keyed, NaturalEquality};

/// Both sides indexed by strategy `S`.
///
/// On each side a key keeps its first occurrence's position and maps to the
/// last occurrence, so both sides pick the same representative and matching
/// is deterministic for a given input order.
struct Partition<'a, T, S> {
    past: IndexMap<Keyed<'a, T, S>, &'a T>,
    now: IndexMap<Keyed<'a, T, S>, &'a T>,
}

impl<'a, T, S: EqualityStrategy<T>> Partition<'a, T, S> {
    fn build(past: &'a [T], now: &'a [T]) -> Self {
        Self {
            past: Self::index(past),
            now: Self::index(now),
        }
    }

    fn index(values: &'a [T]) -> IndexMap<Keyed<'a, T, S>, &'a T> {
        let mut lookup = IndexMap::with_capacity(values.len());
        for value in values {
            lookup.insert(Keyed::new(value), value);
        }
        lookup
    }

    fn added(&self) -> impl Iterator<Item = &'a T> + '_ {
        self.now
            .iter()
            .filter(move |(key, _)| !self.past.contains_key(*key))
            .map(|(_, value)| *value)
    }

    fn removed(&self) -> impl Iterator<Item = &'a T> + '_ {
        self.past
            .iter()
            .filter(move |(key, _)| !self.now.contains_key(*key))
            .map(|(_, value)| *value)
    }

    /// `(before, after)` pairs in past order.
    fn matched(&self) -> impl Iterator<Item = (&'a T, &'a T)> + '_ {
        self.past
            .iter()
            .filter_map(move |(key, before)| self.now.get(key).map(|after| (*before, *after)))
    }

    fn same_elements(&self) -> bool {
        self.past.len() == self.now.len() && self.past.keys().all(|key| self.now.contains_key(key))
    }
}

enum Shape<'a, T, S> {
    Empty,
    Added(&'a [T]),
    Removed(&'a [T]),
    Both(Partition<'a, T, S>),
}

impl<'a, T, S: EqualityStrategy<T>> Shape<'a, T, S> {
    fn new(past: &'a [T], now: &'a [T]) -> Self {
        match (past.is_empty(), now.is_empty()) {
            (true, true) => Shape::Empty,
            (true, false) => Shape::Added(now),
            (false, true) => Shape::Removed(past),
            (false, false) => Shape::Both(Partition::build(past, now)),
        }
    }

    fn added(&self) -> Elements<'_, 'a, T> {
        match self {
            Shape::Added(now) => Box::new(now.iter()),
            Shape::Both(partition) => Box::new(partition.added()),
            Shape::Empty | Shape::Removed(_) => Box::new(std::iter::empty()),
        }
    }

    fn removed(&self) -> Elements<'_, 'a, T> {
        match self {
            Shape::Removed(past) => Box::new(past.iter()),
            Shape::Both(partition) => Box::new(partition.removed()),
            Shape::Empty | Shape::Added(_) => Box::new(std::iter::empty()),
        }
    }
}

/// Presence-only difference between two collections.
///
/// Produced by [`presence_diff`]. Never reports `changed` elements: an
/// element either occurs on a side or it does not.
pub struct PresenceDiff<'a, T> {
    shape: Shape<'a, T, NaturalEquality>,
    unchanged: OnceCell<bool>,
}

impl<'a, T> PresenceDiff<'a, T> {
    /// The canonical empty difference.
    pub const fn empty() -> Self {
        Self {
            shape: Shape::Empty,
            unchanged: OnceCell::new(),
        }
    }
}

impl<'a, T: Hash + Eq> Difference for PresenceDiff<'a, T> {
    fn unchanged(&self) -> bool {
        match &self.shape {
            Shape::Empty => true,
            Shape::Added(_) | Shape::Removed(_) => false,
            Shape::Both(partition) => *self.unchanged.get_or_init(|| partition.same_elements()),
        }
    }
}

impl<'a, T: Hash + Eq + 'a> Specifier<'a, T> for PresenceDiff<'a, T> {
    type Delta = Infallible;

    fn added(&self) -> Elements<'_, 'a, T> {
        self.shape.added()
    }

    fn removed(&self) -> Elements<'_, 'a, T> {
        self.shape.removed()
    }
}

/// Structural difference between two collections of [`DiffCapable`] values.
///
/// Produced by [`deep_diff`]. The `changed` list, and the
/// [`DiffCapable::difference`] calls behind it, are computed once on first
/// access. Concurrent first access may compute it twice; the first stored
/// result wins and both are identical.
pub struct DeepDiff<'a, T: DiffCapable + 'a> {
    shape: Shape<'a, T, IdentityEquality>,
    changed: OnceCell<Vec<Change<'a, T, T::Diff<'a>>>>,
}

impl<'a, T: DiffCapable + 'a> DeepDiff<'a, T> {
    /// The canonical empty difference.
    pub const fn empty() -> Self {
        Self {
            shape: Shape::Empty,
            changed: OnceCell::new(),
        }
    }

    /// `(before, after)` pairs matched by identity, in past order.
    ///
    /// Does not call [`DiffCapable::difference`]; callers that want to diff
    /// pairs on their own schedule start here.
    pub fn matched(&self) -> Box<dyn Iterator<Item = (&'a T, &'a T)> + '_> {
        match &self.shape {
            Shape::Both(partition) => Box::new(partition.matched()),
            Shape::Empty | Shape::Added(_) | Shape::Removed(_) => Box::new(std::iter::empty()),
        }
    }

    fn changes(&self) -> &[Change<'a, T, T::Diff<'a>>] {
        match &self.shape {
            Shape::Both(partition) => self.changed.get_or_init(|| {
                partition
                    .matched()
                    .filter_map(|(before, after)| {
                        let diff = after.difference(before);
                        (!diff.unchanged()).then_some(Change {
                            before,
                            after,
                            diff,
                        })
                    })
                    .collect()
            }),
            Shape::Empty | Shape::Added(_) | Shape::Removed(_) => &[],
        }
    }
}

impl<'a, T: DiffCapable + 'a> Difference for DeepDiff<'a, T> {
    fn unchanged(&self) -> bool {
        match &self.shape {
            Shape::Empty => true,
            Shape::Added(_) | Shape::Removed(_) => false,
            Shape::Both(partition) => {
                partition.added().next().is_none()
                    && partition.removed().next().is_none()
                    && self.changes().is_empty()
            }
        }
    }
}

impl<'a, T: DiffCapable + 'a> Specifier<'a, T> for DeepDiff<'a, T> {
    type Delta = T::Diff<'a>;

    fn added(&self) -> Elements<'_, 'a, T> {
        self.shape.added()
    }

    fn removed(&self) -> Elements<'_, 'a, T> {
        self.shape.removed()
    }

    fn changed(&self) -> &[Change<'a, T, T::Diff<'a>>] {
        self.changes()
    }
}

/// Compares two collections by natural value equality.
pub fn presence_diff<'a, T: Hash + Eq>(past: &'a [T], now: &'a [T]) -> PresenceDiff<'a, T> {
    PresenceDiff {
        shape: Shape::new(past, now),
        unchanged: OnceCell::new(),
    }
}

/// Compares two collections by [`DiffCapable`] identity, diffing matched pairs.
pub fn deep_diff<'a, T: DiffCapable>(past: &'a [T], now: &'a [T]) -> DeepDiff<'a, T> {
    DeepDiff {
        shape: Shape::new(past, now),
        changed: OnceCell::new(),
    }
}
