//! The difference protocol shared by every diffable entity.

use std::convert::Infallible;

/// Anything that can report whether a compared pair is unchanged.
pub trait Difference {
    /// Returns `true` when nothing differs between the compared snapshots.
    fn unchanged(&self) -> bool;
}

impl<D: Difference + ?Sized> Difference for &D {
    fn unchanged(&self) -> bool {
        (**self).unchanged()
    }
}

impl Difference for Infallible {
    fn unchanged(&self) -> bool {
        match *self {}
    }
}

/// One element present in both snapshots whose content differs.
#[derive(Debug, Clone)]
pub struct Change<'a, T, D> {
    /// The element as it was in the past snapshot.
    pub before: &'a T,
    /// The matching element in the present snapshot.
    pub after: &'a T,
    /// What changed between `before` and `after`.
    pub diff: D,
}

/// Boxed iterator over borrowed collection elements.
pub type Elements<'s, 'a, T> = Box<dyn Iterator<Item = &'a T> + 's>;

/// The difference between two collections of `T`.
///
/// Implementations must keep [`Difference::unchanged`] consistent with the
/// three accessors: it returns `true` exactly when `added`, `removed` and
/// `changed` are all empty. Callers rely on it to skip enumeration.
pub trait Specifier<'a, T: 'a>: Difference {
    /// Per-element delta carried by [`changed`](Self::changed).
    type Delta;

    /// Elements present now but not in the past.
    fn added(&self) -> Elements<'_, 'a, T>;

    /// Elements present in the past but not now.
    fn removed(&self) -> Elements<'_, 'a, T>;

    /// Elements matched across snapshots whose content differs.
    fn changed(&self) -> &[Change<'a, T, Self::Delta>] {
        &[]
    }
}
