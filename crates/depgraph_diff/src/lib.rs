//! Set differencing for incremental dependency tracking.
//!
//! Two snapshots of a collection are compared to produce what was added,
//! what was removed, and (for [`DiffCapable`] elements) what changed in
//! place. Matching uses an identity that is deliberately separate from
//! structural equality: [`DiffCapable::is_same`] pairs "the same logical
//! thing" across snapshots, and [`DiffCapable::difference`] then reports what
//! changed about it.

#![warn(missing_docs)]

pub mod difference;
pub mod set_diff;
pub mod strategy;

pub use difference::{Change, Difference, Elements, Specifier};
pub use set_diff::{deep_diff, presence_diff, DeepDiff, PresenceDiff};
pub use strategy::{DiffCapable, EqualityStrategy, IdentityEquality, Keyed, NaturalEquality};
