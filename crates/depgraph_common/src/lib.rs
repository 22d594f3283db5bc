//! Shared foundational types for the dependency graph.
//!
//! This crate provides content hashing, output-path fingerprints, and node
//! reference identifiers used by every other depgraph crate.

#![warn(missing_docs)]

pub mod hash;
pub mod reference;

pub use hash::{ContentHash, PathFingerprint};
pub use reference::ReferenceId;
