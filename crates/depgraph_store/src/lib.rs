//! Persistence of dependency-graph snapshots between builds.
//!
//! Each build saves its [`GraphSnapshot`](depgraph_graph::GraphSnapshot)
//! under a name; the next build loads it as the past state. Snapshots are
//! content-addressed artifacts with a validated header, indexed by a JSON
//! manifest. Unreadable state is treated as absent so a damaged store costs
//! a full rebuild rather than a failure.

#![warn(missing_docs)]

pub mod artifact;
pub mod error;
pub mod manifest;
pub mod store;

pub use artifact::{ArtifactHeader, ArtifactStore};
pub use error::StoreError;
pub use manifest::{SnapshotEntry, SnapshotManifest};
pub use store::SnapshotStore;
