//! Dependency-graph nodes and their incremental differences.
//!
//! A [`ClassNode`] is one compiled unit: its base attributes ([`Proto`]),
//! the [`Usage`]s it makes of other units, and per-kind [`Metadata`].
//! Nodes serialize to a compact little-endian format with usages grouped by
//! kind, and two snapshots of the same node compare through a lazily
//! evaluated [`NodeDiff`]. [`GraphSnapshot`] lifts this to whole builds.

#![warn(missing_docs)]

pub mod codec;
pub mod error;
pub mod metadata;
pub mod node;
pub mod node_diff;
pub mod proto;
pub mod snapshot;
pub mod usage;

pub use codec::{BinaryReader, BinaryWriter, ElementReader, ElementWriter, GraphElement, KindTag};
pub use error::{GraphError, GraphResult};
pub use metadata::{
    BodyChange, InlineFunction, InlineFunctions, Metadata, MetadataDelta, MetadataKind,
    SealedPermits, SourceLanguage, SourceOrigin, SourceOriginDelta,
};
pub use node::{ClassNode, NodeKind};
pub use node_diff::NodeDiff;
pub use proto::{AccessFlags, ElementAnnotation, Proto, ProtoDiff};
pub use snapshot::{DiffOptions, GraphSnapshot, SnapshotDelta, DEFAULT_PARALLEL_THRESHOLD};
pub use usage::{AnnotationRef, AnnotationTarget, ClassRef, MemberRef, ModuleRef, Usage, UsageKind};
