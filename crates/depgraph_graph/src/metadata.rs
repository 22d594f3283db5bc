//! Structured per-node metadata and its deltas.
//!
//! A node carries at most one [`Metadata`] entry of each [`MetadataKind`].
//! Entries of the same kind are the same logical element across snapshots,
//! so matching is by kind and change detection is delegated to the
//! kind-specific delta.

use depgraph_diff::{deep_diff, presence_diff, DeepDiff, DiffCapable, Difference, PresenceDiff};
use serde::{Deserialize, Serialize};

use crate::codec::{ElementReader, ElementWriter, GraphElement, KindTag};
use crate::error::GraphResult;

/// An inline function whose body is copied into callers at compile time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineFunction {
    /// JVM signature of the function (name + descriptor).
    pub signature: String,
    /// Fingerprint of the function body.
    pub body_hash: u64,
}

/// Body change of one inline function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyChange {
    /// Body fingerprint in the past snapshot.
    pub before: u64,
    /// Body fingerprint in the present snapshot.
    pub after: u64,
}

impl Difference for BodyChange {
    fn unchanged(&self) -> bool {
        self.before == self.after
    }
}

impl DiffCapable for InlineFunction {
    type Diff<'a> = BodyChange;

    fn is_same(&self, other: &Self) -> bool {
        self.signature == other.signature
    }

    fn diff_hash_code(&self) -> i32 {
        xxhash_rust::xxh3::xxh3_64(self.signature.as_bytes()) as u32 as i32
    }

    fn difference<'a>(&'a self, past: &'a Self) -> BodyChange {
        BodyChange {
            before: past.body_hash,
            after: self.body_hash,
        }
    }
}

/// Inline functions declared by a unit. Callers must recompile when a body changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineFunctions {
    /// The declared inline functions.
    pub functions: Vec<InlineFunction>,
}

/// Subclasses a sealed unit permits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedPermits {
    /// Fully-qualified names of the permitted subclasses.
    pub permitted: Vec<String>,
}

/// Source language a unit was compiled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceLanguage {
    /// Java source.
    Java,
    /// Kotlin source.
    Kotlin,
    /// Groovy source.
    Groovy,
    /// Scala source.
    Scala,
}

/// Where a unit came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceOrigin {
    /// Source file path relative to the source root.
    pub source_file: String,
    /// Source language.
    pub language: SourceLanguage,
}

/// Field-level change of a [`SourceOrigin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceOriginDelta {
    /// The source file moved.
    pub source_file_changed: bool,
    /// The source language changed.
    pub language_changed: bool,
}

impl Difference for SourceOriginDelta {
    fn unchanged(&self) -> bool {
        !self.source_file_changed && !self.language_changed
    }
}

/// One piece of structured metadata attached to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Metadata {
    /// See [`InlineFunctions`].
    InlineFunctions(InlineFunctions),
    /// See [`SealedPermits`].
    SealedPermits(SealedPermits),
    /// See [`SourceOrigin`].
    SourceOrigin(SourceOrigin),
}

/// Wire tags of [`Metadata`] variants.
///
/// Tags are persisted; never renumber an existing kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum MetadataKind {
    /// Tag of [`Metadata::InlineFunctions`].
    InlineFunctions = 1,
    /// Tag of [`Metadata::SealedPermits`].
    SealedPermits = 2,
    /// Tag of [`Metadata::SourceOrigin`].
    SourceOrigin = 3,
}

impl MetadataKind {
    /// Number of registered metadata kinds.
    pub const COUNT: usize = 3;

    /// Every registered metadata kind, in index order.
    pub const ALL: [MetadataKind; Self::COUNT] = [
        MetadataKind::InlineFunctions,
        MetadataKind::SealedPermits,
        MetadataKind::SourceOrigin,
    ];

    /// Dense index in `0..COUNT`, usable for per-kind tables.
    pub fn index(self) -> usize {
        self as usize - 1
    }
}

impl KindTag for MetadataKind {
    const FAMILY: &'static str = "metadata";

    fn tag(self) -> u8 {
        self as u8
    }

    fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }
}

/// Delta between two metadata entries of the same kind.
pub enum MetadataDelta<'a> {
    /// Inline functions added, removed, or with changed bodies.
    InlineFunctions(DeepDiff<'a, InlineFunction>),
    /// Permitted subclasses added or removed.
    SealedPermits(PresenceDiff<'a, String>),
    /// Source origin fields changed.
    SourceOrigin(SourceOriginDelta),
    /// The entries are of different kinds; only reachable by diffing
    /// entries that are not [`is_same`](DiffCapable::is_same).
    KindMismatch,
}

impl Difference for MetadataDelta<'_> {
    fn unchanged(&self) -> bool {
        match self {
            MetadataDelta::InlineFunctions(d) => d.unchanged(),
            MetadataDelta::SealedPermits(d) => d.unchanged(),
            MetadataDelta::SourceOrigin(d) => d.unchanged(),
            MetadataDelta::KindMismatch => false,
        }
    }
}

impl DiffCapable for Metadata {
    type Diff<'a> = MetadataDelta<'a>;

    fn is_same(&self, other: &Self) -> bool {
        self.kind() == other.kind()
    }

    fn diff_hash_code(&self) -> i32 {
        i32::from(self.kind().tag())
    }

    fn difference<'a>(&'a self, past: &'a Self) -> MetadataDelta<'a> {
        match (self, past) {
            (Metadata::InlineFunctions(now), Metadata::InlineFunctions(before)) => {
                MetadataDelta::InlineFunctions(deep_diff(&before.functions, &now.functions))
            }
            (Metadata::SealedPermits(now), Metadata::SealedPermits(before)) => {
                MetadataDelta::SealedPermits(presence_diff(&before.permitted, &now.permitted))
            }
            (Metadata::SourceOrigin(now), Metadata::SourceOrigin(before)) => {
                MetadataDelta::SourceOrigin(SourceOriginDelta {
                    source_file_changed: now.source_file != before.source_file,
                    language_changed: now.language != before.language,
                })
            }
            _ => MetadataDelta::KindMismatch,
        }
    }
}

impl GraphElement for Metadata {
    type Kind = MetadataKind;

    fn kind(&self) -> MetadataKind {
        match self {
            Metadata::InlineFunctions(_) => MetadataKind::InlineFunctions,
            Metadata::SealedPermits(_) => MetadataKind::SealedPermits,
            Metadata::SourceOrigin(_) => MetadataKind::SourceOrigin,
        }
    }

    fn write_payload<W: ElementWriter>(&self, out: &mut W) -> GraphResult<()> {
        match self {
            Metadata::InlineFunctions(m) => out.write_serde(m),
            Metadata::SealedPermits(m) => out.write_serde(m),
            Metadata::SourceOrigin(m) => out.write_serde(m),
        }
    }

    fn read_payload<R: ElementReader>(kind: MetadataKind, input: &mut R) -> GraphResult<Self> {
        Ok(match kind {
            MetadataKind::InlineFunctions => Metadata::InlineFunctions(input.read_serde()?),
            MetadataKind::SealedPermits => Metadata::SealedPermits(input.read_serde()?),
            MetadataKind::SourceOrigin => Metadata::SourceOrigin(input.read_serde()?),
        })
    }
}
