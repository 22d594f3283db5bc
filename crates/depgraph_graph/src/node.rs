//! Graph nodes: one compiled unit with its usages and metadata.

use depgraph_common::{PathFingerprint, ReferenceId};
use depgraph_diff::DiffCapable;
use indexmap::IndexMap;

use crate::codec::{ElementReader, ElementWriter, GraphElement, KindTag};
use crate::error::GraphResult;
use crate::metadata::{Metadata, MetadataKind};
use crate::node_diff::NodeDiff;
use crate::proto::{AccessFlags, ElementAnnotation, Proto};
use crate::usage::{Usage, UsageKind};

/// Concrete kind of a graph node.
///
/// Nodes of different kinds are never matched against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NodeKind {
    /// A class, interface, enum, or annotation type.
    Class = 1,
    /// A module descriptor.
    Module = 2,
}

impl KindTag for NodeKind {
    const FAMILY: &'static str = "node";

    fn tag(self) -> u8 {
        self as u8
    }

    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(NodeKind::Class),
            2 => Some(NodeKind::Module),
            _ => None,
        }
    }
}

/// One compiled unit in the dependency graph.
///
/// Immutable once built. Identity for diffing is
/// `(kind, out_file_fingerprint, reference_id)`; see [`DiffCapable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassNode {
    kind: NodeKind,
    proto: Proto,
    id: ReferenceId,
    out_file: PathFingerprint,
    usages: Vec<Usage>,
    metadata: Box<[Metadata]>,
}

impl ClassNode {
    /// Builds a node from already materialized parts.
    ///
    /// The reference id is derived from `proto.name()` and the output path is
    /// fingerprinted here. Usages are kept as given, duplicates included.
    /// At most one metadata entry per kind is expected but not enforced.
    pub fn new(
        kind: NodeKind,
        proto: Proto,
        out_file_path: &str,
        usages: impl IntoIterator<Item = Usage>,
        metadata: impl IntoIterator<Item = Metadata>,
    ) -> Self {
        Self {
            kind,
            id: ReferenceId::new(proto.name()),
            proto,
            out_file: PathFingerprint::of(out_file_path),
            usages: usages.into_iter().collect(),
            metadata: metadata.into_iter().collect(),
        }
    }

    /// Shorthand for a class node built from raw base attributes.
    #[allow(clippy::too_many_arguments)]
    pub fn class(
        flags: AccessFlags,
        signature: Option<String>,
        name: &str,
        out_file_path: &str,
        annotations: impl IntoIterator<Item = ElementAnnotation>,
        usages: impl IntoIterator<Item = Usage>,
        metadata: impl IntoIterator<Item = Metadata>,
    ) -> Self {
        Self::new(
            NodeKind::Class,
            Proto::new(flags, signature, name, annotations),
            out_file_path,
            usages,
            metadata,
        )
    }

    /// Reads the body of a node of `kind`.
    ///
    /// Layout: base fields, raw 8-byte output-path fingerprint, usage group
    /// count followed by one homogeneous group per usage kind, metadata count
    /// followed by individually tagged metadata entries.
    pub fn read<R: ElementReader>(kind: NodeKind, input: &mut R) -> GraphResult<Self> {
        let proto = Proto::read(input)?;
        let out_file = PathFingerprint::from_raw(input.read_raw_i64()?);

        let mut usages: Vec<Usage> = Vec::new();
        let groups = input.read_count()?;
        for _ in 0..groups {
            input.read_group_into(&mut usages)?;
        }

        let count = input.read_count()?;
        let mut metadata = Vec::new();
        for _ in 0..count {
            metadata.push(input.read_element::<Metadata>()?);
        }

        Ok(Self {
            kind,
            id: ReferenceId::new(proto.name()),
            proto,
            out_file,
            usages,
            metadata: metadata.into_boxed_slice(),
        })
    }

    /// Writes the body of this node; the inverse of [`read`](Self::read).
    pub fn write<W: ElementWriter>(&self, out: &mut W) -> GraphResult<()> {
        self.proto.write(out)?;
        out.write_raw_i64(self.out_file.as_raw());

        let mut groups: IndexMap<UsageKind, Vec<&Usage>> = IndexMap::new();
        for usage in &self.usages {
            groups.entry(usage.kind()).or_default().push(usage);
        }
        out.write_count(groups.len())?;
        for (kind, group) in &groups {
            out.write_group(*kind, group.iter().copied())?;
        }

        out.write_count(self.metadata.len())?;
        for entry in self.metadata.iter() {
            out.write_element(entry)?;
        }
        Ok(())
    }

    /// Concrete node kind.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Base attributes.
    pub fn proto(&self) -> &Proto {
        &self.proto
    }

    /// Fully-qualified name.
    pub fn name(&self) -> &str {
        self.proto.name()
    }

    /// Identifier derived from the name.
    pub fn reference_id(&self) -> &ReferenceId {
        &self.id
    }

    /// Fingerprint of the declared output file path.
    pub fn out_file_fingerprint(&self) -> PathFingerprint {
        self.out_file
    }

    /// All usages, in construction or decode order.
    pub fn usages(&self) -> &[Usage] {
        &self.usages
    }

    /// All metadata entries.
    pub fn metadata(&self) -> &[Metadata] {
        &self.metadata
    }

    /// Metadata entries of one kind.
    pub fn metadata_of(&self, kind: MetadataKind) -> impl Iterator<Item = &Metadata> + '_ {
        self.metadata.iter().filter(move |m| m.kind() == kind)
    }

    /// The entry of `kind` as a set of at most one element.
    ///
    /// If several entries share a kind, the first one represents it.
    pub fn filter_metadata(&self, kind: MetadataKind) -> &[Metadata] {
        match self.metadata.iter().position(|m| m.kind() == kind) {
            Some(i) => std::slice::from_ref(&self.metadata[i]),
            None => &[],
        }
    }
}

impl DiffCapable for ClassNode {
    type Diff<'a> = NodeDiff<'a>;

    fn is_same(&self, other: &Self) -> bool {
        self.kind == other.kind && self.out_file == other.out_file && self.id == other.id
    }

    fn diff_hash_code(&self) -> i32 {
        31i32
            .wrapping_mul(self.out_file.low32())
            .wrapping_add(self.id.hash_code())
    }

    /// Pairs `past` with `self`; both must be of the same [`NodeKind`].
    /// Pairing different kinds yields a meaningless diff, not an error.
    fn difference<'a>(&'a self, past: &'a Self) -> NodeDiff<'a> {
        NodeDiff::new(past, self)
    }
}

impl GraphElement for ClassNode {
    type Kind = NodeKind;

    fn kind(&self) -> NodeKind {
        self.kind
    }

    fn write_payload<W: ElementWriter>(&self, out: &mut W) -> GraphResult<()> {
        self.write(out)
    }

    fn read_payload<R: ElementReader>(kind: NodeKind, input: &mut R) -> GraphResult<Self> {
        Self::read(kind, input)
    }
}
