//! Whole-graph snapshots and the difference between two of them.
//!
//! Nodes are matched across snapshots by identity (kind, output path, name).
//! Matched pairs are diffed independently, so large snapshots fan the pairs
//! out over the rayon pool; a single node's diff always runs on one thread.

use depgraph_common::ReferenceId;
use depgraph_diff::{deep_diff, Change, DiffCapable, Difference, Elements, Specifier};
use indexmap::IndexSet;
use rayon::prelude::*;
use tracing::debug;

use crate::codec::{BinaryReader, BinaryWriter, ElementReader, ElementWriter};
use crate::error::GraphResult;
use crate::node::ClassNode;
use crate::node_diff::NodeDiff;

/// Matched-pair count at which snapshot diffs go parallel by default.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 256;

/// How a snapshot diff is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffOptions {
    /// Allow diffing matched node pairs on the rayon pool.
    pub parallel: bool,
    /// Minimum number of matched pairs before going parallel.
    pub parallel_threshold: usize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

/// All nodes of one build state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphSnapshot {
    nodes: Vec<ClassNode>,
}

impl GraphSnapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a snapshot holding `nodes`.
    pub fn from_nodes(nodes: impl IntoIterator<Item = ClassNode>) -> Self {
        Self {
            nodes: nodes.into_iter().collect(),
        }
    }

    /// Adds a node.
    pub fn insert(&mut self, node: ClassNode) {
        self.nodes.push(node);
    }

    /// All nodes, in insertion order.
    pub fn nodes(&self) -> &[ClassNode] {
        &self.nodes
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the snapshot has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes named by `id`. More than one when a name is emitted to several outputs.
    pub fn find<'s>(&'s self, id: &'s ReferenceId) -> impl Iterator<Item = &'s ClassNode> + 's {
        self.nodes.iter().filter(move |n| n.reference_id() == id)
    }

    /// Encodes the snapshot: node count, then each node with its kind tag.
    pub fn write_to_bytes(&self) -> GraphResult<Vec<u8>> {
        let mut out = BinaryWriter::new();
        out.write_count(self.nodes.len())?;
        for node in &self.nodes {
            out.write_element(node)?;
        }
        Ok(out.into_bytes())
    }

    /// Decodes a snapshot written by [`write_to_bytes`](Self::write_to_bytes).
    ///
    /// Fails on truncated input and on trailing bytes.
    pub fn read_from_bytes(bytes: &[u8]) -> GraphResult<Self> {
        let mut input = BinaryReader::new(bytes);
        let count = input.read_count()?;
        let mut nodes = Vec::new();
        for _ in 0..count {
            nodes.push(input.read_element::<ClassNode>()?);
        }
        input.finish()?;
        Ok(Self { nodes })
    }

    /// Computes what changed from `past` to `self`.
    pub fn diff<'a>(&'a self, past: &'a GraphSnapshot, options: &DiffOptions) -> SnapshotDelta<'a> {
        let nodes = deep_diff(&past.nodes, &self.nodes);
        let added: Vec<&ClassNode> = nodes.added().collect();
        let removed: Vec<&ClassNode> = nodes.removed().collect();
        let pairs: Vec<(&ClassNode, &ClassNode)> = nodes.matched().collect();

        let parallel = options.parallel && pairs.len() >= options.parallel_threshold;
        let diff_pair = |(before, after): (&'a ClassNode, &'a ClassNode)| {
            let diff = after.difference(before);
            (!diff.unchanged()).then_some(Change {
                before,
                after,
                diff,
            })
        };
        let matched = pairs.len();
        let changed: Vec<_> = if parallel {
            pairs.into_par_iter().filter_map(diff_pair).collect()
        } else {
            pairs.into_iter().filter_map(diff_pair).collect()
        };

        debug!(
            past = past.len(),
            present = self.len(),
            added = added.len(),
            removed = removed.len(),
            matched,
            changed = changed.len(),
            parallel,
            "snapshot diff computed"
        );

        SnapshotDelta {
            added,
            removed,
            changed,
        }
    }
}

/// Difference between two [`GraphSnapshot`]s.
pub struct SnapshotDelta<'a> {
    added: Vec<&'a ClassNode>,
    removed: Vec<&'a ClassNode>,
    changed: Vec<Change<'a, ClassNode, NodeDiff<'a>>>,
}

impl<'a> SnapshotDelta<'a> {
    /// Ids of every added, removed, or changed node, without duplicates.
    pub fn affected_ids(&self) -> Vec<&'a ReferenceId> {
        let ids: IndexSet<&'a ReferenceId> = self
            .added
            .iter()
            .chain(&self.removed)
            .copied()
            .chain(self.changed.iter().map(|c| c.after))
            .map(ClassNode::reference_id)
            .collect();
        ids.into_iter().collect()
    }
}

impl Difference for SnapshotDelta<'_> {
    fn unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

impl<'a> Specifier<'a, ClassNode> for SnapshotDelta<'a> {
    type Delta = NodeDiff<'a>;

    fn added(&self) -> Elements<'_, 'a, ClassNode> {
        Box::new(self.added.iter().copied())
    }

    fn removed(&self) -> Elements<'_, 'a, ClassNode> {
        Box::new(self.removed.iter().copied())
    }

    fn changed(&self) -> &[Change<'a, ClassNode, NodeDiff<'a>>] {
        &self.changed
    }
}
