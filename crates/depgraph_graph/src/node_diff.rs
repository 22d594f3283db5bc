//! Lazily computed difference between two snapshots of one node.

use depgraph_diff::{deep_diff, presence_diff, DeepDiff, Difference, PresenceDiff};
use once_cell::sync::OnceCell;

use crate::codec::GraphElement;
use crate::metadata::{Metadata, MetadataKind};
use crate::node::ClassNode;
use crate::proto::ProtoDiff;
use crate::usage::Usage;

/// Difference between a past and a present instance of the same node.
///
/// Created by the present node via
/// [`DiffCapable::difference`](depgraph_diff::DiffCapable::difference).
/// Both nodes must be of the same [`NodeKind`](crate::NodeKind); the view
/// does not check this.
///
/// The usage diff and each per-kind metadata diff are computed on first
/// access and cached for the life of the view. Caches are single-assignment
/// cells: concurrent first access may compute a value twice, and the first
/// stored result is kept.
pub struct NodeDiff<'a> {
    past: &'a ClassNode,
    present: &'a ClassNode,
    proto: ProtoDiff<'a>,
    usages: OnceCell<PresenceDiff<'a, Usage>>,
    metadata: [OnceCell<DeepDiff<'a, Metadata>>; MetadataKind::COUNT],
}

impl<'a> NodeDiff<'a> {
    pub(crate) fn new(past: &'a ClassNode, present: &'a ClassNode) -> Self {
        Self {
            past,
            present,
            proto: present.proto().diff(past.proto()),
            usages: OnceCell::new(),
            metadata: std::array::from_fn(|_| OnceCell::new()),
        }
    }

    /// The past snapshot of the node.
    pub fn past(&self) -> &'a ClassNode {
        self.past
    }

    /// The present snapshot of the node.
    pub fn present(&self) -> &'a ClassNode {
        self.present
    }

    /// Difference of the base attributes.
    pub fn proto(&self) -> &ProtoDiff<'a> {
        &self.proto
    }

    /// Presence difference of the usage collections.
    pub fn usages(&self) -> &PresenceDiff<'a, Usage> {
        self.usages
            .get_or_init(|| presence_diff(self.past.usages(), self.present.usages()))
    }

    /// Returns `true` if any metadata kind present in either snapshot changed.
    ///
    /// Stops at the first changed kind. Shares its cache with
    /// [`metadata`](Self::metadata).
    pub fn metadata_changed(&self) -> bool {
        self.past
            .metadata()
            .iter()
            .chain(self.present.metadata())
            .any(|entry| !self.metadata(entry.kind()).unchanged())
    }

    /// Structural difference of the metadata entries of one kind.
    ///
    /// A kind absent from both snapshots yields the empty difference.
    pub fn metadata(&self, kind: MetadataKind) -> &DeepDiff<'a, Metadata> {
        self.metadata[kind.index()].get_or_init(|| {
            deep_diff(
                self.past.filter_metadata(kind),
                self.present.filter_metadata(kind),
            )
        })
    }
}

impl Difference for NodeDiff<'_> {
    fn unchanged(&self) -> bool {
        self.proto.unchanged() && self.usages().unchanged() && !self.metadata_changed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{InlineFunction, InlineFunctions, MetadataDelta, SealedPermits};
    use crate::proto::{AccessFlags, ElementAnnotation};
    use depgraph_diff::{DiffCapable, Specifier};

    struct Parts {
        flags: AccessFlags,
        usages: Vec<Usage>,
        metadata: Vec<Metadata>,
    }

    impl Default for Parts {
        fn default() -> Self {
            Self {
                flags: AccessFlags::PUBLIC,
                usages: vec![Usage::class("a/B"), Usage::method("a/B", "run", "()V")],
                metadata: vec![inline(1)],
            }
        }
    }

    fn inline(body_hash: u64) -> Metadata {
        Metadata::InlineFunctions(InlineFunctions {
            functions: vec![InlineFunction {
                signature: "helper()V".to_string(),
                body_hash,
            }],
        })
    }

    fn build(parts: Parts) -> ClassNode {
        ClassNode::class(
            parts.flags,
            None,
            "com/acme/Foo",
            "out/com/acme/Foo.class",
            [ElementAnnotation::new("kotlin/Metadata", 3)],
            parts.usages,
            parts.metadata,
        )
    }

    #[test]
    fn identical_nodes_unchanged() {
        let past = build(Parts::default());
        let now = build(Parts::default());
        let diff = now.difference(&past);
        assert!(diff.unchanged());
        assert!(diff.proto().unchanged());
        assert!(diff.usages().unchanged());
        assert!(!diff.metadata_changed());
    }

    #[test]
    fn base_field_change_alone() {
        let past = build(Parts::default());
        let now = build(Parts {
            flags: AccessFlags::PUBLIC | AccessFlags::FINAL,
            ..Parts::default()
        });
        let diff = now.difference(&past);
        assert!(!diff.unchanged());
        assert!(!diff.proto().unchanged());
        assert!(diff.usages().unchanged());
        assert!(!diff.metadata_changed());
    }

    #[test]
    fn usage_change_alone() {
        let past = build(Parts::default());
        let now = build(Parts {
            usages: vec![Usage::class("a/B"), Usage::class("a/C")],
            ..Parts::default()
        });
        let diff = now.difference(&past);
        assert!(!diff.unchanged());
        assert!(diff.proto().unchanged());
        assert!(!diff.metadata_changed());

        let usages = diff.usages();
        assert_eq!(usages.added().collect::<Vec<_>>(), vec![&Usage::class("a/C")]);
        assert_eq!(
            usages.removed().collect::<Vec<_>>(),
            vec![&Usage::method("a/B", "run", "()V")]
        );
    }

    #[test]
    fn usage_reorder_is_unchanged() {
        let past = build(Parts::default());
        let now = build(Parts {
            usages: vec![Usage::method("a/B", "run", "()V"), Usage::class("a/B")],
            ..Parts::default()
        });
        assert!(now.difference(&past).unchanged());
    }

    #[test]
    fn metadata_change_alone() {
        let past = build(Parts::default());
        let now = build(Parts {
            metadata: vec![inline(2)],
            ..Parts::default()
        });
        let diff = now.difference(&past);
        assert!(!diff.unchanged());
        assert!(diff.proto().unchanged());
        assert!(diff.usages().unchanged());
        assert!(diff.metadata_changed());

        let spec = diff.metadata(MetadataKind::InlineFunctions);
        assert_eq!(spec.changed().len(), 1);
        assert!(matches!(
            spec.changed()[0].diff,
            MetadataDelta::InlineFunctions(_)
        ));
    }

    #[test]
    fn duplicate_inline_signatures_against_clone_unchanged() {
        let metadata = Metadata::InlineFunctions(InlineFunctions {
            functions: vec![
                InlineFunction {
                    signature: "b()V".to_string(),
                    body_hash: 0,
                },
                InlineFunction {
                    signature: "b()V".to_string(),
                    body_hash: 1,
                },
            ],
        });
        let past = build(Parts {
            metadata: vec![metadata],
            ..Parts::default()
        });
        let now = past.clone();
        let diff = now.difference(&past);
        assert!(!diff.metadata_changed());
        assert!(diff.unchanged());
    }

    #[test]
    fn metadata_kind_added() {
        let past = build(Parts::default());
        let sealed = Metadata::SealedPermits(SealedPermits {
            permitted: vec!["com/acme/Bar".to_string()],
        });
        let now = build(Parts {
            metadata: vec![inline(1), sealed.clone()],
            ..Parts::default()
        });
        let diff = now.difference(&past);
        assert!(diff.metadata_changed());
        assert!(diff.metadata(MetadataKind::InlineFunctions).unchanged());
        let permits = diff.metadata(MetadataKind::SealedPermits);
        assert_eq!(permits.added().collect::<Vec<_>>(), vec![&sealed]);
        assert_eq!(permits.removed().count(), 0);
    }

    #[test]
    fn metadata_kind_removed_counts_as_change() {
        let past = build(Parts::default());
        let now = build(Parts {
            metadata: vec![],
            ..Parts::default()
        });
        let diff = now.difference(&past);
        assert!(diff.metadata_changed());
        assert_eq!(
            diff.metadata(MetadataKind::InlineFunctions).removed().count(),
            1
        );
    }

    #[test]
    fn absent_kind_is_empty() {
        let past = build(Parts::default());
        let now = build(Parts::default());
        let diff = now.difference(&past);
        let spec = diff.metadata(MetadataKind::SourceOrigin);
        assert!(spec.unchanged());
        assert_eq!(spec.added().count(), 0);
        assert_eq!(spec.removed().count(), 0);
        assert!(spec.changed().is_empty());
    }

    #[test]
    fn metadata_diff_is_cached() {
        let past = build(Parts::default());
        let now = build(Parts {
            metadata: vec![inline(5)],
            ..Parts::default()
        });
        let diff = now.difference(&past);
        assert!(diff.metadata_changed());

        let first = diff.metadata(MetadataKind::InlineFunctions);
        let second = diff.metadata(MetadataKind::InlineFunctions);
        assert!(std::ptr::eq(first, second));
        assert!(std::ptr::eq(first.changed(), second.changed()));
        assert!(std::ptr::eq(diff.usages(), diff.usages()));
    }

    #[test]
    fn unchanged_tracks_each_component() {
        let base = build(Parts::default());
        for (proto_changed, usages_changed, metadata_changed) in [
            (false, false, false),
            (true, false, false),
            (false, true, false),
            (false, false, true),
            (true, true, true),
        ] {
            let now = build(Parts {
                flags: if proto_changed {
                    AccessFlags::PRIVATE
                } else {
                    AccessFlags::PUBLIC
                },
                usages: if usages_changed {
                    vec![Usage::class("z/Z")]
                } else {
                    Parts::default().usages
                },
                metadata: if metadata_changed {
                    vec![inline(42)]
                } else {
                    vec![inline(1)]
                },
            });
            let diff = now.difference(&base);
            let expected = !(proto_changed || usages_changed || metadata_changed);
            assert_eq!(
                diff.unchanged(),
                expected,
                "proto={proto_changed} usages={usages_changed} metadata={metadata_changed}"
            );
        }
    }
}
