//! Property-based tests for node serialization and node differencing.

use std::collections::HashMap;

use depgraph_diff::{presence_diff, DiffCapable, Difference, Specifier};
use depgraph_graph::{
    AccessFlags, BinaryReader, BinaryWriter, ClassNode, ElementReader, ElementWriter,
    GraphSnapshot, InlineFunction, InlineFunctions, Metadata, SealedPermits, Usage,
};
use proptest::prelude::*;

fn usage_strategy() -> impl Strategy<Value = Usage> {
    let owner = "[a-c]/[A-C]";
    prop_oneof![
        owner.prop_map(Usage::class),
        (owner, "[a-c]{1,2}", "\\(\\)[VIZ]").prop_map(|(o, n, d)| Usage::method(o, n, d)),
        (owner, "[a-c]{1,2}", "[IJZ]").prop_map(|(o, n, d)| Usage::field(o, n, d)),
    ]
}

fn metadata_strategy() -> impl Strategy<Value = Vec<Metadata>> {
    (
        prop::option::of(prop::collection::vec(("[a-d]\\(\\)V", any::<u64>()), 0..4)),
        prop::option::of(prop::collection::vec("[a-c]/[A-C]", 0..4)),
    )
        .prop_map(|(inline, permits)| {
            let mut metadata = Vec::new();
            if let Some(functions) = inline {
                metadata.push(Metadata::InlineFunctions(InlineFunctions {
                    functions: functions
                        .into_iter()
                        .map(|(signature, body_hash)| InlineFunction {
                            signature,
                            body_hash,
                        })
                        .collect(),
                }));
            }
            if let Some(permitted) = permits {
                metadata.push(Metadata::SealedPermits(SealedPermits { permitted }));
            }
            metadata
        })
}

fn node_strategy() -> impl Strategy<Value = ClassNode> {
    (
        "[a-c]/[A-D]",
        "out/[a-b]",
        any::<bool>(),
        prop::collection::vec(usage_strategy(), 0..12),
        metadata_strategy(),
    )
        .prop_map(|(name, out_dir, is_final, usages, metadata)| {
            let flags = if is_final {
                AccessFlags::PUBLIC | AccessFlags::FINAL
            } else {
                AccessFlags::PUBLIC
            };
            let out = format!("{out_dir}/{name}.class");
            ClassNode::class(flags, None, &name, &out, [], usages, metadata)
        })
}

fn counts(usages: &[Usage]) -> HashMap<&Usage, usize> {
    let mut map = HashMap::new();
    for usage in usages {
        *map.entry(usage).or_insert(0) += 1;
    }
    map
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn node_roundtrip_preserves_content(node in node_strategy()) {
        let mut out = BinaryWriter::new();
        out.write_element(&node).unwrap();
        let bytes = out.into_bytes();

        let mut input = BinaryReader::new(&bytes);
        let back: ClassNode = input.read_element().unwrap();
        input.finish().unwrap();

        prop_assert_eq!(back.kind(), node.kind());
        prop_assert_eq!(back.reference_id(), node.reference_id());
        prop_assert_eq!(back.out_file_fingerprint(), node.out_file_fingerprint());
        prop_assert_eq!(back.proto(), node.proto());
        prop_assert_eq!(counts(back.usages()), counts(node.usages()));
        prop_assert_eq!(back.metadata(), node.metadata());
        prop_assert!(back.difference(&node).unchanged());
    }

    #[test]
    fn same_nodes_share_hash_code(a in node_strategy(), b in node_strategy()) {
        if a.is_same(&b) {
            prop_assert_eq!(a.diff_hash_code(), b.diff_hash_code());
        }
        prop_assert!(a.is_same(&a));
    }

    #[test]
    fn presence_diff_is_set_difference(
        past in prop::collection::vec(usage_strategy(), 0..10),
        now in prop::collection::vec(usage_strategy(), 0..10),
    ) {
        let diff = presence_diff(&past, &now);
        for added in diff.added() {
            prop_assert!(now.contains(added));
            prop_assert!(!past.contains(added));
        }
        for removed in diff.removed() {
            prop_assert!(past.contains(removed));
            prop_assert!(!now.contains(removed));
        }
        let same_sets = past.iter().all(|u| now.contains(u)) && now.iter().all(|u| past.contains(u));
        prop_assert_eq!(diff.unchanged(), same_sets);
    }

    #[test]
    fn usage_order_never_matters(node in node_strategy()) {
        let mut reversed: Vec<Usage> = node.usages().to_vec();
        reversed.reverse();
        let shuffled = ClassNode::new(
            node.kind(),
            node.proto().clone(),
            "placeholder",
            reversed,
            node.metadata().to_vec(),
        );
        let diff = presence_diff(node.usages(), shuffled.usages());
        prop_assert!(diff.unchanged());
    }

    #[test]
    fn snapshot_decoder_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = GraphSnapshot::read_from_bytes(&bytes);
    }
}
