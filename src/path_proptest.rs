//! Property-based tests for path normalisation and descriptor ordering.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::descriptors::PatchDescriptorStore;
    use crate::error::Error;
    use crate::path::{encode_path_segment, normalize_rel_path};
    use proptest::prelude::*;

    // ============================================================================
    // normalize_rel_path property tests
    // ============================================================================

    proptest! {
        /// Property: normalizing twice gives the same result as once
        #[test]
        fn normalize_is_idempotent(segments in prop::collection::vec("[a-z0-9._-]{1,8}", 1..5)) {
            let joined = segments.join("/");
            if let Ok(once) = normalize_rel_path(&joined) {
                let twice = normalize_rel_path(&once).unwrap();
                prop_assert_eq!(once, twice);
            }
        }

        /// Property: a normalized path never starts or ends with a separator
        #[test]
        fn normalize_strips_separators(segments in prop::collection::vec("[a-z]{1,8}", 1..5)) {
            let input = format!("./{}/", segments.join("/"));
            let result = normalize_rel_path(&input).unwrap();
            prop_assert!(!result.starts_with('/'));
            prop_assert!(!result.ends_with('/'));
            prop_assert_eq!(result, segments.join("/"));
        }

        /// Property: encode_path_segment never produces a separator
        #[test]
        fn encode_never_produces_separator(input in ".*") {
            let result = encode_path_segment(&input);
            prop_assert!(!result.contains('/'));
            prop_assert!(!result.contains('\\'));
        }
    }

    // ============================================================================
    // PatchDescriptorStore property tests
    // ============================================================================

    proptest! {
        /// Property: all_descriptors returns descriptors in registration order
        #[test]
        fn store_preserves_registration_order(
            names in prop::collection::hash_set("[a-z]{1,10}", 1..20)
        ) {
            let names: Vec<String> = names.into_iter().collect();
            let mut store = PatchDescriptorStore::new();
            for (i, name) in names.iter().enumerate() {
                if i % 2 == 0 {
                    store
                        .add_file_patch(&format!("up/{}", name), &format!("out/{}", name), &format!("p/{}.patch", name))
                        .unwrap();
                } else {
                    store
                        .add_dir_patch(&format!("up/{}", name), &format!("out/{}", name), &format!("p/{}", name), Vec::new())
                        .unwrap();
                }
            }

            let outputs: Vec<String> = store
                .all_descriptors()
                .map(|d| d.output_path().to_string())
                .collect();
            let expected: Vec<String> = names.iter().map(|n| format!("out/{}", n)).collect();
            prop_assert_eq!(outputs, expected);
        }

        /// Property: a repeated output path is rejected wherever it appears
        #[test]
        fn store_rejects_duplicate_in_any_position(
            names in prop::collection::hash_set("[a-z]{1,10}", 1..10),
            dup_index in 0usize..10,
        ) {
            let names: Vec<String> = names.into_iter().collect();
            let dup = names[dup_index % names.len()].clone();
            let mut store = PatchDescriptorStore::new();
            for name in &names {
                store
                    .add_file_patch(&format!("up/{}", name), &format!("out/{}", name), "p.patch")
                    .unwrap();
            }

            let err = store
                .add_dir_patch("elsewhere", &format!("out/{}", dup), "p", Vec::new())
                .unwrap_err();
            let is_duplicate = matches!(err, Error::DuplicateDescriptor { .. });
            prop_assert!(is_duplicate);
            prop_assert_eq!(store.len(), names.len());
        }
    }
}
