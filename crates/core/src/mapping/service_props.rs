//! Property tests for combination rewriting.

use std::sync::Arc;

use proptest::prelude::*;

use super::service::SegmentMappingResolver;
use super::types::{CreateMappingInput, MappingKind};
use crate::memory::InMemoryMappingRepository;
use crate::segment::SegmentCombination;
use crate::test_support::segment_type;

fn combination_strategy() -> impl Strategy<Value = Vec<(i32, String)>> {
    prop::collection::btree_map(1i32..8, "[A-Z][0-9]{2}", 1..6)
        .prop_map(|segments| segments.into_iter().collect())
}

fn build(pairs: &[(i32, String)]) -> SegmentCombination {
    SegmentCombination::from_raw(pairs.iter().map(|(k, v)| (*k, v.as_str()))).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// With no mappings configured, rewriting is the identity.
    #[test]
    fn prop_identity_without_mappings(pairs in combination_strategy()) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        runtime.block_on(async {
            let resolver = SegmentMappingResolver::new(Arc::new(InMemoryMappingRepository::new()));
            let original = build(&pairs);
            let mapped = resolver.apply_to_combination(&original).await.unwrap();
            assert_eq!(mapped, original);
        });
    }

    /// Mapping one key changes exactly that key.
    #[test]
    fn prop_single_mapping_changes_one_key(
        pairs in combination_strategy(),
        pick in any::<prop::sample::Index>(),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        runtime.block_on(async {
            let resolver = SegmentMappingResolver::new(Arc::new(InMemoryMappingRepository::new()));
            let (mapped_type, source) = pairs[pick.index(pairs.len())].clone();
            let target = format!("{source}-ROLLUP");
            resolver
                .create_mapping(CreateMappingInput {
                    segment_type: segment_type(mapped_type),
                    source_code: source,
                    target_code: target.clone(),
                    kind: MappingKind::Alias,
                    description: None,
                })
                .await
                .unwrap();

            let original = build(&pairs);
            let mapped = resolver.apply_to_combination(&original).await.unwrap();

            assert_eq!(mapped.len(), original.len());
            for (key, code) in original.iter() {
                if key == segment_type(mapped_type) {
                    assert_eq!(mapped.get(key), Some(target.as_str()));
                } else {
                    assert_eq!(mapped.get(key), Some(code));
                }
            }
        });
    }
}
