//! Property-based tests for segment combination matching.

use std::collections::BTreeMap;

use budgetgate_shared::types::SegmentTypeId;
use proptest::prelude::*;

use super::combination::SegmentCombination;

/// Strategy for a non-empty segment map with up to five segment types.
fn segment_map() -> impl Strategy<Value = BTreeMap<i32, String>> {
    prop::collection::btree_map(1i32..8, "[A-Z][0-9]{2,4}", 1..5)
}

fn build(map: &BTreeMap<i32, String>) -> SegmentCombination {
    SegmentCombination::from_raw(map.iter().map(|(id, code)| (*id, code.as_str()))).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Combinations whose key sets differ are never equal, even when every
    /// shared key carries the same code.
    #[test]
    fn prop_different_key_sets_never_equal(
        base in segment_map(),
        extra_key in 8i32..12,
        extra_code in "[A-Z][0-9]{3}",
    ) {
        let mut extended = base.clone();
        extended.insert(extra_key, extra_code);

        let a = build(&base);
        let b = build(&extended);

        prop_assert!(!a.equals(&b));
        prop_assert!(!b.equals(&a));
        prop_assert_ne!(a.canonical_key(), b.canonical_key());
    }

    /// Equal maps always build equal combinations with identical canonical keys.
    #[test]
    fn prop_equal_maps_are_equal(map in segment_map()) {
        let a = build(&map);
        let reversed: Vec<(i32, &str)> = map.iter().rev().map(|(id, code)| (*id, code.as_str())).collect();
        let b = SegmentCombination::from_raw(reversed).unwrap();

        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.canonical_key(), b.canonical_key());
    }

    /// Replacing one code changes exactly that key and nothing else.
    #[test]
    fn prop_replace_touches_single_key(map in segment_map(), new_code in "[A-Z][0-9]{5}") {
        let combo = build(&map);
        let (target, _) = map.iter().next().unwrap();
        let target = SegmentTypeId::new(*target).unwrap();

        let replaced = combo.with_code_replaced(target, new_code.clone()).unwrap();

        prop_assert_eq!(replaced.len(), combo.len());
        prop_assert_eq!(replaced.get(target), Some(new_code.as_str()));
        for (id, code) in combo.iter().filter(|(id, _)| *id != target) {
            prop_assert_eq!(replaced.get(id), Some(code));
        }
    }

    /// The JSON form parses back to the same combination.
    #[test]
    fn prop_json_form_is_canonical(map in segment_map()) {
        let combo = build(&map);
        let parsed = SegmentCombination::from_json(combo.to_json()).unwrap();
        prop_assert_eq!(parsed, combo);
    }
}
