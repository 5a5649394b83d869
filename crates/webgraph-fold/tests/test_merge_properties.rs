use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;
use webgraph_fold::{shared_values, CountingMerge};

fn sorted_lists() -> impl Strategy<Value = Vec<Vec<u32>>> {
    prop::collection::vec(prop::collection::vec(0u32..64, 0..20), 0..8).prop_map(|mut lists| {
        for list in &mut lists {
            list.sort_unstable();
        }
        lists
    })
}

fn set_lists() -> impl Strategy<Value = Vec<BTreeSet<u32>>> {
    prop::collection::vec(prop::collection::btree_set(0u32..32, 0..16), 1..6)
}

proptest! {
    #[test]
    fn merged_values_strictly_increase_with_exact_counts(lists in sorted_lists()) {
        let mut expected: BTreeMap<u32, usize> = BTreeMap::new();
        for value in lists.iter().flatten() {
            *expected.entry(*value).or_default() += 1;
        }

        let mut merge = CountingMerge::new(lists.clone());
        let mut merged = BTreeMap::new();
        let mut last = None;
        while let Some((value, count)) = merge.next_with_count() {
            prop_assert!(last.map_or(true, |last| last < value));
            last = Some(value);
            merged.insert(value, count);
        }
        prop_assert!(!merge.has_next());
        prop_assert_eq!(merged, expected);
    }

    #[test]
    fn shared_values_select_intersection_and_union(lists in set_lists()) {
        let k = lists.len();
        let inputs: Vec<Vec<u32>> = lists.iter().map(|set| set.iter().copied().collect()).collect();

        let union: Vec<u32> = lists.iter().flatten().copied().collect::<BTreeSet<_>>().into_iter().collect();
        let intersection: Vec<u32> = union
            .iter()
            .copied()
            .filter(|value| lists.iter().all(|set| set.contains(value)))
            .collect();

        prop_assert_eq!(shared_values(inputs.clone(), 1, k), union);
        prop_assert_eq!(shared_values(inputs, k, k), intersection);
    }
}
