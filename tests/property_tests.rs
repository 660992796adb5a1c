//! Property-based tests for test selection
//!
//! These tests use proptest to check the sharding and ordering guarantees over many randomly generated test
//! name sets.

use std::collections::BTreeSet;

use proptest::prelude::*;
use testrig::interface::{Fingerprint, TestDefinition};
use testrig::{NamePattern, ShardSpec, TestSelector};

fn definitions(names: &[String]) -> Vec<TestDefinition> {
    names
        .iter()
        .map(|n| TestDefinition::new(n.as_str(), Fingerprint::annotated("mark", false)))
        .collect()
}

fn names(tests: &[TestDefinition]) -> Vec<String> {
    tests.iter().map(|t| t.name().to_string()).collect()
}

/// Distinct dotted names, in random order.
fn name_set_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[a-zA-Z][a-zA-Z0-9]{0,6}(\\.[A-Z][a-z0-9]{0,6}){0,2}", 0..40)
        .prop_map(|set| set.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

/// Shard totals, including the single-shard case.
fn shard_total_strategy() -> impl Strategy<Value = u64> {
    1u64..8
}

proptest! {
    /// Property: every test lands in exactly one shard, and the shards in index order rebuild the sorted list
    #[test]
    fn shards_are_a_disjoint_cover(names_in in name_set_strategy(), total in shard_total_strategy()) {
        let mut sorted = names_in.clone();
        sorted.sort();

        let mut seen = BTreeSet::new();
        let mut by_ordinal = vec![None; sorted.len()];
        for index in 0..total {
            let mut selector = TestSelector::new(None, ShardSpec::new(index, total));
            for (position, name) in names(&selector.select(definitions(&names_in))).into_iter().enumerate() {
                prop_assert!(seen.insert(name.clone()), "{} selected twice", name);
                let ordinal = index as usize + position * total as usize;
                by_ordinal[ordinal] = Some(name);
            }
        }

        let rebuilt: Vec<String> = by_ordinal.into_iter().flatten().collect();
        prop_assert_eq!(rebuilt, sorted);
    }

    /// Property: selecting twice from the same input yields the identical sequence
    #[test]
    fn selection_is_idempotent(names_in in name_set_strategy(), total in shard_total_strategy(), seed in any::<u64>()) {
        let index = seed % total;
        let pattern = NamePattern::new("[a-m].*").unwrap();
        let first = TestSelector::new(Some(pattern.clone()), ShardSpec::new(index, total))
            .select(definitions(&names_in));
        let mut reversed = names_in.clone();
        reversed.reverse();
        let second = TestSelector::new(Some(pattern), ShardSpec::new(index, total)).select(definitions(&reversed));
        prop_assert_eq!(names(&first), names(&second));
    }

    /// Property: splitting a run across frameworks never changes which ordinals a shard owns
    #[test]
    fn counter_continues_across_frameworks(
        first in name_set_strategy(),
        second in name_set_strategy(),
        total in shard_total_strategy(),
        seed in any::<u64>(),
    ) {
        let index = seed % total;
        let mut selector = TestSelector::new(None, ShardSpec::new(index, total));
        let selected_first = selector.select(definitions(&first));
        let selected_second = selector.select(definitions(&second));
        prop_assert_eq!(selector.counter(), (first.len() + second.len()) as u64);

        let mut expected_first = first.clone();
        expected_first.sort();
        let mut expected_second = second.clone();
        expected_second.sort();
        let stream: Vec<String> = expected_first.into_iter().chain(expected_second).collect();
        let expected: Vec<String> = stream
            .into_iter()
            .enumerate()
            .filter(|(ordinal, _)| *ordinal as u64 % total == index)
            .map(|(_, name)| name)
            .collect();

        let actual: Vec<String> = names(&selected_first).into_iter().chain(names(&selected_second)).collect();
        prop_assert_eq!(actual, expected);
    }
}
