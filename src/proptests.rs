use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeMap;

/// Walks the whole tree checking the aggregated-key bookkeeping and the
/// value accounting that every search relies on.
fn validate_tree<K, V>(tree: &PermutationTree<K, V>)
where
    K: Ord + std::fmt::Debug,
{
    fn walk<K, V>(node: &Node<K, V>) -> usize
    where
        K: Ord + std::fmt::Debug,
    {
        let mut stored = node.values.len();
        for (key, child) in &node.children {
            assert!(
                node.subtree_keys.contains(key),
                "edge key {key:?} missing from the parent's aggregated set"
            );
            assert!(
                child.subtree_keys.is_subset(&node.subtree_keys),
                "child aggregated set not covered by the parent's"
            );
            stored += walk(child);
        }
        stored
    }

    assert!(tree.root.values.is_empty(), "root must not store values");
    assert_eq!(
        walk(&tree.root),
        tree.count,
        "stored values must match len()"
    );
}

fn permutations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    if items.is_empty() {
        return vec![Vec::new()];
    }
    let mut out = Vec::new();
    for i in 0..items.len() {
        let mut rest = items.to_vec();
        let picked = rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, picked.clone());
            out.push(tail);
        }
    }
    out
}

/// Duplicate-free key sequence in random order over a small alphabet, so
/// that generated batches collide across branches often.
fn key_seq() -> impl Strategy<Value = Vec<u8>> + Clone {
    prop::sample::subsequence((0u8..8).collect::<Vec<_>>(), 0..=5).prop_shuffle()
}

#[derive(Debug, Clone, Arbitrary)]
struct Entry {
    #[proptest(strategy = "key_seq()")]
    keys: Vec<u8>,
    value: u32,
}

fn entries() -> impl Strategy<Value = Vec<Entry>> {
    prop::collection::vec(any::<Entry>(), 0..=40)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_exact_paths_match_model(entries in entries()) {
        let mut tree: PermutationTree<u8, u32> = PermutationTree::new();
        let mut model: BTreeMap<Vec<u8>, Vec<u32>> = BTreeMap::new();

        for entry in &entries {
            tree.insert(&entry.keys, entry.value);
            if !entry.keys.is_empty() {
                model.entry(entry.keys.clone()).or_default().push(entry.value);
            }
        }

        validate_tree(&tree);
        prop_assert_eq!(tree.len(), model.values().map(Vec::len).sum::<usize>());
        prop_assert_eq!(tree.find_first(&[]), None);

        for (seq, values) in &model {
            // The exact path exists, so direct matches carry the search all
            // the way down and the endpoint list comes back verbatim.
            prop_assert_eq!(tree.get(seq), Some(&values[..]));
            prop_assert_eq!(tree.find_first(seq), Some(&values[..]));

            let collected = tree.collect_all(seq);
            for value in values {
                prop_assert!(collected.contains(&value));
            }
        }

        let mut got: Vec<u32> = tree.dump().into_iter().copied().collect();
        got.sort_unstable();
        let mut expected: Vec<u32> = model.values().flatten().copied().collect();
        expected.sort_unstable();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_lone_insertion_found_under_any_order(
        keys in key_seq().prop_filter("non-empty", |keys| !keys.is_empty()),
        value in any::<u32>(),
    ) {
        let mut tree: PermutationTree<u8, u32> = PermutationTree::new();
        tree.insert(&keys, value);
        validate_tree(&tree);

        // With a single stored sequence the aggregated sets cannot lead the
        // search into an unrelated branch, so every ordering must succeed.
        for query in permutations(&keys) {
            prop_assert_eq!(tree.find_first(&query), Some(&[value][..]));
            prop_assert!(tree.collect_all(&query).contains(&&value));
        }
    }

    #[test]
    fn prop_empty_insertions_are_invisible(entries in entries()) {
        let mut plain: PermutationTree<u8, u32> = PermutationTree::new();
        let mut noisy: PermutationTree<u8, u32> = PermutationTree::new();

        for entry in &entries {
            plain.insert(&entry.keys, entry.value);
            noisy.insert(&[], entry.value);
            noisy.insert(&entry.keys, entry.value);
        }
        noisy.insert(&[], 0);

        prop_assert_eq!(plain.len(), noisy.len());
        prop_assert_eq!(plain.dump(), noisy.dump());
        for entry in &entries {
            prop_assert_eq!(
                plain.find_first(&entry.keys),
                noisy.find_first(&entry.keys)
            );
        }
    }

    #[test]
    fn prop_pair_iteration_matches_dump(entries in entries()) {
        let mut tree: PermutationTree<u8, u32> = PermutationTree::new();
        for entry in &entries {
            tree.insert(&entry.keys, entry.value);
        }

        // Same depth-first visit, so the values line up one to one, and
        // every yielded path leads back to its value.
        let pairs: Vec<(Vec<u8>, &u32)> = tree.iter().collect();
        let dumped = tree.dump();
        prop_assert_eq!(pairs.len(), dumped.len());
        for ((path, value), dumped_value) in pairs.iter().zip(&dumped) {
            prop_assert_eq!(*value, *dumped_value);
            let at_path = tree.get(path);
            prop_assert!(at_path.is_some_and(|list| list.contains(*value)));
        }
    }
}
