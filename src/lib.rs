//! # permutree
//!
//! An order-tolerant trie: values are stored under an ordered sequence of
//! keys and can be retrieved both by the exact path and by a query that
//! presents the same keys in a different order.
//!
//! Every node tracks the set of keys appearing anywhere in its subtree, so a
//! search can cross into a sibling branch that was built from a differently
//! ordered insertion of the same keys.
//!
//! ## Example
//!
//! ```rust
//! use permutree::PermutationTree;
//!
//! let mut tree: PermutationTree<&str, u32> = PermutationTree::new();
//! tree.insert(&["red", "round"], 1);
//!
//! // Exact insertion order works, and so does the reverse.
//! assert_eq!(tree.find_first(&["red", "round"]), Some(&[1][..]));
//! assert_eq!(tree.find_first(&["round", "red"]), Some(&[1][..]));
//! ```

use smallvec::SmallVec;
use std::collections::{btree_map, BTreeMap, BTreeSet};
use std::fmt;

// =============================================================================
// Node
// =============================================================================

/// One value per endpoint is the common case; spill to the heap past that.
type ValueList<V> = SmallVec<[V; 1]>;

#[derive(Clone)]
struct Node<K, V> {
    /// Values stored by insertions ending at this node, in insertion order.
    /// Empty means no value is stored here.
    values: ValueList<V>,
    /// Every key of every insertion whose path runs through this subtree,
    /// including keys already consumed above this node.
    subtree_keys: BTreeSet<K>,
    children: BTreeMap<K, Node<K, V>>,
}

impl<K: Ord, V> Node<K, V> {
    fn new() -> Self {
        Self {
            values: SmallVec::new(),
            subtree_keys: BTreeSet::new(),
            children: BTreeMap::new(),
        }
    }

    /// True iff every key of `keys` appears somewhere in this subtree.
    ///
    /// Pruning oracle only: the keys may sit on divergent branches, so a
    /// true result does not guarantee a consistent path exists below.
    fn covers(&self, keys: &[&K]) -> bool {
        keys.iter().all(|key| self.subtree_keys.contains(*key))
    }

    fn find_first<'t>(&'t self, remaining: &[&K], full: &[&K]) -> Option<&'t [V]> {
        let (head, rest) = remaining.split_first()?;

        // A child on the queried key always wins, and its result is final.
        if let Some(child) = self.children.get(*head) {
            if rest.is_empty() {
                return if child.values.is_empty() {
                    None
                } else {
                    Some(child.values.as_slice())
                };
            }
            return child.find_first(rest, full);
        }

        // No direct child: commit to the first sibling, in key order, whose
        // subtree still holds every queried key. Crossing its edge consumes
        // that key; the rest of the query is looked for below.
        for (key, child) in &self.children {
            if child.covers(full) {
                return child.find_first(&without(remaining, key), full);
            }
        }
        None
    }

    fn collect_all<'t>(&'t self, remaining: &[&K], full: &[&K], out: &mut Vec<&'t V>) {
        let Some((head, rest)) = remaining.split_first() else {
            return;
        };
        for (key, child) in &self.children {
            if key == *head {
                if rest.is_empty() {
                    child.dump_into(out);
                } else {
                    child.collect_all(rest, full, out);
                }
            } else if child.covers(full) {
                child.collect_all(&without(remaining, key), full, out);
            }
        }
    }

    /// Every value at this node and below: values first, then children in
    /// key order.
    fn dump_into<'t>(&'t self, out: &mut Vec<&'t V>) {
        out.extend(self.values.iter());
        for child in self.children.values() {
            child.dump_into(out);
        }
    }

    /// Direct-match descent; `None` as soon as a path key has no child.
    fn descend(&self, path: &[K]) -> Option<&Node<K, V>> {
        let mut node = self;
        for key in path {
            node = node.children.get(key)?;
        }
        Some(node)
    }
}

/// `seq` with the first occurrence of `key` removed, if present.
fn without<'q, K: Ord>(seq: &[&'q K], key: &K) -> Vec<&'q K> {
    let mut out = Vec::with_capacity(seq.len());
    let mut removed = false;
    for &k in seq {
        if !removed && k == key {
            removed = true;
        } else {
            out.push(k);
        }
    }
    out
}

// =============================================================================
// PermutationTree
// =============================================================================

/// A trie keyed by sequences of `K` that also answers queries presenting the
/// same keys in a different order.
///
/// Insertion records, at every node it touches, the set of keys appearing
/// anywhere below. Retrieval follows exact child matches where it can and
/// otherwise detours into the first sibling whose recorded key set still
/// covers the whole query.
///
/// [`find_first`](Self::find_first) commits to one branch per level and
/// never backtracks, so it can miss values that
/// [`collect_all`](Self::collect_all) finds.
#[derive(Clone)]
pub struct PermutationTree<K, V> {
    root: Node<K, V>,
    count: usize,
}

impl<K: Ord, V> PermutationTree<K, V> {
    pub fn new() -> Self {
        Self {
            root: Node::new(),
            count: 0,
        }
    }

    /// Number of values stored in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns the values stored at the first position consistent with the
    /// key set of `query`, or `None` if the search dead-ends.
    ///
    /// A child on the next queried key is always preferred; failing that,
    /// the search detours into the first child, in key order, whose subtree
    /// contains every queried key. Either way the chosen branch's outcome is
    /// final: `None` proves nothing about siblings that were never explored.
    pub fn find_first(&self, query: &[K]) -> Option<&[V]> {
        let keys: Vec<&K> = query.iter().collect();
        self.root.find_first(&keys, &keys)
    }

    /// Returns every value reachable under any subtree consistent with the
    /// key set of `query`, in visit order.
    ///
    /// Unlike [`find_first`](Self::find_first) this visits every candidate
    /// child at every level. Values below the queried position are included,
    /// and nothing is deduplicated or ranked.
    pub fn collect_all(&self, query: &[K]) -> Vec<&V> {
        let keys: Vec<&K> = query.iter().collect();
        let mut out = Vec::new();
        self.root.collect_all(&keys, &keys, &mut out);
        out
    }

    /// Values stored at the exact path `path`, with no order tolerance.
    pub fn get(&self, path: &[K]) -> Option<&[V]> {
        if path.is_empty() {
            return None;
        }
        let node = self.root.descend(path)?;
        if node.values.is_empty() {
            None
        } else {
            Some(node.values.as_slice())
        }
    }

    /// Every value in the tree, depth-first in key order.
    pub fn dump(&self) -> Vec<&V> {
        let mut out = Vec::new();
        self.root.dump_into(&mut out);
        out
    }

    /// Every value at or below the node reached by following `path`
    /// exactly. Empty for an empty or unmatched path.
    pub fn dump_at(&self, path: &[K]) -> Vec<&V> {
        let mut out = Vec::new();
        if path.is_empty() {
            return out;
        }
        if let Some(node) = self.root.descend(path) {
            node.dump_into(&mut out);
        }
        out
    }
}

impl<K: Ord + Clone, V> PermutationTree<K, V> {
    /// Appends `value` at the position reached by following `keys` from the
    /// root, creating nodes as needed. An empty `keys` is a no-op.
    ///
    /// The whole sequence, not the per-level suffix, is unioned into the
    /// recorded key set of every node on the path; that is what later lets
    /// a differently ordered query cross into this branch.
    pub fn insert(&mut self, keys: &[K], value: V) {
        if keys.is_empty() {
            return;
        }
        let mut node = &mut self.root;
        node.subtree_keys.extend(keys.iter().cloned());
        for key in keys {
            node = node.children.entry(key.clone()).or_insert_with(Node::new);
            node.subtree_keys.extend(keys.iter().cloned());
        }
        node.values.push(value);
        self.count += 1;
    }

    /// Iterates over `(key path, value)` pairs, depth-first in key order.
    /// A node holding several values yields one pair per value.
    pub fn iter(&self) -> Pairs<'_, K, V> {
        Pairs {
            frames: vec![Frame {
                values: self.root.values.iter(),
                children: self.root.children.iter(),
            }],
            path: Vec::new(),
        }
    }
}

impl<K: Ord, V> Default for PermutationTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for PermutationTree<K, V>
where
    K: Ord + Clone + fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

// =============================================================================
// Pair iteration
// =============================================================================

struct Frame<'t, K, V> {
    values: std::slice::Iter<'t, V>,
    children: btree_map::Iter<'t, K, Node<K, V>>,
}

/// Depth-first iterator over `(key path, value)` pairs.
pub struct Pairs<'t, K, V> {
    frames: Vec<Frame<'t, K, V>>,
    path: Vec<K>,
}

impl<'t, K: Ord + Clone, V> Iterator for Pairs<'t, K, V> {
    type Item = (Vec<K>, &'t V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.frames.last_mut()?;
            if let Some(value) = frame.values.next() {
                return Some((self.path.clone(), value));
            }
            match frame.children.next() {
                Some((key, child)) => {
                    self.path.push(key.clone());
                    self.frames.push(Frame {
                        values: child.values.iter(),
                        children: child.children.iter(),
                    });
                }
                None => {
                    self.frames.pop();
                    self.path.pop();
                }
            }
        }
    }
}

// =============================================================================
// String adapter
// =============================================================================

/// Convenience wrapper storing values under the characters of a string.
///
/// By default text is folded to lowercase before being split into `char`
/// keys, so `"Stop"` and `"POTS"` address the same key set.
pub struct StringTree<V> {
    tree: PermutationTree<char, V>,
    fold_case: bool,
}

impl<V> StringTree<V> {
    /// Case-insensitive adapter: folds text to lowercase before keying.
    pub fn new() -> Self {
        Self {
            tree: PermutationTree::new(),
            fold_case: true,
        }
    }

    /// Adapter that keys on characters exactly as written.
    pub fn case_sensitive() -> Self {
        Self {
            tree: PermutationTree::new(),
            fold_case: false,
        }
    }

    fn keys(&self, text: &str) -> Vec<char> {
        if self.fold_case {
            text.to_lowercase().chars().collect()
        } else {
            text.chars().collect()
        }
    }

    pub fn insert(&mut self, text: &str, value: V) {
        let keys = self.keys(text);
        self.tree.insert(&keys, value);
    }

    pub fn find_first(&self, text: &str) -> Option<&[V]> {
        self.tree.find_first(&self.keys(text))
    }

    pub fn collect_all(&self, text: &str) -> Vec<&V> {
        self.tree.collect_all(&self.keys(text))
    }

    pub fn get(&self, text: &str) -> Option<&[V]> {
        self.tree.get(&self.keys(text))
    }

    pub fn dump(&self) -> Vec<&V> {
        self.tree.dump()
    }

    pub fn dump_at(&self, text: &str) -> Vec<&V> {
        self.tree.dump_at(&self.keys(text))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}

impl<V> Default for StringTree<V> {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod proptests;
