//! Augmented AVL interval tree for overlap and conflict detection.
//!
//! Nodes are ordered by `(start, end)` and each caches `max`, the largest
//! `end` anywhere in its subtree. After every structural insert or delete
//! the path back to the root is rebalanced so that sibling heights differ
//! by at most one, and `max` is recomputed bottom-up after every rotation.
//!
//! Intervals are half-open: `[a, b)` and `[c, d)` overlap iff
//! `a < d && c < b`, so touching endpoints never conflict.
//!
//! Deletion is by payload identity rather than by interval key, using a
//! key-blind descent that visits the left subtree before the right.

use crate::Identified;

type Link<T> = Option<Box<Node<T>>>;

#[derive(Debug)]
struct Node<T> {
    start: i64,
    end: i64,
    /// Largest `end` in this subtree.
    max: i64,
    height: usize,
    data: T,
    left: Link<T>,
    right: Link<T>,
}

impl<T> Node<T> {
    const fn leaf(start: i64, end: i64, data: T) -> Self {
        Self {
            start,
            end,
            max: end,
            height: 1,
            data,
            left: None,
            right: None,
        }
    }
}

/// Half-open overlap test: `[a, b)` and `[c, d)` share at least one instant.
pub const fn overlaps(a: i64, b: i64, c: i64, d: i64) -> bool {
    a < d && c < b
}

/// Height-balanced interval tree carrying a payload per interval.
#[derive(Debug)]
pub struct IntervalIndex<T> {
    root: Link<T>,
    len: usize,
}

impl<T: Identified> IntervalIndex<T> {
    /// Create an empty index.
    pub const fn new() -> Self {
        Self { root: None, len: 0 }
    }

    /// Insert the interval `[start, end)` with its payload.
    ///
    /// Equal `(start, end)` keys are kept side by side; a duplicate descends
    /// to the right of its twin.
    pub fn insert(&mut self, start: i64, end: i64, data: T) {
        self.root = Some(insert(self.root.take(), start, end, data));
        self.len = self.len.saturating_add(1);
    }

    /// Every stored payload whose interval overlaps `[start, end)`.
    ///
    /// Order is unspecified. Subtrees whose `max <= start` are skipped, and
    /// the right subtree is skipped once a node starts at or after `end`.
    pub fn find_overlapping(&self, start: i64, end: i64) -> Vec<&T> {
        let mut out = Vec::new();
        find_overlapping(self.root.as_deref(), start, end, &mut out);
        out
    }

    /// Payloads whose interval starts inside `lo..=hi`, ascending.
    pub fn range_query(&self, lo: i64, hi: i64) -> Vec<&T> {
        let mut out = Vec::new();
        range_query(self.root.as_deref(), lo, hi, &mut out);
        out
    }

    /// Remove the interval whose payload has the given identity.
    ///
    /// Returns `false` when no payload matches.
    pub fn delete(&mut self, id: &T::Id) -> bool {
        let mut removed = None;
        self.root = remove(self.root.take(), id, &mut removed);
        let found = removed.is_some();
        if found {
            self.len = self.len.saturating_sub(1);
        }
        found
    }

    /// All payloads ordered by `(start, end)`.
    pub fn iter_sorted(&self) -> Vec<&T> {
        let mut out = Vec::with_capacity(self.len);
        collect_sorted(self.root.as_deref(), &mut out);
        out
    }

    /// Every unordered pair of overlapping intervals.
    ///
    /// Pairs are enumerated over the sorted order with the earlier-sorted
    /// interval first and are never repeated. The inner scan stops once a
    /// candidate starts at or after the outer interval's end, but the worst
    /// case (everything overlapping everything) remains O(n^2).
    pub fn find_all_conflicts(&self) -> Vec<(&T, &T)> {
        let mut sorted = Vec::with_capacity(self.len);
        collect_nodes(self.root.as_deref(), &mut sorted);

        let mut pairs = Vec::new();
        for (i, a) in sorted.iter().enumerate() {
            for b in sorted.iter().skip(i.saturating_add(1)) {
                if b.start >= a.end {
                    break;
                }
                if overlaps(a.start, a.end, b.start, b.end) {
                    pairs.push((&a.data, &b.data));
                }
            }
        }
        pairs
    }
}

impl<T> IntervalIndex<T> {
    /// Number of stored intervals.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the index is empty.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Height of the tree (0 when empty).
    pub fn height(&self) -> usize {
        height(self.root.as_ref())
    }

    /// Remove every interval.
    pub fn clear(&mut self) {
        self.root = None;
        self.len = 0;
    }
}

impl<T: Identified> Default for IntervalIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Balancing
// ---------------------------------------------------------------------------

fn height<T>(link: Option<&Box<Node<T>>>) -> usize {
    link.map_or(0, |node| node.height)
}

/// Recompute `height` and `max` from the node's children.
fn update<T>(node: &mut Node<T>) {
    let hl = height(node.left.as_ref());
    let hr = height(node.right.as_ref());
    node.height = hl.max(hr).saturating_add(1);

    let mut max = node.end;
    if let Some(left) = &node.left {
        max = max.max(left.max);
    }
    if let Some(right) = &node.right {
        max = max.max(right.max);
    }
    node.max = max;
}

fn rotate_right<T>(mut y: Box<Node<T>>) -> Box<Node<T>> {
    let Some(mut x) = y.left.take() else {
        return y;
    };
    y.left = x.right.take();
    update(&mut y);
    x.right = Some(y);
    update(&mut x);
    x
}

fn rotate_left<T>(mut x: Box<Node<T>>) -> Box<Node<T>> {
    let Some(mut y) = x.right.take() else {
        return x;
    };
    x.right = y.left.take();
    update(&mut x);
    y.left = Some(x);
    update(&mut y);
    y
}

/// Restore the AVL property at `node`, assuming both subtrees already
/// satisfy it and their heights differ by at most two.
fn rebalance<T>(mut node: Box<Node<T>>) -> Box<Node<T>> {
    update(&mut node);
    let hl = height(node.left.as_ref());
    let hr = height(node.right.as_ref());

    if hl > hr.saturating_add(1) {
        if let Some(left) = node.left.take() {
            let left_leans_right = height(left.left.as_ref()) < height(left.right.as_ref());
            node.left = Some(if left_leans_right {
                rotate_left(left)
            } else {
                left
            });
        }
        return rotate_right(node);
    }

    if hr > hl.saturating_add(1) {
        if let Some(right) = node.right.take() {
            let right_leans_left = height(right.left.as_ref()) > height(right.right.as_ref());
            node.right = Some(if right_leans_left {
                rotate_right(right)
            } else {
                right
            });
        }
        return rotate_left(node);
    }

    node
}

// ---------------------------------------------------------------------------
// Structural operations
// ---------------------------------------------------------------------------

fn insert<T>(link: Link<T>, start: i64, end: i64, data: T) -> Box<Node<T>> {
    let Some(mut node) = link else {
        return Box::new(Node::leaf(start, end, data));
    };
    if (start, end) < (node.start, node.end) {
        node.left = Some(insert(node.left.take(), start, end, data));
    } else {
        node.right = Some(insert(node.right.take(), start, end, data));
    }
    rebalance(node)
}

fn remove<T: Identified>(link: Link<T>, id: &T::Id, removed: &mut Option<T>) -> Link<T> {
    let mut node = link?;

    if node.data.identity() == id {
        let replacement = match (node.left.take(), node.right.take()) {
            (None, None) => None,
            (Some(child), None) | (None, Some(child)) => Some(child),
            (Some(left), Some(right)) => {
                let (mut successor, rest) = take_min(right);
                successor.left = Some(left);
                successor.right = rest;
                Some(rebalance(successor))
            }
        };
        let Node { data, .. } = *node;
        *removed = Some(data);
        return replacement;
    }

    node.left = remove(node.left.take(), id, removed);
    if removed.is_none() {
        node.right = remove(node.right.take(), id, removed);
    }
    Some(rebalance(node))
}

/// Detach the minimum node of a subtree, rebalancing on the way back up.
fn take_min<T>(mut node: Box<Node<T>>) -> (Box<Node<T>>, Link<T>) {
    match node.left.take() {
        None => {
            let rest = node.right.take();
            (node, rest)
        }
        Some(left) => {
            let (min, rest) = take_min(left);
            node.left = rest;
            (min, Some(rebalance(node)))
        }
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

fn find_overlapping<'a, T>(node: Option<&'a Node<T>>, start: i64, end: i64, out: &mut Vec<&'a T>) {
    let Some(node) = node else {
        return;
    };
    if node.max <= start {
        return;
    }

    find_overlapping(node.left.as_deref(), start, end, out);

    if overlaps(node.start, node.end, start, end) {
        out.push(&node.data);
    }

    if node.start >= end {
        return;
    }

    find_overlapping(node.right.as_deref(), start, end, out);
}

fn range_query<'a, T>(node: Option<&'a Node<T>>, lo: i64, hi: i64, out: &mut Vec<&'a T>) {
    let Some(node) = node else {
        return;
    };
    if node.start > lo {
        range_query(node.left.as_deref(), lo, hi, out);
    }
    if (lo..=hi).contains(&node.start) {
        out.push(&node.data);
    }
    if node.start < hi {
        range_query(node.right.as_deref(), lo, hi, out);
    }
}

fn collect_nodes<'a, T>(node: Option<&'a Node<T>>, out: &mut Vec<&'a Node<T>>) {
    if let Some(node) = node {
        collect_nodes(node.left.as_deref(), out);
        out.push(node);
        collect_nodes(node.right.as_deref(), out);
    }
}

fn collect_sorted<'a, T>(node: Option<&'a Node<T>>, out: &mut Vec<&'a T>) {
    if let Some(node) = node {
        collect_sorted(node.left.as_deref(), out);
        out.push(&node.data);
        collect_sorted(node.right.as_deref(), out);
    }
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Slot {
        id: u32,
        start: i64,
        end: i64,
    }

    impl Identified for Slot {
        type Id = u32;

        fn identity(&self) -> &u32 {
            &self.id
        }
    }

    fn slot(id: u32, start: i64, end: i64) -> Slot {
        Slot { id, start, end }
    }

    fn insert_slot(index: &mut IntervalIndex<Slot>, s: Slot) {
        index.insert(s.start, s.end, s);
    }

    /// Walk the tree checking AVL balance, cached heights and `max`.
    /// Returns `(height, max)` of the subtree.
    fn audit(node: Option<&Node<Slot>>) -> (usize, i64) {
        let Some(node) = node else {
            return (0, i64::MIN);
        };
        let (hl, ml) = audit(node.left.as_deref());
        let (hr, mr) = audit(node.right.as_deref());
        assert!(hl.abs_diff(hr) <= 1, "unbalanced at {}", node.data.id);
        assert_eq!(node.height, hl.max(hr) + 1);
        assert_eq!(node.max, node.end.max(ml).max(mr));
        if let Some(left) = node.left.as_deref() {
            assert!((left.start, left.end) <= (node.start, node.end));
        }
        if let Some(right) = node.right.as_deref() {
            assert!((right.start, right.end) >= (node.start, node.end));
        }
        (node.height, node.max)
    }

    fn ids(found: &[&Slot]) -> Vec<u32> {
        let mut ids: Vec<u32> = found.iter().map(|s| s.id).collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn touching_endpoints_do_not_overlap() {
        assert!(!overlaps(10, 20, 20, 30));
        assert!(overlaps(10, 20, 19, 30));
        assert!(overlaps(10, 20, 12, 15));
    }

    #[test]
    fn overlapping_pair_is_found_excluding_self() {
        let mut index = IntervalIndex::new();
        insert_slot(&mut index, slot(1, 10, 20));
        insert_slot(&mut index, slot(2, 15, 25));

        let hits = index.find_overlapping(10, 20);
        let others: Vec<&Slot> = hits.into_iter().filter(|s| s.id != 1).collect();
        assert_eq!(ids(&others), vec![2]);
    }

    #[test]
    fn empty_index_never_fails() {
        let mut index: IntervalIndex<Slot> = IntervalIndex::new();
        assert!(index.find_overlapping(0, 100).is_empty());
        assert!(index.find_all_conflicts().is_empty());
        assert!(!index.delete(&42));
        assert_eq!(index.height(), 0);
    }

    #[test]
    fn ascending_inserts_stay_balanced() {
        let mut index = IntervalIndex::new();
        for i in 0..1024_u32 {
            let start = i64::from(i) * 10;
            insert_slot(&mut index, slot(i, start, start + 5));
        }
        audit(index.root.as_deref());
        // A perfectly balanced tree of 1024 nodes has height 11.
        assert!(index.height() <= 12);
        assert_eq!(index.len(), 1024);
    }

    #[test]
    fn delete_by_identity_rebalances() {
        let mut index = IntervalIndex::new();
        for i in 0..64_u32 {
            let start = i64::from(i);
            insert_slot(&mut index, slot(i, start, start + 100));
        }
        for i in (0..64_u32).step_by(2) {
            assert!(index.delete(&i));
            audit(index.root.as_deref());
        }
        assert!(!index.delete(&0));
        assert_eq!(index.len(), 32);
        let sorted: Vec<u32> = index.iter_sorted().iter().map(|s| s.id).collect();
        let expected: Vec<u32> = (0..64).filter(|i| i % 2 == 1).collect();
        assert_eq!(sorted, expected);
    }

    #[test]
    fn duplicate_intervals_are_kept_and_deleted_individually() {
        let mut index = IntervalIndex::new();
        insert_slot(&mut index, slot(1, 10, 20));
        insert_slot(&mut index, slot(2, 10, 20));
        insert_slot(&mut index, slot(3, 10, 20));
        assert_eq!(ids(&index.find_overlapping(0, 100)), vec![1, 2, 3]);
        assert!(index.delete(&2));
        assert_eq!(ids(&index.find_overlapping(0, 100)), vec![1, 3]);
        audit(index.root.as_deref());
    }

    #[test]
    fn all_conflicts_lists_each_pair_once() {
        let mut index = IntervalIndex::new();
        insert_slot(&mut index, slot(1, 0, 10));
        insert_slot(&mut index, slot(2, 5, 15));
        insert_slot(&mut index, slot(3, 10, 20));
        insert_slot(&mut index, slot(4, 30, 40));

        let pairs: Vec<(u32, u32)> = index
            .find_all_conflicts()
            .into_iter()
            .map(|(a, b)| (a.id, b.id))
            .collect();
        assert_eq!(pairs, vec![(1, 2), (2, 3)]);
    }

    #[test]
    fn range_query_selects_by_start() {
        let mut index = IntervalIndex::new();
        insert_slot(&mut index, slot(1, 0, 100));
        insert_slot(&mut index, slot(2, 50, 60));
        insert_slot(&mut index, slot(3, 70, 80));
        let found: Vec<u32> = index.range_query(40, 70).iter().map(|s| s.id).collect();
        assert_eq!(found, vec![2, 3]);
    }

    #[test]
    fn randomized_overlap_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut index = IntervalIndex::new();
        let mut live: Vec<Slot> = Vec::new();

        for id in 0..400_u32 {
            let start = rng.random_range(0..10_000_i64);
            let len = rng.random_range(1..500_i64);
            let s = slot(id, start, start + len);
            live.push(s.clone());
            insert_slot(&mut index, s);

            if rng.random_bool(0.3) && !live.is_empty() {
                let victim = live.swap_remove(rng.random_range(0..live.len()));
                assert!(index.delete(&victim.id));
            }
        }
        audit(index.root.as_deref());
        assert_eq!(index.len(), live.len());

        for _ in 0..200 {
            let qs = rng.random_range(0..10_000_i64);
            let qe = qs + rng.random_range(1..800_i64);
            let mut expected: Vec<u32> = live
                .iter()
                .filter(|s| overlaps(s.start, s.end, qs, qe))
                .map(|s| s.id)
                .collect();
            expected.sort_unstable();
            assert_eq!(ids(&index.find_overlapping(qs, qe)), expected);
        }

        let brute_pairs = live
            .iter()
            .enumerate()
            .flat_map(|(i, a)| live.iter().skip(i + 1).map(move |b| (a, b)))
            .filter(|(a, b)| overlaps(a.start, a.end, b.start, b.end))
            .count();
        assert_eq!(index.find_all_conflicts().len(), brute_pairs);
    }
}
