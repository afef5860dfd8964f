//! Unbalanced binary search tree keyed by start time.
//!
//! [`OrderedIndex`] answers sorted snapshots and inclusive range queries.
//! There is no balancing discipline: insertion order decides the shape, so
//! adversarial (already sorted) input degrades every operation to O(n).
//! Descents and traversals are iterative and [`Drop`] unlinks nodes one by
//! one, so a degenerate chain never exhausts the call stack.
//!
//! Equal keys overwrite: the last writer wins and the previous value is
//! handed back from [`OrderedIndex::insert`].

use std::cmp::Ordering;

type Link<K, V> = Option<Box<Node<K, V>>>;

#[derive(Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    left: Link<K, V>,
    right: Link<K, V>,
}

impl<K, V> Node<K, V> {
    const fn leaf(key: K, value: V) -> Self {
        Self {
            key,
            value,
            left: None,
            right: None,
        }
    }
}

/// Binary search tree mapping ordered keys to values.
#[derive(Debug)]
pub struct OrderedIndex<K, V> {
    root: Link<K, V>,
    len: usize,
}

impl<K: Ord, V> OrderedIndex<K, V> {
    /// Create an empty index.
    pub const fn new() -> Self {
        Self { root: None, len: 0 }
    }

    /// Insert `value` under `key`.
    ///
    /// Returns the value previously stored under an equal key, which is
    /// replaced in place (no duplicate-key branching).
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let mut link = &mut self.root;
        while let Some(node) = link {
            match key.cmp(&node.key) {
                Ordering::Less => link = &mut node.left,
                Ordering::Greater => link = &mut node.right,
                Ordering::Equal => return Some(std::mem::replace(&mut node.value, value)),
            }
        }
        *link = Some(Box::new(Node::leaf(key, value)));
        self.len = self.len.saturating_add(1);
        None
    }

    /// Look up the value stored under exactly `key`.
    pub fn search(&self, key: &K) -> Option<&V> {
        let mut cur = self.root.as_deref();
        while let Some(node) = cur {
            cur = match key.cmp(&node.key) {
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => node.right.as_deref(),
                Ordering::Equal => return Some(&node.value),
            };
        }
        None
    }

    /// Whether a value is stored under `key`.
    pub fn contains(&self, key: &K) -> bool {
        self.search(key).is_some()
    }

    /// Remove the entry stored under `key` and return its value.
    ///
    /// A node with two children is replaced by its in-order successor
    /// (the minimum of its right subtree).
    pub fn delete(&mut self, key: &K) -> Option<V> {
        let mut link = &mut self.root;
        while link.as_ref().is_some_and(|node| node.key != *key) {
            let node = link.as_mut()?;
            link = if *key < node.key {
                &mut node.left
            } else {
                &mut node.right
            };
        }

        let mut target = link.take()?;
        *link = match (target.left.take(), target.right.take()) {
            (None, None) => None,
            (Some(child), None) | (None, Some(child)) => Some(child),
            (Some(left), Some(right)) => {
                let (mut successor, rest) = detach_min(right);
                successor.left = Some(left);
                successor.right = rest;
                Some(successor)
            }
        };
        self.len = self.len.saturating_sub(1);
        Some(target.value)
    }

    /// Values whose key lies in `lo..=hi`, in ascending key order.
    ///
    /// The left subtree is visited only while `node.key > lo` and the right
    /// subtree only while `node.key < hi`.
    pub fn range_query(&self, lo: &K, hi: &K) -> Vec<&V> {
        let mut out = Vec::new();
        let mut stack: Vec<&Node<K, V>> = Vec::new();
        let mut cur = self.root.as_deref();
        loop {
            while let Some(node) = cur {
                stack.push(node);
                cur = if node.key > *lo {
                    node.left.as_deref()
                } else {
                    None
                };
            }
            let Some(node) = stack.pop() else {
                break;
            };
            if *lo <= node.key && node.key <= *hi {
                out.push(&node.value);
            }
            cur = if node.key < *hi {
                node.right.as_deref()
            } else {
                None
            };
        }
        out
    }

    /// Full in-order snapshot of the stored values.
    pub fn to_vec(&self) -> Vec<&V> {
        let mut out = Vec::with_capacity(self.len);
        let mut stack: Vec<&Node<K, V>> = Vec::new();
        let mut cur = self.root.as_deref();
        loop {
            while let Some(node) = cur {
                stack.push(node);
                cur = node.left.as_deref();
            }
            let Some(node) = stack.pop() else {
                break;
            };
            out.push(&node.value);
            cur = node.right.as_deref();
        }
        out
    }

    /// Entry with the smallest key.
    pub fn min(&self) -> Option<(&K, &V)> {
        let mut node = self.root.as_deref()?;
        while let Some(left) = node.left.as_deref() {
            node = left;
        }
        Some((&node.key, &node.value))
    }

    /// Entry with the largest key.
    pub fn max(&self) -> Option<(&K, &V)> {
        let mut node = self.root.as_deref()?;
        while let Some(right) = node.right.as_deref() {
            node = right;
        }
        Some((&node.key, &node.value))
    }

    /// Number of nodes on the longest root-to-leaf path (0 when empty).
    pub fn height(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(&Node<K, V>, usize)> = Vec::new();
        if let Some(root) = self.root.as_deref() {
            stack.push((root, 1));
        }
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            let next = depth.saturating_add(1);
            if let Some(left) = node.left.as_deref() {
                stack.push((left, next));
            }
            if let Some(right) = node.right.as_deref() {
                stack.push((right, next));
            }
        }
        deepest
    }
}

impl<K, V> OrderedIndex<K, V> {
    /// Number of stored entries.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the index holds no entries.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        unlink(self.root.take());
        self.len = 0;
    }
}

impl<K: Ord, V> Default for OrderedIndex<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Drop for OrderedIndex<K, V> {
    fn drop(&mut self) {
        unlink(self.root.take());
    }
}

/// Split off the minimum node of a subtree, returning it and the remainder.
fn detach_min<K, V>(mut root: Box<Node<K, V>>) -> (Box<Node<K, V>>, Link<K, V>) {
    let mut link = &mut root.left;
    while link.as_ref().is_some_and(|node| node.left.is_some()) {
        // Move the cursor out so no borrow of the old slot survives the step.
        let cursor = link;
        link = match cursor {
            Some(node) => &mut node.left,
            empty => empty,
        };
    }
    match link.take() {
        Some(mut min) => {
            *link = min.right.take();
            (min, Some(root))
        }
        None => {
            let rest = root.right.take();
            (root, rest)
        }
    }
}

/// Free a subtree without recursion.
fn unlink<K, V>(root: Link<K, V>) {
    let mut pending: Vec<Box<Node<K, V>>> = root.into_iter().collect();
    while let Some(mut node) = pending.pop() {
        pending.extend(node.left.take());
        pending.extend(node.right.take());
    }
}
