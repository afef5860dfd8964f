//! Case-insensitive prefix tree for name autocomplete.
//!
//! Words are lowercased before they touch the tree. Every node passed
//! through by an insert bumps its `frequency`, which ranks siblings during
//! collection; it is a popularity signal, not a count of distinct words,
//! and deletes leave it alone. A terminal node holds the payload of the
//! last word inserted at it.

use std::collections::BTreeMap;

/// Default number of results returned by [`NameTrie::search`].
pub const DEFAULT_SEARCH_LIMIT: usize = 50;

#[derive(Debug, Clone)]
struct TrieNode<T> {
    children: BTreeMap<char, TrieNode<T>>,
    data: Option<T>,
    frequency: u32,
}

impl<T> TrieNode<T> {
    const fn new() -> Self {
        Self {
            children: BTreeMap::new(),
            data: None,
            frequency: 0,
        }
    }
}

/// Lowercased character trie carrying one payload per word.
#[derive(Debug, Clone)]
pub struct NameTrie<T> {
    root: TrieNode<T>,
    len: usize,
}

impl<T> NameTrie<T> {
    /// Create an empty trie.
    pub const fn new() -> Self {
        Self {
            root: TrieNode::new(),
            len: 0,
        }
    }

    /// Insert `word` with its payload, returning the payload it replaced.
    pub fn insert(&mut self, word: &str, data: T) -> Option<T> {
        let mut node = &mut self.root;
        for c in word.to_lowercase().chars() {
            node = node.children.entry(c).or_insert_with(TrieNode::new);
            node.frequency = node.frequency.saturating_add(1);
        }
        let previous = node.data.replace(data);
        if previous.is_none() {
            self.len = self.len.saturating_add(1);
        }
        previous
    }

    /// The payload stored for exactly `word`.
    pub fn get(&self, word: &str) -> Option<&T> {
        self.descend(word)?.data.as_ref()
    }

    /// Payloads of every word beginning with `prefix`, capped at
    /// [`DEFAULT_SEARCH_LIMIT`].
    pub fn search(&self, prefix: &str) -> Vec<&T> {
        self.search_limited(prefix, DEFAULT_SEARCH_LIMIT)
    }

    /// Payloads of every word beginning with `prefix`, at most `limit`.
    ///
    /// Collection is depth-first; at each node the word ending there comes
    /// first, then children in descending `frequency` order.
    pub fn search_limited(&self, prefix: &str, limit: usize) -> Vec<&T> {
        let mut out = Vec::new();
        if let Some(node) = self.descend(prefix) {
            collect(node, limit, &mut out);
        }
        out
    }

    /// Whether any inserted word begins with `prefix`.
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.descend(prefix).is_some()
    }

    /// Remove `word`, pruning nodes left with neither children nor payload.
    pub fn delete(&mut self, word: &str) -> Option<T> {
        let lowered = word.to_lowercase();
        let mut removed = None;
        remove(&mut self.root, lowered.chars(), &mut removed);
        if removed.is_some() {
            self.len = self.len.saturating_sub(1);
        }
        removed
    }

    /// Every payload in the trie, uncapped.
    pub fn all(&self) -> Vec<&T> {
        let mut out = Vec::with_capacity(self.len);
        collect(&self.root, usize::MAX, &mut out);
        out
    }

    /// Number of words stored.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether no words are stored.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Remove every word.
    pub fn clear(&mut self) {
        self.root = TrieNode::new();
        self.len = 0;
    }

    fn descend(&self, prefix: &str) -> Option<&TrieNode<T>> {
        let mut node = &self.root;
        for c in prefix.to_lowercase().chars() {
            node = node.children.get(&c)?;
        }
        Some(node)
    }
}

impl<T> Default for NameTrie<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn collect<'a, T>(node: &'a TrieNode<T>, limit: usize, out: &mut Vec<&'a T>) {
    if out.len() >= limit {
        return;
    }
    if let Some(data) = &node.data {
        out.push(data);
    }

    let mut children: Vec<&TrieNode<T>> = node.children.values().collect();
    children.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    for child in children {
        if out.len() >= limit {
            break;
        }
        collect(child, limit, out);
    }
}

/// Returns whether `node` is now empty and should be pruned by its parent.
fn remove<T>(node: &mut TrieNode<T>, mut chars: std::str::Chars<'_>, removed: &mut Option<T>) -> bool {
    let Some(c) = chars.next() else {
        *removed = node.data.take();
        return removed.is_some() && node.children.is_empty();
    };
    let Some(child) = node.children.get_mut(&c) else {
        return false;
    };
    if remove(child, chars, removed) {
        node.children.remove(&c);
        return node.children.is_empty() && node.data.is_none();
    }
    false
}
