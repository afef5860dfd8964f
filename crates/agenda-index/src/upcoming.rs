//! Array-backed binary min-heap of upcoming items.
//!
//! The queue has no decrease-key and no arbitrary delete. Owners that need
//! to drop or re-prioritize an entry rebuild the whole heap from their
//! source of truth with [`UpcomingQueue::rebuild`], which makes the queue a
//! point-in-time snapshot rather than a live view.

/// An item paired with the priority it is ordered by (lower comes first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scheduled<T> {
    /// Ordering key; for events this is the start timestamp in milliseconds.
    pub priority: i64,
    /// The queued item.
    pub data: T,
}

impl<T> Scheduled<T> {
    /// Pair `data` with `priority`.
    pub const fn new(priority: i64, data: T) -> Self {
        Self { priority, data }
    }
}

/// Binary min-heap keyed by [`Scheduled::priority`].
#[derive(Debug, Clone)]
pub struct UpcomingQueue<T> {
    heap: Vec<Scheduled<T>>,
}

impl<T> UpcomingQueue<T> {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self { heap: Vec::new() }
    }

    /// Push an item and restore the heap property by sifting it up.
    pub fn insert(&mut self, priority: i64, data: T) {
        self.heap.push(Scheduled::new(priority, data));
        if let Some(last) = self.heap.len().checked_sub(1) {
            self.sift_up(last);
        }
    }

    /// Remove and return the item with the lowest priority.
    pub fn extract_min(&mut self) -> Option<Scheduled<T>> {
        let last = self.heap.len().checked_sub(1)?;
        self.heap.swap(0, last);
        let min = self.heap.pop();
        self.sift_down(0);
        min
    }

    /// The item with the lowest priority, without removing it.
    pub fn peek(&self) -> Option<&Scheduled<T>> {
        self.heap.first()
    }

    /// Replace the contents with `items`, heapifying bottom-up in O(n).
    pub fn rebuild(&mut self, items: impl IntoIterator<Item = Scheduled<T>>) {
        self.heap = items.into_iter().collect();
        for i in (0..self.heap.len() / 2).rev() {
            self.sift_down(i);
        }
    }

    /// Snapshot of every item in ascending priority order.
    pub fn sorted(&self) -> Vec<&Scheduled<T>> {
        let mut out: Vec<&Scheduled<T>> = self.heap.iter().collect();
        out.sort_by_key(|item| item.priority);
        out
    }

    /// The backing array in heap order.
    pub fn as_slice(&self) -> &[Scheduled<T>] {
        &self.heap
    }

    /// Number of queued items.
    pub const fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether the queue is empty.
    pub const fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drop every queued item.
    pub fn clear(&mut self) {
        self.heap.clear();
    }

    fn less(&self, a: usize, b: usize) -> bool {
        match (self.heap.get(a), self.heap.get(b)) {
            (Some(x), Some(y)) => x.priority < y.priority,
            _ => false,
        }
    }

    fn sift_up(&mut self, mut i: usize) {
        while let Some(parent) = i.checked_sub(1).map(|p| p / 2) {
            if !self.less(i, parent) {
                break;
            }
            self.heap.swap(i, parent);
            i = parent;
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        loop {
            let Some(left) = i.checked_mul(2).and_then(|d| d.checked_add(1)) else {
                break;
            };
            let mut smallest = i;
            if self.less(left, smallest) {
                smallest = left;
            }
            if let Some(right) = left.checked_add(1)
                && self.less(right, smallest)
            {
                smallest = right;
            }
            if smallest == i {
                break;
            }
            self.heap.swap(i, smallest);
            i = smallest;
        }
    }
}

impl<T> Default for UpcomingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
