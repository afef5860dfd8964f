//! Separate-chaining hash table with a polynomial rolling hash.
//!
//! Keys are hashed with the 32-bit rolling hash `h = h * 31 + c` over their
//! UTF-16 code units (wrapping), then folded onto the bucket array with a
//! remainder. Buckets are plain vectors scanned linearly. The table starts
//! with 16 buckets and doubles, rehashing every entry, whenever an insert
//! of a new key finds the load factor at or above 0.75.

use agenda_types::EventId;

const INITIAL_BUCKETS: usize = 16;

/// Keys that can be hashed with the 32-bit polynomial rolling hash.
pub trait RollingKey: Eq {
    /// The 32-bit rolling hash of this key.
    fn rolling_hash(&self) -> u32;
}

/// Fold UTF-16 code units into the rolling hash `h = h * 31 + c`.
pub fn rolling_hash(units: impl IntoIterator<Item = u16>) -> u32 {
    units.into_iter().fold(0_u32, |hash, unit| {
        hash.wrapping_mul(31).wrapping_add(u32::from(unit))
    })
}

impl RollingKey for String {
    fn rolling_hash(&self) -> u32 {
        rolling_hash(self.encode_utf16())
    }
}

impl RollingKey for EventId {
    /// Hashes the lowercase hyphenated form, the same text the id has on
    /// the wire.
    fn rolling_hash(&self) -> u32 {
        let mut buf = uuid::Uuid::encode_buffer();
        let text = self.into_inner().hyphenated().encode_lower(&mut buf);
        rolling_hash(text.encode_utf16())
    }
}

/// Chained hash map from `K` to `V`.
#[derive(Debug, Clone)]
pub struct IdentityIndex<K, V> {
    buckets: Vec<Vec<(K, V)>>,
    len: usize,
}

impl<K: RollingKey, V> IdentityIndex<K, V> {
    /// Create an empty table with 16 buckets.
    pub fn new() -> Self {
        Self {
            buckets: empty_buckets(INITIAL_BUCKETS),
            len: 0,
        }
    }

    /// Insert or replace the value for `key`, returning the previous value.
    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        if let Some(slot) = self.get_mut(&key) {
            return Some(std::mem::replace(slot, value));
        }
        if self.at_load_limit() {
            self.grow();
        }
        let idx = self.bucket_of(&key);
        if let Some(bucket) = self.buckets.get_mut(idx) {
            bucket.push((key, value));
            self.len = self.len.saturating_add(1);
        }
        None
    }

    /// The value stored under `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.buckets
            .get(self.bucket_of(key))?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Mutable access to the value stored under `key`.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let idx = self.bucket_of(key);
        self.buckets
            .get_mut(idx)?
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Whether `key` is present.
    pub fn has(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Remove `key`, returning its value.
    pub fn delete(&mut self, key: &K) -> Option<V> {
        let idx = self.bucket_of(key);
        let bucket = self.buckets.get_mut(idx)?;
        let pos = bucket.iter().position(|(k, _)| k == key)?;
        let (_, value) = bucket.swap_remove(pos);
        self.len = self.len.saturating_sub(1);
        Some(value)
    }

    fn bucket_of(&self, key: &K) -> usize {
        let hash = usize::try_from(key.rolling_hash()).unwrap_or(usize::MAX);
        hash.checked_rem(self.buckets.len()).unwrap_or(0)
    }

    /// `len / buckets >= 0.75`, computed as `4 * len >= 3 * buckets`.
    fn at_load_limit(&self) -> bool {
        let used = self.len.saturating_mul(4);
        let limit = self.buckets.len().saturating_mul(3);
        used >= limit
    }

    fn grow(&mut self) {
        let size = self.buckets.len().saturating_mul(2).max(INITIAL_BUCKETS);
        let old = std::mem::replace(&mut self.buckets, empty_buckets(size));
        for (key, value) in old.into_iter().flatten() {
            let idx = self.bucket_of(&key);
            if let Some(bucket) = self.buckets.get_mut(idx) {
                bucket.push((key, value));
            }
        }
    }
}

impl<K, V> IdentityIndex<K, V> {
    /// All keys, in bucket order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries().map(|(k, _)| k)
    }

    /// All values, in bucket order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries().map(|(_, v)| v)
    }

    /// All `(key, value)` pairs, in bucket order.
    pub fn entries(&self) -> impl Iterator<Item = (&K, &V)> {
        self.buckets.iter().flatten().map(|(k, v)| (k, v))
    }

    /// Number of stored keys.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the table is empty.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current number of buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Remove every entry, keeping the current bucket count.
    pub fn clear(&mut self) {
        self.buckets.iter_mut().for_each(Vec::clear);
        self.len = 0;
    }
}

impl<K: RollingKey, V> Default for IdentityIndex<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

fn empty_buckets<K, V>(size: usize) -> Vec<Vec<(K, V)>> {
    std::iter::repeat_with(Vec::new).take(size).collect()
}
