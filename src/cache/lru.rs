//! LRU Cache Module
//!
//! Fixed-capacity map with least-recently-used eviction.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::num::NonZeroUsize;

use crate::error::{CacheError, Result};

#[derive(Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

// == LRU Cache ==
/// Map from `K` to `V` evicting the least recently used entry when full.
///
/// Entries live in a dense `Vec` threaded by a doubly linked recency list:
/// - `head` = Most recently used
/// - `tail` = Least recently used
///
/// Lookups, inserts, promotions and evictions are all O(1).
#[derive(Debug)]
pub struct LruCache<K, V> {
    /// Key to slot index
    map: HashMap<K, usize>,
    /// Slots, kept dense with `swap_remove`
    nodes: Vec<Node<K, V>>,
    head: Option<usize>,
    tail: Option<usize>,
    /// None = never evicts
    capacity: Option<NonZeroUsize>,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructors ==
    /// Creates a cache holding at most `capacity` entries.
    ///
    /// # Errors
    /// [`CacheError::InvalidConfig`] when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
            CacheError::InvalidConfig("LRU capacity must be a positive integer".to_string())
        })?;
        Ok(Self::with_limit(Some(capacity)))
    }

    /// Creates a cache that never evicts.
    pub fn unbounded() -> Self {
        Self::with_limit(None)
    }

    fn with_limit(capacity: Option<NonZeroUsize>) -> Self {
        Self {
            map: HashMap::new(),
            nodes: Vec::new(),
            head: None,
            tail: None,
            capacity,
        }
    }

    // == Get ==
    /// Returns the value for `key` and marks it most recently used.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.map.get(key)?;
        self.promote(idx);
        Some(&self.nodes[idx].value)
    }

    /// Mutable variant of [`get`](Self::get); also promotes.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.map.get(key)?;
        self.promote(idx);
        Some(&mut self.nodes[idx].value)
    }

    // == Peek ==
    /// Returns the value for `key` without touching its recency.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.get(key).map(|&idx| &self.nodes[idx].value)
    }

    pub fn peek_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.map.get(key)?;
        Some(&mut self.nodes[idx].value)
    }

    /// Returns the least recently used entry without removing it.
    pub fn peek_lru(&self) -> Option<(&K, &V)> {
        self.tail.map(|idx| {
            let node = &self.nodes[idx];
            (&node.key, &node.value)
        })
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(key)
    }

    // == Insert ==
    /// Inserts or updates `key`, marking it most recently used.
    ///
    /// Updating an existing key never evicts. Inserting a new key into a full
    /// cache evicts the least recently used entry first and returns it.
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&idx) = self.map.get(&key) {
            self.nodes[idx].value = value;
            self.promote(idx);
            return None;
        }

        let evicted = match self.capacity {
            Some(capacity) if self.nodes.len() >= capacity.get() => self.pop_lru(),
            _ => None,
        };

        let idx = self.nodes.len();
        self.nodes.push(Node {
            key: key.clone(),
            value,
            prev: None,
            next: None,
        });
        self.map.insert(key, idx);
        self.push_front(idx);

        evicted
    }

    // == Remove ==
    /// Removes `key`, returning its value if it was present.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.map.get(key)?;
        Some(self.remove_at(idx).1)
    }

    /// Removes and returns the least recently used entry.
    pub fn pop_lru(&mut self) -> Option<(K, V)> {
        let idx = self.tail?;
        Some(self.remove_at(idx))
    }

    /// Removes the least recently used entry for which `evictable` returns
    /// true, walking from oldest to newest.
    pub fn pop_lru_where<F>(&mut self, mut evictable: F) -> Option<(K, V)>
    where
        F: FnMut(&K, &V) -> bool,
    {
        let mut cursor = self.tail;
        while let Some(idx) = cursor {
            let node = &self.nodes[idx];
            if evictable(&node.key, &node.value) {
                return Some(self.remove_at(idx));
            }
            cursor = node.prev;
        }
        None
    }

    /// Keeps only the entries for which `keep` returns true.
    ///
    /// Returns the number of entries removed. Recency of kept entries is
    /// unchanged.
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let mut removed = 0;
        // Walk backwards: `remove_at` only ever moves an already visited slot.
        for idx in (0..self.nodes.len()).rev() {
            let node = &mut self.nodes[idx];
            if !keep(&node.key, &mut node.value) {
                self.remove_at(idx);
                removed += 1;
            }
        }
        removed
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.nodes.clear();
        self.head = None;
        self.tail = None;
    }

    /// Moves every entry into a new cache, leaving this one empty with the
    /// same capacity.
    pub fn take(&mut self) -> Self {
        std::mem::replace(self, Self::with_limit(self.capacity))
    }

    /// Keys in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.map.keys()
    }

    // == Size ==
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// True when a bounded cache holds `capacity` entries.
    pub fn is_full(&self) -> bool {
        self.capacity
            .is_some_and(|capacity| self.nodes.len() >= capacity.get())
    }

    /// Maximum number of entries, or None when unbounded.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity.map(NonZeroUsize::get)
    }

    // == Recency List ==
    fn promote(&mut self, idx: usize) {
        if self.head != Some(idx) {
            self.unlink(idx);
            self.push_front(idx);
        }
    }

    fn push_front(&mut self, idx: usize) {
        self.nodes[idx].prev = None;
        self.nodes[idx].next = self.head;
        match self.head {
            Some(head) => self.nodes[head].prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
        match prev {
            Some(prev) => self.nodes[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.nodes[next].prev = prev,
            None => self.tail = prev,
        }
        self.nodes[idx].prev = None;
        self.nodes[idx].next = None;
    }

    fn remove_at(&mut self, idx: usize) -> (K, V) {
        self.unlink(idx);

        let last = self.nodes.len() - 1;
        if idx != last {
            // `swap_remove` moves the last slot into `idx`; repoint its links.
            let (prev, next) = (self.nodes[last].prev, self.nodes[last].next);
            match prev {
                Some(prev) => self.nodes[prev].next = Some(idx),
                None => self.head = Some(idx),
            }
            match next {
                Some(next) => self.nodes[next].prev = Some(idx),
                None => self.tail = Some(idx),
            }
            if let Some(slot) = self.map.get_mut(&self.nodes[last].key) {
                *slot = idx;
            }
        }

        let node = self.nodes.swap_remove(idx);
        self.map.remove(&node.key);
        (node.key, node.value)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn filled(capacity: usize, keys: &[&'static str]) -> LruCache<&'static str, usize> {
        let mut lru = LruCache::new(capacity).unwrap();
        for (i, key) in keys.iter().enumerate() {
            lru.insert(*key, i);
        }
        lru
    }

    #[test]
    fn test_lru_new() {
        let lru: LruCache<String, u32> = LruCache::new(4).unwrap();
        assert!(lru.is_empty());
        assert_eq!(lru.len(), 0);
        assert_eq!(lru.capacity(), Some(4));
    }

    #[test]
    fn test_lru_zero_capacity_rejected() {
        let result: Result<LruCache<String, u32>> = LruCache::new(0);
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_lru_get_and_miss() {
        let mut lru = filled(3, &["key1", "key2"]);

        assert_eq!(lru.get("key1"), Some(&0));
        assert_eq!(lru.get("missing"), None);
    }

    #[test]
    fn test_lru_insert_new_keys() {
        let lru = filled(5, &["key1", "key2", "key3"]);

        assert_eq!(lru.len(), 3);
        // key1 is oldest (added first)
        assert_eq!(lru.peek_lru(), Some((&"key1", &0)));
    }

    #[test]
    fn test_lru_update_promotes_without_growing() {
        let mut lru = filled(3, &["key1", "key2", "key3"]);

        assert_eq!(lru.insert("key1", 10), None);

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.peek("key1"), Some(&10));
        // key2 is now oldest
        assert_eq!(lru.peek_lru(), Some((&"key2", &1)));
    }

    #[test]
    fn test_lru_evicts_oldest_when_full() {
        let mut lru = filled(3, &["key1", "key2", "key3"]);

        let evicted = lru.insert("key4", 3);

        assert_eq!(evicted, Some(("key1", 0)));
        assert_eq!(lru.len(), 3);
        assert!(!lru.contains_key("key1"));
    }

    #[test]
    fn test_lru_get_promotes() {
        let mut lru = filled(3, &["a", "b", "c"]);

        lru.get("a");

        assert_eq!(lru.insert("d", 3), Some(("b", 1)));
        assert!(lru.contains_key("a"));
    }

    #[test]
    fn test_lru_peek_does_not_promote() {
        let mut lru = filled(2, &["a", "b"]);

        assert_eq!(lru.peek("a"), Some(&0));

        assert_eq!(lru.insert("c", 2), Some(("a", 0)));
    }

    #[test]
    fn test_lru_capacity_two_scenario() {
        let mut lru = filled(2, &["a", "b", "c"]);

        // a evicted, {b, c} remain
        assert!(!lru.contains_key("a"));
        assert!(lru.contains_key("b"));
        assert!(lru.contains_key("c"));

        // touching b makes c the eviction candidate
        lru.get("b");
        assert_eq!(lru.insert("d", 3), Some(("c", 2)));
        assert!(lru.contains_key("b"));
        assert!(lru.contains_key("d"));
    }

    #[test]
    fn test_lru_remove() {
        let mut lru = filled(5, &["key1", "key2", "key3"]);

        assert_eq!(lru.remove("key2"), Some(1));

        assert_eq!(lru.len(), 2);
        assert!(!lru.contains_key("key2"));
        assert!(lru.contains_key("key1"));
        assert!(lru.contains_key("key3"));
    }

    #[test]
    fn test_lru_remove_nonexistent_key() {
        let mut lru = filled(5, &["key1", "key2"]);

        // Remove a key that doesn't exist - should not panic or affect existing keys
        assert_eq!(lru.remove("nonexistent"), None);
        assert_eq!(lru.len(), 2);
    }

    #[test]
    fn test_lru_order_survives_removals() {
        let mut lru = filled(10, &["a", "b", "c", "d", "e"]);

        lru.remove("b");
        lru.get("a");
        lru.remove("d");

        // Remaining recency, oldest first: c, e, a
        assert_eq!(lru.pop_lru(), Some(("c", 2)));
        assert_eq!(lru.pop_lru(), Some(("e", 4)));
        assert_eq!(lru.pop_lru(), Some(("a", 0)));
        assert_eq!(lru.pop_lru(), None);
        assert!(lru.is_empty());
    }

    #[test]
    fn test_lru_retain() {
        let mut lru = filled(10, &["a", "b", "c", "d"]);

        let removed = lru.retain(|_, value| *value % 2 == 0);

        assert_eq!(removed, 2);
        assert_eq!(lru.len(), 2);
        assert_eq!(lru.pop_lru(), Some(("a", 0)));
        assert_eq!(lru.pop_lru(), Some(("c", 2)));
    }

    #[test]
    fn test_lru_pop_lru_where_skips_oldest() {
        let mut lru = filled(3, &["a", "b", "c"]);
        assert!(lru.is_full());

        assert_eq!(lru.pop_lru_where(|key, _| *key != "a"), Some(("b", 1)));
        assert!(!lru.is_full());
        assert_eq!(lru.pop_lru_where(|_, value| *value > 5), None);

        lru.insert("d", 3);
        assert_eq!(lru.pop_lru(), Some(("a", 0)));
        assert_eq!(lru.pop_lru(), Some(("c", 2)));
        assert_eq!(lru.pop_lru(), Some(("d", 3)));
    }

    #[test]
    fn test_lru_unbounded_never_evicts() {
        let mut lru = LruCache::unbounded();
        for i in 0..1000 {
            assert_eq!(lru.insert(i, i), None);
        }
        assert_eq!(lru.len(), 1000);
        assert_eq!(lru.capacity(), None);
        assert!(!lru.is_full());
    }

    #[test]
    fn test_lru_take_keeps_capacity() {
        let mut lru = filled(2, &["a", "b"]);
        let taken = lru.take();

        assert_eq!(taken.len(), 2);
        assert!(lru.is_empty());
        assert_eq!(lru.capacity(), Some(2));
    }

    #[test]
    fn test_lru_clear() {
        let mut lru = filled(3, &["a", "b"]);
        lru.clear();

        assert!(lru.is_empty());
        assert_eq!(lru.peek_lru(), None);
        lru.insert("c", 0);
        assert_eq!(lru.len(), 1);
    }
}
