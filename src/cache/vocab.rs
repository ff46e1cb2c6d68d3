//! Vocabulary Index Module
//!
//! Per-entity tries kept behind an LRU bound, e.g. one trie of tag names per
//! user. A trie is built from the entity's current words on first use and
//! reused until it is invalidated or evicted.

use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::cache::{LruCache, Trie};
use crate::error::Result;

// == Vocabulary Index ==
#[derive(Debug)]
pub struct VocabularyIndex<K> {
    tries: Mutex<LruCache<K, Arc<Trie>>>,
}

impl<K> VocabularyIndex<K>
where
    K: Hash + Eq + Clone + std::fmt::Debug,
{
    /// Creates an index holding tries for at most `capacity` entities.
    ///
    /// # Errors
    /// [`CacheError::InvalidConfig`](crate::error::CacheError::InvalidConfig)
    /// when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self {
            tries: Mutex::new(LruCache::new(capacity)?),
        })
    }

    // == Get Or Build ==
    /// Returns the trie for `id`, building it from `words` on a miss.
    ///
    /// `words` is only called on a miss. It runs outside the lock; if two
    /// threads build the same trie at once the first one stored wins.
    pub fn get_or_build<F, I, S>(&self, id: &K, words: F) -> Arc<Trie>
    where
        F: FnOnce() -> I,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if let Some(trie) = self.tries.lock().get(id) {
            trace!(id = ?id, "vocabulary hit");
            return Arc::clone(trie);
        }

        let built = Arc::new(words().into_iter().collect::<Trie>());
        debug!(id = ?id, words = built.len(), "vocabulary built");

        let mut tries = self.tries.lock();
        if let Some(existing) = tries.get(id) {
            return Arc::clone(existing);
        }
        tries.insert(id.clone(), Arc::clone(&built));
        built
    }

    // == Search ==
    /// Sorted matches for `prefix` in the vocabulary of `id`, at most `limit`.
    pub fn search<F, I, S>(&self, id: &K, prefix: &str, limit: usize, words: F) -> Vec<String>
    where
        F: FnOnce() -> I,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.get_or_build(id, words).search_sorted(prefix, limit)
    }

    // == Invalidation ==
    /// Forgets the trie of `id` so the next lookup rebuilds it.
    pub fn invalidate(&self, id: &K) -> bool {
        self.tries.lock().remove(id).is_some()
    }

    pub fn clear(&self) {
        self.tries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.tries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tries.lock().is_empty()
    }
}
