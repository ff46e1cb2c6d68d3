//! Cache Registry Module
//!
//! Named collection of caches so they can be inspected, cleared and swept
//! together without knowing their value types.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info};

use crate::cache::{AsyncMemoizer, CacheInfo, CacheKey, CacheOptions, KeySource, TaskCache};
use crate::error::{CacheError, Result};

// == Cache Report ==
/// Type-erased view of a cache, independent of its key and value types.
pub trait CacheReport: Send + Sync {
    /// Name the cache was created with; also its registry key.
    fn name(&self) -> &str;

    fn cache_info(&self) -> CacheInfo;

    fn cache_clear(&self);

    /// Drops the entry stored under `key`. Returns whether one was present.
    fn discard_key(&self, key: &CacheKey) -> bool;

    /// Drops completed entries past their TTL, returning how many.
    fn purge_expired(&self) -> usize;
}

impl<V, E> CacheReport for TaskCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        TaskCache::name(self)
    }

    fn cache_info(&self) -> CacheInfo {
        TaskCache::cache_info(self)
    }

    fn cache_clear(&self) {
        TaskCache::cache_clear(self)
    }

    fn discard_key(&self, key: &CacheKey) -> bool {
        TaskCache::discard_key(self, key)
    }

    fn purge_expired(&self) -> usize {
        TaskCache::purge_expired(self)
    }
}

impl<A, V, E> CacheReport for AsyncMemoizer<A, V, E>
where
    A: KeySource + Send + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        self.cache().name()
    }

    fn cache_info(&self) -> CacheInfo {
        self.cache().cache_info()
    }

    fn cache_clear(&self) {
        self.cache().cache_clear()
    }

    fn discard_key(&self, key: &CacheKey) -> bool {
        self.cache().discard_key(key)
    }

    fn purge_expired(&self) -> usize {
        self.cache().purge_expired()
    }
}

// == Cache Summary ==
/// Name and statistics of one registered cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheSummary {
    pub name: String,
    pub info: CacheInfo,
}

// == Cache Registry ==
/// Shared, cloneable map from cache name to cache.
///
/// Also carries the default [`CacheOptions`] used by
/// [`create_cache`](Self::create_cache) and
/// [`create_memoizer`](Self::create_memoizer).
#[derive(Clone, Default)]
pub struct CacheRegistry {
    caches: Arc<RwLock<BTreeMap<String, Arc<dyn CacheReport>>>>,
    defaults: CacheOptions,
}

impl std::fmt::Debug for CacheRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheRegistry")
            .field("names", &self.names())
            .field("defaults", &self.defaults)
            .finish()
    }
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry whose new caches use `defaults`.
    ///
    /// # Errors
    /// [`CacheError::InvalidConfig`] if `defaults` is invalid.
    pub fn with_defaults(defaults: CacheOptions) -> Result<Self> {
        defaults.validate()?;
        Ok(Self {
            caches: Arc::default(),
            defaults,
        })
    }

    pub fn defaults(&self) -> CacheOptions {
        self.defaults
    }

    // == Register ==
    /// Adds `cache` under its own name.
    ///
    /// # Errors
    /// [`CacheError::AlreadyRegistered`] if the name is taken.
    pub fn register<C>(&self, cache: C) -> Result<()>
    where
        C: CacheReport + 'static,
    {
        let name = cache.name().to_string();
        let mut caches = self.caches.write();
        if caches.contains_key(&name) {
            return Err(CacheError::AlreadyRegistered(name));
        }
        debug!(cache = %name, "cache registered");
        caches.insert(name, Arc::new(cache));
        Ok(())
    }

    /// Builds a [`TaskCache`] with the registry defaults and registers it.
    pub fn create_cache<V, E>(&self, name: impl Into<String>) -> Result<TaskCache<V, E>>
    where
        V: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        let cache = TaskCache::new(name, self.defaults)?;
        self.register(cache.clone())?;
        Ok(cache)
    }

    /// Builds an [`AsyncMemoizer`] with the registry defaults and registers it.
    pub fn create_memoizer<A, V, E, F, Fut>(
        &self,
        name: impl Into<String>,
        producer: F,
    ) -> Result<AsyncMemoizer<A, V, E>>
    where
        A: KeySource + Send + 'static,
        V: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<V, E>> + Send + 'static,
    {
        let memo = AsyncMemoizer::new(name, self.defaults, producer)?;
        self.register(memo.clone())?;
        Ok(memo)
    }

    // == Lookup ==
    pub fn get(&self, name: &str) -> Option<Arc<dyn CacheReport>> {
        self.caches.read().get(name).cloned()
    }

    /// Like [`get`](Self::get) but reports an unknown name as an error.
    pub fn require(&self, name: &str) -> Result<Arc<dyn CacheReport>> {
        self.get(name)
            .ok_or_else(|| CacheError::NotFound(name.to_string()))
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.caches.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.caches.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.caches.read().is_empty()
    }

    // == Snapshot ==
    /// Statistics of every cache, sorted by name.
    pub fn snapshot(&self) -> Vec<CacheSummary> {
        self.entries()
            .into_iter()
            .map(|(name, cache)| CacheSummary {
                name,
                info: cache.cache_info(),
            })
            .collect()
    }

    /// One `name: CacheInfo(..)` line per cache.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for CacheSummary { name, info } in self.snapshot() {
            let _ = writeln!(out, "{}: {}", name, info);
        }
        out
    }

    // == Bulk Operations ==
    pub fn clear_all(&self) {
        let caches = self.entries();
        for (_, cache) in &caches {
            cache.cache_clear();
        }
        info!(caches = caches.len(), "all caches cleared");
    }

    /// Purges expired entries from every cache, returning the total removed.
    pub fn purge_expired(&self) -> usize {
        self.entries()
            .into_iter()
            .map(|(name, cache)| {
                let removed = cache.purge_expired();
                if removed > 0 {
                    debug!(cache = %name, removed, "expired entries purged");
                }
                removed
            })
            .sum()
    }

    /// Copies the map out so no cache is called under the registry lock.
    fn entries(&self) -> Vec<(String, Arc<dyn CacheReport>)> {
        self.caches
            .read()
            .iter()
            .map(|(name, cache)| (name.clone(), Arc::clone(cache)))
            .collect()
    }
}
