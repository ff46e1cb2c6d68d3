//! Task Cache Module
//!
//! Single-flight async memoization with TTL expiry and optional LRU bound.
//!
//! Every lookup builds its key, then checks for an entry and registers a new
//! in-flight computation inside one critical section of a synchronous mutex.
//! Nothing awaits while the lock is held, so two callers can never both miss
//! on the same key and start the producer twice.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::future::{self, BoxFuture, FutureExt};
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::cache::entry::{SharedTask, Slot};
use crate::cache::stats::Counters;
use crate::cache::{CacheInfo, CacheKey, CacheOptions, KeyPart, KeySource, LruCache};
use crate::error::Result;

/// Future handed to callers; resolves to the shared outcome.
pub type CacheFuture<V, E> = BoxFuture<'static, std::result::Result<V, E>>;

struct State<V, E> {
    entries: LruCache<CacheKey, Slot<V, E>>,
    counters: Counters,
    next_id: u64,
}

struct Inner<V, E> {
    name: String,
    options: CacheOptions,
    state: Mutex<State<V, E>>,
}

enum Lookup<V, E> {
    Ready(V),
    Wait { id: u64, task: SharedTask<V, E> },
}

// == Task Cache ==
/// Deduplicating cache of asynchronous computations.
///
/// Cloning is cheap; clones share the same entries and statistics.
///
/// A bounded cache evicts its least recently used completed entry when full.
/// In-flight computations are skipped unless every entry is in flight, so
/// concurrent callers keep sharing a running computation. An evicted
/// in-flight computation still completes for its current waiters, but its
/// result is not stored.
///
/// ```
/// use dynamo_cache::cache::{Args, CacheOptions, TaskCache};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let events: TaskCache<Vec<String>, String> = TaskCache::new("events", CacheOptions::bounded(60))?;
/// let guild_id = 1234u64;
///
/// let list = events
///     .get_or_compute(&Args::new().arg(guild_id), move || async move {
///         Ok(vec![format!("event for {}", guild_id)])
///     })?
///     .await?;
/// assert_eq!(list.len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct TaskCache<V, E> {
    inner: Arc<Inner<V, E>>,
}

impl<V, E> Clone for TaskCache<V, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V, E> fmt::Debug for TaskCache<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskCache")
            .field("name", &self.inner.name)
            .field("options", &self.inner.options)
            .finish()
    }
}

impl<V, E> TaskCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates an empty cache.
    ///
    /// # Errors
    /// [`CacheError::InvalidConfig`](crate::error::CacheError::InvalidConfig)
    /// for a zero `maxsize` or zero `ttl`.
    pub fn new(name: impl Into<String>, options: CacheOptions) -> Result<Self> {
        options.validate()?;
        let entries = match options.maxsize {
            Some(maxsize) => LruCache::new(maxsize)?,
            None => LruCache::unbounded(),
        };

        Ok(Self {
            inner: Arc::new(Inner {
                name: name.into(),
                options,
                state: Mutex::new(State {
                    entries,
                    counters: Counters::default(),
                    next_id: 0,
                }),
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn options(&self) -> CacheOptions {
        self.inner.options
    }

    // == Get Or Compute ==
    /// Returns the cached or in-flight result for `args`, starting `compute`
    /// only when neither exists.
    ///
    /// The key is built and registered before this returns, so an
    /// unhashable argument fails here and not inside the future. `compute`
    /// runs on the first poll of the shared computation.
    pub fn get_or_compute<S, F, Fut>(&self, args: &S, compute: F) -> Result<CacheFuture<V, E>>
    where
        S: KeySource + ?Sized,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<V, E>> + Send + 'static,
    {
        let key = args.cache_key()?;
        Ok(self.compute_with_key(key, compute))
    }

    fn compute_with_key<F, Fut>(&self, key: CacheKey, compute: F) -> CacheFuture<V, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<V, E>> + Send + 'static,
    {
        match self.lookup_or_register(&key, compute) {
            Lookup::Ready(value) => future::ready(Ok(value)).boxed(),
            Lookup::Wait { id, task } => {
                let mut waiter = Waiter {
                    cache: Arc::downgrade(&self.inner),
                    key,
                    id,
                    task,
                };
                async move { (&mut waiter.task).await }.boxed()
            }
        }
    }

    fn lookup_or_register<F, Fut>(&self, key: &CacheKey, compute: F) -> Lookup<V, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<V, E>> + Send + 'static,
    {
        let ttl = self.inner.options.ttl;
        let now = Instant::now();
        let mut state = self.inner.state.lock();

        if state
            .entries
            .peek(key)
            .is_some_and(|slot| slot.is_expired(ttl, now))
        {
            state.entries.remove(key);
            trace!(cache = %self.inner.name, key = %key, "entry expired");
        }

        if let Some(slot) = state.entries.get(key) {
            let lookup = match slot {
                Slot::Ready { value, .. } => Lookup::Ready(value.clone()),
                Slot::Pending { id, task } => Lookup::Wait {
                    id: *id,
                    task: task.clone(),
                },
            };
            state.counters.record_hit();
            trace!(cache = %self.inner.name, key = %key, "cache hit");
            return lookup;
        }

        state.counters.record_miss();
        let id = state.next_id;
        state.next_id += 1;

        let task = self.shared_task(key.clone(), id, compute);
        // Completed entries go first; a pending one is only evicted when
        // nothing else is left.
        let displaced = if state.entries.is_full() {
            state.entries.pop_lru_where(|_, slot| slot.is_ready())
        } else {
            None
        };
        let evicted = state
            .entries
            .insert(
                key.clone(),
                Slot::Pending {
                    id,
                    task: task.clone(),
                },
            )
            .or(displaced);
        if let Some((evicted_key, _)) = &evicted {
            state.counters.record_eviction();
            debug!(cache = %self.inner.name, key = %evicted_key, "evicted least recently used entry");
        }
        trace!(cache = %self.inner.name, key = %key, "cache miss");

        drop(state);
        drop(evicted);
        Lookup::Wait { id, task }
    }

    fn shared_task<F, Fut>(&self, key: CacheKey, id: u64, compute: F) -> SharedTask<V, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<V, E>> + Send + 'static,
    {
        let cache = Arc::downgrade(&self.inner);
        async move {
            let result = compute().await;
            if let Some(inner) = cache.upgrade() {
                inner.complete(&key, id, &result);
            }
            result
        }
        .boxed()
        .shared()
    }

    // == Statistics ==
    pub fn cache_info(&self) -> CacheInfo {
        let state = self.inner.state.lock();
        state
            .counters
            .snapshot(state.entries.len(), self.inner.options.maxsize)
    }

    // == Invalidation ==
    /// Drops every entry and resets the counters.
    ///
    /// Computations already running keep serving their callers, but their
    /// results are not stored.
    pub fn cache_clear(&self) {
        let drained = {
            let mut state = self.inner.state.lock();
            state.counters.reset();
            state.entries.take()
        };
        debug!(cache = %self.inner.name, removed = drained.len(), "cache cleared");
    }

    /// Drops the entry for `args`. Returns whether one was present.
    pub fn cache_discard<S>(&self, args: &S) -> Result<bool>
    where
        S: KeySource + ?Sized,
    {
        let key = args.cache_key()?;
        Ok(self.discard_key(&key))
    }

    /// Drops the entry stored under an already built key.
    pub fn discard_key(&self, key: &CacheKey) -> bool {
        let removed = self.inner.state.lock().entries.remove(key);
        if removed.is_some() {
            debug!(cache = %self.inner.name, key = %key, "entry discarded");
        }
        removed.is_some()
    }

    /// Drops every entry whose key has `part` as a top-level argument.
    ///
    /// Returns the number of entries removed.
    pub fn discard_containing(&self, part: impl Into<KeyPart>) -> usize {
        let part = part.into();
        let removed = self
            .inner
            .state
            .lock()
            .entries
            .retain(|key, _| !key.contains(&part));
        if removed > 0 {
            debug!(cache = %self.inner.name, part = %part, removed, "entries discarded");
        }
        removed
    }

    /// Eagerly drops completed entries that have outlived the TTL.
    pub fn purge_expired(&self) -> usize {
        let Some(ttl) = self.inner.options.ttl else {
            return 0;
        };
        let now = Instant::now();
        self.inner
            .state
            .lock()
            .entries
            .retain(|_, slot| !slot.is_expired(Some(ttl), now))
    }

    // == Inspection ==
    /// Returns true if `args` has a live entry, in flight or completed.
    ///
    /// Does not count as a hit and does not touch recency.
    pub fn is_cached<S>(&self, args: &S) -> Result<bool>
    where
        S: KeySource + ?Sized,
    {
        let key = args.cache_key()?;
        let now = Instant::now();
        let state = self.inner.state.lock();
        Ok(state
            .entries
            .peek(&key)
            .is_some_and(|slot| !slot.is_expired(self.inner.options.ttl, now)))
    }

    /// Remaining lifetime of the completed entry for `args`.
    ///
    /// None when absent, still in flight, or when the cache has no TTL.
    pub fn ttl_remaining<S>(&self, args: &S) -> Result<Option<Duration>>
    where
        S: KeySource + ?Sized,
    {
        let key = args.cache_key()?;
        let state = self.inner.state.lock();
        Ok(state
            .entries
            .peek(&key)
            .and_then(|slot| slot.ttl_remaining(self.inner.options.ttl, Instant::now())))
    }
}

impl<V, E> Inner<V, E>
where
    V: Clone,
{
    // == Complete ==
    /// Stores a finished computation if it is still the current one for `key`.
    fn complete(&self, key: &CacheKey, id: u64, result: &std::result::Result<V, E>) {
        let mut state = self.state.lock();
        if !state.entries.peek(key).is_some_and(|slot| slot.is_pending(id)) {
            debug!(cache = %self.name, key = %key, "discarding result of invalidated computation");
            return;
        }

        match result {
            Ok(value) => {
                if let Some(slot) = state.entries.peek_mut(key) {
                    *slot = Slot::Ready {
                        value: value.clone(),
                        completed_at: Instant::now(),
                    };
                }
            }
            Err(_) => {
                state.entries.remove(key);
                debug!(cache = %self.name, key = %key, "producer failed, entry purged");
            }
        }
    }
}

// == Waiter ==
/// One caller's handle on an in-flight computation.
///
/// When the last waiter goes away before the computation finishes, the
/// placeholder is removed so the next call starts over.
struct Waiter<V, E> {
    cache: Weak<Inner<V, E>>,
    key: CacheKey,
    id: u64,
    task: SharedTask<V, E>,
}

impl<V, E> Drop for Waiter<V, E> {
    fn drop(&mut self) {
        // The placeholder and this waiter are the only handles left.
        const ORPHANED: Option<usize> = Some(2);

        if self.task.strong_count() != ORPHANED {
            return;
        }
        let Some(inner) = self.cache.upgrade() else {
            return;
        };

        let orphan = {
            let mut state = inner.state.lock();
            let is_orphan = self.task.strong_count() == ORPHANED
                && state
                    .entries
                    .peek(&self.key)
                    .is_some_and(|slot| slot.is_pending(self.id));
            if is_orphan {
                state.entries.remove(&self.key)
            } else {
                None
            }
        };

        if orphan.is_some() {
            debug!(cache = %inner.name, key = %self.key, "last waiter dropped, computation cancelled");
        }
    }
}

// == Async Memoizer ==
type Producer<A, V, E> =
    dyn Fn(A) -> BoxFuture<'static, std::result::Result<V, E>> + Send + Sync;

/// A [`TaskCache`] bound to one producer function.
///
/// ```
/// use dynamo_cache::cache::{AsyncMemoizer, CacheOptions};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let timezone = AsyncMemoizer::new(
///     "user_timezone",
///     CacheOptions::bounded(128),
///     |user_id: u64| async move { Ok::<_, String>(format!("tz-of-{}", user_id)) },
/// )?;
///
/// assert_eq!(timezone.call(7)?.await?, "tz-of-7");
/// assert_eq!(timezone.cache_info().misses, 1);
/// # Ok(())
/// # }
/// ```
pub struct AsyncMemoizer<A, V, E> {
    cache: TaskCache<V, E>,
    producer: Arc<Producer<A, V, E>>,
}

impl<A, V, E> Clone for AsyncMemoizer<A, V, E> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            producer: Arc::clone(&self.producer),
        }
    }
}

impl<A, V, E> fmt::Debug for AsyncMemoizer<A, V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncMemoizer")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl<A, V, E> AsyncMemoizer<A, V, E>
where
    A: KeySource + Send + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new<F, Fut>(name: impl Into<String>, options: CacheOptions, producer: F) -> Result<Self>
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<V, E>> + Send + 'static,
    {
        let producer: Arc<Producer<A, V, E>> = Arc::new(move |args| producer(args).boxed());
        Ok(Self {
            cache: TaskCache::new(name, options)?,
            producer,
        })
    }

    // == Call ==
    /// Returns the memoized result of the producer for `args`.
    pub fn call(&self, args: A) -> Result<CacheFuture<V, E>> {
        let key = args.cache_key()?;
        let producer = Arc::clone(&self.producer);
        Ok(self.cache.compute_with_key(key, move || producer(args)))
    }

    /// Underlying cache, for inspection and invalidation.
    pub fn cache(&self) -> &TaskCache<V, E> {
        &self.cache
    }

    pub fn cache_info(&self) -> CacheInfo {
        self.cache.cache_info()
    }

    pub fn cache_clear(&self) {
        self.cache.cache_clear()
    }

    pub fn cache_discard(&self, args: &A) -> Result<bool> {
        self.cache.cache_discard(args)
    }

    pub fn discard_containing(&self, part: impl Into<KeyPart>) -> usize {
        self.cache.discard_containing(part)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Args;
    use crate::error::CacheError;
    use futures::future::join_all;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;
    use tokio_test::{assert_pending, assert_ready_eq, task};

    type Doubler = AsyncMemoizer<u64, u64, String>;

    /// Doubles its input after a short sleep, counting invocations.
    fn counting_memo(options: CacheOptions, calls: Arc<AtomicUsize>) -> Doubler {
        AsyncMemoizer::new("double", options, move |x: u64| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(x * 2)
            }
        })
        .unwrap()
    }

    /// Doubles its input once `gate` is notified.
    fn gated_memo(calls: Arc<AtomicUsize>, gate: Arc<Notify>) -> Doubler {
        AsyncMemoizer::new("gated", CacheOptions::default(), move |x: u64| {
            let calls = Arc::clone(&calls);
            let gate = Arc::clone(&gate);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                gate.notified().await;
                Ok(x * 2)
            }
        })
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_hits_and_misses() {
        let calls = Arc::new(AtomicUsize::new(0));
        let memo = counting_memo(CacheOptions::default(), calls.clone());

        assert_eq!(memo.call(3).unwrap().await, Ok(6));
        assert_eq!(memo.cache_info().misses, 1);

        assert_eq!(memo.call(3).unwrap().await, Ok(6));
        assert_eq!(memo.cache_info().hits, 1);

        assert_eq!(memo.call(4).unwrap().await, Ok(8));
        let info = memo.cache_info();
        assert_eq!((info.hits, info.misses, info.currsize), (1, 2, 2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_calls_share_one_invocation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let memo = counting_memo(CacheOptions::default(), calls.clone());

        let pending: Vec<_> = (0..10).map(|_| memo.call(21).unwrap()).collect();
        let results = join_all(pending).await;

        assert!(results.iter().all(|r| *r == Ok(42)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let info = memo.cache_info();
        assert_eq!(info.hits, 9);
        assert_eq!(info.misses, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_single_flight_across_threads() {
        let calls = Arc::new(AtomicUsize::new(0));
        let memo = counting_memo(CacheOptions::default(), calls.clone());

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let memo = memo.clone();
                tokio::spawn(async move { memo.call(5).unwrap().await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Ok(10));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let info = memo.cache_info();
        assert_eq!(info.hits + info.misses, 32);
        assert_eq!(info.misses, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let memo: AsyncMemoizer<u64, u64, String> =
            AsyncMemoizer::new("flaky", CacheOptions::default(), move |x: u64| {
                let attempt = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    if attempt == 0 {
                        Err("rate limited".to_string())
                    } else {
                        Ok(x)
                    }
                }
            })
            .unwrap();

        // Both callers attach to the failing computation and see its error
        let (first, second) = tokio::join!(memo.call(1).unwrap(), memo.call(1).unwrap());
        assert_eq!(first, Err("rate limited".to_string()));
        assert_eq!(second, Err("rate limited".to_string()));
        assert_eq!(memo.cache_info().currsize, 0);

        assert_eq!(memo.call(1).unwrap().await, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiry() {
        let calls = Arc::new(AtomicUsize::new(0));
        let options = CacheOptions::unbounded().with_ttl(Duration::from_secs(900));
        let memo = counting_memo(options, calls.clone());

        memo.call(1).unwrap().await.unwrap();

        tokio::time::advance(Duration::from_secs(899)).await;
        assert_eq!(memo.call(1).unwrap().await, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(memo.call(1).unwrap().await, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(memo.cache_info().misses, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_maxsize_evicts_least_recent() {
        let calls = Arc::new(AtomicUsize::new(0));
        let memo = counting_memo(CacheOptions::bounded(2), calls.clone());

        for x in [1, 2, 3] {
            memo.call(x).unwrap().await.unwrap();
        }
        let info = memo.cache_info();
        assert_eq!(info.currsize, 2);
        assert!(info.full);
        assert_eq!(info.evictions, 1);
        assert!(!memo.cache().is_cached(&1u64).unwrap());

        // Touch 2, then 4 evicts 3
        memo.call(2).unwrap().await.unwrap();
        memo.call(4).unwrap().await.unwrap();
        assert!(memo.cache().is_cached(&2u64).unwrap());
        assert!(!memo.cache().is_cached(&3u64).unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_eviction_skips_in_flight_entry() {
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());
        let (counter, slow_gate) = (calls.clone(), gate.clone());
        let memo = AsyncMemoizer::new("bounded", CacheOptions::bounded(2), move |x: u64| {
            counter.fetch_add(1, Ordering::SeqCst);
            let gate = Arc::clone(&slow_gate);
            async move {
                if x == 1 {
                    gate.notified().await;
                }
                Ok::<_, String>(x * 2)
            }
        })
        .unwrap();

        let mut slow = task::spawn(memo.call(1).unwrap());
        assert_pending!(slow.poll());
        assert_eq!(memo.call(2).unwrap().await, Ok(4));

        // 1 is least recently used but still running, so 2 goes instead
        assert_eq!(memo.call(3).unwrap().await, Ok(6));
        assert!(!memo.cache().is_cached(&2u64).unwrap());
        assert_eq!(memo.cache_info().evictions, 1);

        let mut follower = task::spawn(memo.call(1).unwrap());
        assert_pending!(follower.poll());

        gate.notify_one();
        assert_ready_eq!(slow.poll(), Ok(2));
        assert_ready_eq!(follower.poll(), Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(memo.cache().is_cached(&1u64).unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_keeps_everything() {
        let calls = Arc::new(AtomicUsize::new(0));
        let memo = counting_memo(CacheOptions::unbounded(), calls);

        for x in 0..300 {
            memo.call(x).unwrap().await.unwrap();
        }
        let info = memo.cache_info();
        assert_eq!(info.currsize, 300);
        assert_eq!(info.maxsize, None);
        assert!(!info.full);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_discard() {
        let calls = Arc::new(AtomicUsize::new(0));
        let memo = counting_memo(CacheOptions::default(), calls.clone());

        memo.call(1).unwrap().await.unwrap();
        assert!(memo.cache_discard(&1).unwrap());
        assert!(!memo.cache_discard(&1).unwrap());

        memo.call(1).unwrap().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_discard_containing() {
        let cache: TaskCache<String, String> =
            TaskCache::new("events", CacheOptions::default()).unwrap();

        for (guild, event) in [(10u64, 1u64), (10, 2), (20, 1)] {
            let args = Args::new().arg(guild).kwarg("event", event);
            cache
                .get_or_compute(&args, move || async move { Ok(format!("{}:{}", guild, event)) })
                .unwrap()
                .await
                .unwrap();
        }

        assert_eq!(cache.discard_containing(10u64), 2);
        assert_eq!(cache.cache_info().currsize, 1);
        assert!(cache
            .is_cached(&Args::new().arg(20u64).kwarg("event", 1u64))
            .unwrap());
    }

    #[tokio::test]
    async fn test_unhashable_key_fails_before_compute() {
        let cache: TaskCache<u64, String> = TaskCache::new("floats", CacheOptions::default()).unwrap();
        let invoked = Arc::new(AtomicUsize::new(0));
        let counter = invoked.clone();

        let result = cache.get_or_compute(&f64::NAN, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(0)
        });

        assert!(matches!(result, Err(CacheError::Unhashable(_))));
        assert_eq!(invoked.load(Ordering::SeqCst), 0);
        assert_eq!(cache.cache_info().misses, 0);
    }

    #[test]
    fn test_zero_maxsize_is_fatal() {
        let result: Result<TaskCache<u64, String>> = TaskCache::new("bad", CacheOptions::bounded(0));
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_clear_discards_in_flight_result() {
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());
        let memo = gated_memo(calls.clone(), gate.clone());

        let mut pending = task::spawn(memo.call(1).unwrap());
        assert_pending!(pending.poll());
        assert_eq!(memo.cache_info().currsize, 1);

        memo.cache_clear();
        assert_eq!(memo.cache_info().currsize, 0);

        gate.notify_one();
        assert_ready_eq!(pending.poll(), Ok(2));
        assert_eq!(memo.cache_info().currsize, 0);
    }

    #[tokio::test]
    async fn test_cancelled_initiator_releases_entry() {
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());
        let memo = gated_memo(calls.clone(), gate.clone());

        let mut first = task::spawn(memo.call(1).unwrap());
        assert_pending!(first.poll());
        drop(first);
        assert_eq!(memo.cache_info().currsize, 0);

        gate.notify_one();
        assert_eq!(memo.call(1).unwrap().await, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancelled_follower_leaves_computation_running() {
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());
        let memo = gated_memo(calls.clone(), gate.clone());

        let mut leader = task::spawn(memo.call(1).unwrap());
        let mut follower = task::spawn(memo.call(1).unwrap());
        assert_pending!(leader.poll());
        assert_pending!(follower.poll());

        drop(follower);
        assert_eq!(memo.cache_info().currsize, 1);

        gate.notify_one();
        assert_ready_eq!(leader.poll(), Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(memo.cache().is_cached(&1u64).unwrap());
    }

    #[tokio::test]
    async fn test_follower_outlives_cancelled_initiator() {
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());
        let memo = gated_memo(calls.clone(), gate.clone());

        let mut leader = task::spawn(memo.call(1).unwrap());
        let mut follower = task::spawn(memo.call(1).unwrap());
        assert_pending!(leader.poll());
        assert_pending!(follower.poll());

        drop(leader);
        gate.notify_one();

        assert_ready_eq!(follower.poll(), Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let info = memo.cache_info();
        assert_eq!((info.hits, info.misses, info.currsize), (1, 1, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired_and_ttl_remaining() {
        let calls = Arc::new(AtomicUsize::new(0));
        let options = CacheOptions::default().with_ttl(Duration::from_secs(60));
        let memo = counting_memo(options, calls);

        memo.call(1).unwrap().await.unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;
        memo.call(2).unwrap().await.unwrap();

        assert_eq!(
            memo.cache().ttl_remaining(&2u64).unwrap(),
            Some(Duration::from_secs(60))
        );

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(memo.cache().purge_expired(), 1);
        assert!(!memo.cache().is_cached(&1u64).unwrap());
        assert!(memo.cache().is_cached(&2u64).unwrap());
    }

    #[tokio::test]
    async fn test_purge_without_ttl_is_noop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());
        let memo = gated_memo(calls, gate);

        let _pending = memo.call(1).unwrap();
        assert_eq!(memo.cache().purge_expired(), 0);
    }
}
