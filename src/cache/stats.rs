//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, and evictions.

use std::fmt;

use serde::Serialize;

// == Counters ==
/// Running counters kept next to a cache's entries.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Counters {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl Counters {
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    // == Snapshot ==
    /// Combines the counters with the cache's current occupancy.
    pub fn snapshot(&self, currsize: usize, maxsize: Option<usize>) -> CacheInfo {
        CacheInfo {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            currsize,
            maxsize,
            full: maxsize.is_some_and(|max| currsize >= max),
        }
    }
}

// == Cache Info ==
/// Point-in-time statistics of one cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheInfo {
    /// Calls that attached to an existing entry, in flight or completed
    pub hits: u64,
    /// Calls that started a fresh computation
    pub misses: u64,
    /// Entries dropped by the LRU policy
    pub evictions: u64,
    /// Entries currently held
    pub currsize: usize,
    /// Capacity, None when unbounded
    pub maxsize: Option<usize>,
    /// True when a bounded cache is at capacity
    pub full: bool,
}

impl CacheInfo {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl fmt::Display for CacheInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheInfo(hits={}, misses={}, evictions={}, currsize={}, maxsize=",
            self.hits, self.misses, self.evictions, self.currsize
        )?;
        match self.maxsize {
            Some(max) => write!(f, "{}", max)?,
            None => write!(f, "None")?,
        }
        write!(f, ", full={})", self.full)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_new() {
        let info = Counters::default().snapshot(0, None);
        assert_eq!(info.hits, 0);
        assert_eq!(info.misses, 0);
        assert_eq!(info.evictions, 0);
        assert_eq!(info.currsize, 0);
        assert!(!info.full);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let info = Counters::default().snapshot(0, Some(8));
        assert_eq!(info.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut counters = Counters::default();
        counters.record_hit();
        counters.record_hit();
        counters.record_hit();
        counters.record_miss();
        assert_eq!(counters.snapshot(1, None).hit_rate(), 0.75);
    }

    #[test]
    fn test_full_only_when_bounded_and_at_capacity() {
        let counters = Counters::default();
        assert!(counters.snapshot(5, Some(5)).full);
        assert!(!counters.snapshot(4, Some(5)).full);
        assert!(!counters.snapshot(1_000, None).full);
    }

    #[test]
    fn test_reset() {
        let mut counters = Counters::default();
        counters.record_hit();
        counters.record_miss();
        counters.record_eviction();
        counters.reset();

        let info = counters.snapshot(0, None);
        assert_eq!((info.hits, info.misses, info.evictions), (0, 0, 0));
    }

    #[test]
    fn test_display() {
        let mut counters = Counters::default();
        counters.record_hit();
        counters.record_miss();

        assert_eq!(
            counters.snapshot(1, Some(128)).to_string(),
            "CacheInfo(hits=1, misses=1, evictions=0, currsize=1, maxsize=128, full=false)"
        );
        assert!(counters.snapshot(1, None).to_string().contains("maxsize=None"));
    }

    #[test]
    fn test_serialize() {
        let info = Counters::default().snapshot(2, None);
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["currsize"], 2);
        assert!(json["maxsize"].is_null());
    }
}
