//! Cache Options Module
//!
//! Size and lifetime settings shared by every task cache.

use std::time::Duration;

use crate::error::{CacheError, Result};

/// Default bound used when nothing else is configured.
pub const DEFAULT_MAXSIZE: usize = 128;

// == Cache Options ==
/// Size bound and entry lifetime of one cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
    /// None = unbounded, otherwise LRU-bounded to this many entries
    pub maxsize: Option<usize>,
    /// None = entries never expire
    pub ttl: Option<Duration>,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self::bounded(DEFAULT_MAXSIZE)
    }
}

impl CacheOptions {
    pub fn bounded(maxsize: usize) -> Self {
        Self {
            maxsize: Some(maxsize),
            ttl: None,
        }
    }

    pub fn unbounded() -> Self {
        Self {
            maxsize: None,
            ttl: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Sets the TTL from fractional seconds.
    ///
    /// # Errors
    /// [`CacheError::InvalidConfig`] unless `secs` is finite, positive and
    /// small enough to fit a [`Duration`].
    pub fn with_ttl_secs(self, secs: f64) -> Result<Self> {
        if !secs.is_finite() || secs <= 0.0 {
            return Err(CacheError::InvalidConfig(format!(
                "TTL must be a positive number of seconds, got {}",
                secs
            )));
        }
        let ttl = Duration::try_from_secs_f64(secs).map_err(|err| {
            CacheError::InvalidConfig(format!("TTL of {} seconds is out of range: {}", secs, err))
        })?;
        Ok(self.with_ttl(ttl))
    }

    // == Validate ==
    /// Rejects a zero `maxsize` or a zero `ttl`.
    pub fn validate(&self) -> Result<()> {
        if self.maxsize == Some(0) {
            return Err(CacheError::InvalidConfig(
                "maxsize must be a positive integer".to_string(),
            ));
        }
        if self.ttl == Some(Duration::ZERO) {
            return Err(CacheError::InvalidConfig("TTL must be positive".to_string()));
        }
        Ok(())
    }
}
