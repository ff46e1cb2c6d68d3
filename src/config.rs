//! Configuration Module
//!
//! Handles loading the admin server and default cache settings from
//! environment variables.

use std::env;

use crate::cache::{CacheOptions, DEFAULT_MAXSIZE};
use crate::error::Result;

/// Server and cache configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Background sweep interval in seconds
    pub sweep_interval: u64,
    /// Default cache bound, None = unbounded
    pub cache_maxsize: Option<usize>,
    /// Default entry lifetime in seconds, None = never expires
    pub cache_ttl: Option<f64>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `SWEEP_INTERVAL` - Expired entry sweep frequency in seconds (default: 30)
    /// - `CACHE_MAXSIZE` - Default cache bound, `none` for unbounded (default: 128)
    /// - `CACHE_TTL` - Default TTL in seconds, `none` or unset for no expiry
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            server_port: lookup("SERVER_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            sweep_interval: lookup("SWEEP_INTERVAL")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.sweep_interval),
            cache_maxsize: match lookup("CACHE_MAXSIZE") {
                Some(v) if is_none(&v) => None,
                Some(v) => v.trim().parse().ok().or(defaults.cache_maxsize),
                None => defaults.cache_maxsize,
            },
            cache_ttl: lookup("CACHE_TTL")
                .filter(|v| !is_none(v))
                .and_then(|v| v.trim().parse().ok()),
        }
    }

    // == Cache Options ==
    /// Validated default options for caches created by the host.
    ///
    /// # Errors
    /// [`CacheError::InvalidConfig`](crate::error::CacheError::InvalidConfig)
    /// for a zero maxsize or a TTL that is not a positive number.
    pub fn cache_options(&self) -> Result<CacheOptions> {
        let mut options = match self.cache_maxsize {
            Some(maxsize) => CacheOptions::bounded(maxsize),
            None => CacheOptions::unbounded(),
        };
        if let Some(secs) = self.cache_ttl {
            options = options.with_ttl_secs(secs)?;
        }
        options.validate()?;
        Ok(options)
    }
}

fn is_none(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("none")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            sweep_interval: 30,
            cache_maxsize: Some(DEFAULT_MAXSIZE),
            cache_ttl: None,
        }
    }
}
