//! Response DTOs for the cache admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{CacheInfo, CacheOptions, CacheSummary};

/// Response body for a single cache (GET /caches/:name)
#[derive(Debug, Clone, Serialize)]
pub struct CacheResponse {
    pub name: String,
    #[serde(flatten)]
    pub info: CacheInfo,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl CacheResponse {
    pub fn new(name: impl Into<String>, info: CacheInfo) -> Self {
        Self {
            name: name.into(),
            hit_rate: info.hit_rate(),
            info,
        }
    }
}

impl From<CacheSummary> for CacheResponse {
    fn from(summary: CacheSummary) -> Self {
        Self::new(summary.name, summary.info)
    }
}

/// Options given to caches created through the registry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefaultsResponse {
    /// None = unbounded
    pub maxsize: Option<usize>,
    /// None = entries never expire
    pub ttl_secs: Option<f64>,
}

impl From<CacheOptions> for DefaultsResponse {
    fn from(options: CacheOptions) -> Self {
        Self {
            maxsize: options.maxsize,
            ttl_secs: options.ttl.map(|ttl| ttl.as_secs_f64()),
        }
    }
}

/// Response body for the listing endpoint (GET /caches)
#[derive(Debug, Clone, Serialize)]
pub struct CacheListResponse {
    pub defaults: DefaultsResponse,
    pub caches: Vec<CacheResponse>,
}

impl CacheListResponse {
    pub fn new(defaults: CacheOptions, summaries: Vec<CacheSummary>) -> Self {
        Self {
            defaults: defaults.into(),
            caches: summaries.into_iter().map(CacheResponse::from).collect(),
        }
    }
}

/// Response body for DELETE /caches/:name
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    /// Success message
    pub message: String,
    pub name: String,
}

impl ClearResponse {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            message: format!("Cache '{}' cleared", name),
            name,
        }
    }
}

/// Response body for POST /caches/:name/discard
#[derive(Debug, Clone, Serialize)]
pub struct DiscardResponse {
    pub name: String,
    /// Normalized key that was looked up
    pub key: String,
    /// Whether an entry was present and removed
    pub discarded: bool,
}

/// Response body for POST /caches/:name/purge
#[derive(Debug, Clone, Serialize)]
pub struct PurgeResponse {
    pub name: String,
    /// Number of expired entries removed
    pub removed: usize,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
