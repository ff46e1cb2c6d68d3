//! Dynamo Cache - in-process caching core for async services
//!
//! Provides argument-normalized cache keys, an O(1) LRU map, single-flight
//! async memoization with TTL expiry, and case-insensitive prefix tries,
//! plus an optional admin HTTP API over a registry of named caches.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{AsyncMemoizer, CacheOptions, CacheRegistry, LruCache, TaskCache, Trie};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::spawn_sweep_task;
