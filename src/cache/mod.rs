//! Cache Module
//!
//! In-process caching core: argument keys, LRU storage, single-flight async
//! memoization with TTL expiry, and prefix tries for autocomplete.

mod entry;
mod key;
mod lru;
mod memo;
mod options;
mod registry;
mod stats;
mod trie;
mod vocab;


// Re-export public types
pub use key::{make_key, Args, CacheKey, FloatBits, HashedSeq, KeyPart, KeySource};
pub use lru::LruCache;
pub use memo::{AsyncMemoizer, CacheFuture, TaskCache};
pub use options::{CacheOptions, DEFAULT_MAXSIZE};
pub use registry::{CacheRegistry, CacheReport, CacheSummary};
pub use stats::CacheInfo;
pub use trie::Trie;
pub use vocab::VocabularyIndex;
