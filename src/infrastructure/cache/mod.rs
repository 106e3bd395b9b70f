//! Caching layer for fast redirect lookups.
//!
//! - [`CacheBackend`] - key-value capability with two implementations:
//!   [`RedisBackend`] for production and [`MemoryBackend`] for local runs and tests
//! - [`CacheStore`] - positive and negative tiers with jittered TTLs,
//!   bounded operations, and fail-open error handling
//! - [`KeySchema`] - versioned, namespaced key layout

mod backend;
mod keys;
mod memory_backend;
mod redis_backend;
mod store;

pub use backend::{CacheBackend, CacheError, CacheResult};
#[cfg(test)]
pub use backend::MockCacheBackend;
pub use keys::{DEFAULT_NAMESPACE, KeySchema, SCHEMA_VERSION};
pub use memory_backend::{DEFAULT_MAX_ENTRIES, MemoryBackend};
pub use redis_backend::RedisBackend;
pub use store::{CacheSettings, CacheStore, CachedLink, NOT_FOUND_SENTINEL, jittered_ttl};
