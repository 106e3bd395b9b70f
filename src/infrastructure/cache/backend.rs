//! Cache backend capability and error types.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during cache backend operations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    Connection(String),

    #[error("Cache operation error: {0}")]
    Operation(String),
}

/// Result type for cache backend operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Minimal key-value capability the cache tiers are built on.
///
/// Implementations report failures as errors and must not hang forever;
/// [`crate::infrastructure::cache::CacheStore`] additionally bounds every
/// call with its own deadline and absorbs all errors.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisBackend`] - shared Redis connection
/// - [`crate::infrastructure::cache::MemoryBackend`] - in-process map with expiry
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Returns the raw value stored under `key`, if any.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Stores `value` under `key`, expiring after `ttl_seconds`.
    async fn set_with_expiry(&self, key: &str, value: &str, ttl_seconds: u64) -> CacheResult<()>;

    /// Removes `key`. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Round-trips a liveness check.
    async fn ping(&self) -> CacheResult<()>;
}
