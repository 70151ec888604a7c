//! Cache port.

use crate::domain::CacheResult;
use async_trait::async_trait;

/// Key-value cache with per-entry TTL and an atomic counter.
///
/// TTLs are in seconds; `0` means the entry never expires.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Get a live value.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Store `value`, replacing any previous value and TTL.
    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> CacheResult<()>;

    /// Remove `key`.
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Add one to the counter at `key` and (re)apply `ttl_seconds`.
    ///
    /// A missing or expired key counts from zero. Implementations MUST make
    /// the read, the write and the TTL update a single atomic step.
    async fn increment(&self, key: &str, ttl_seconds: u64) -> CacheResult<i64>;
}
