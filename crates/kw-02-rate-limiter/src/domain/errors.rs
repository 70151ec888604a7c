//! Rate limiter errors.

use kw_01_cache::CacheError;
use thiserror::Error;

/// Errors raised by [`crate::RateLimiter`].
#[derive(Debug, Error)]
pub enum RateLimitError {
    /// Window or budget was zero.
    #[error("invalid rate limit configuration: {0}")]
    InvalidConfig(String),

    /// The counter backend failed.
    #[error("rate limit counter unavailable: {0}")]
    Cache(#[from] CacheError),
}
