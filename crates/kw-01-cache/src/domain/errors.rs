//! # Domain Errors
//!
//! Error types for cache backends.

use thiserror::Error;

/// Errors that can occur during cache operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// The backend could not be reached or rejected the command.
    #[error("Cache backend error: {0}")]
    Backend(String),

    /// A value could not be encoded or decoded.
    #[error("Cache serialization error: {0}")]
    Serialization(String),

    /// `increment` hit a key holding a non-integer value.
    #[error("Value at {key} is not an integer counter")]
    InvalidCounter { key: String },

    /// The configured backend is not compiled in.
    #[error("Unsupported cache backend: {0}")]
    Unsupported(String),

    /// Configuration rejected by `validate`.
    #[error("Invalid cache configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
