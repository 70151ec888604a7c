//! Rate limiter configuration.

use crate::domain::errors::RateLimitError;
use serde::{Deserialize, Serialize};
use std::env;

/// Fixed-window limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Window length in milliseconds
    pub window_ms: u64,
    /// Requests allowed per window
    pub max_requests: u64,
    /// First segment of every counter key
    pub key_prefix: String,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_ms: 60_000,
            max_requests: 100,
            key_prefix: "ratelimit".to_string(),
        }
    }
}

impl RateLimitConfig {
    pub fn new(window_ms: u64, max_requests: u64) -> Self {
        Self {
            window_ms,
            max_requests,
            ..Self::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), RateLimitError> {
        if self.window_ms == 0 {
            return Err(RateLimitError::InvalidConfig(
                "window_ms must be greater than 0".into(),
            ));
        }
        if self.max_requests == 0 {
            return Err(RateLimitError::InvalidConfig(
                "max_requests must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Counter TTL: the window rounded up to whole seconds.
    pub fn ttl_seconds(&self) -> u64 {
        self.window_ms.div_ceil(1000)
    }

    /// Create configuration from environment variables.
    ///
    /// - `KEYWARD_RATE_LIMIT_WINDOW_MS` (default: 60000)
    /// - `KEYWARD_RATE_LIMIT_MAX` (default: 100)
    /// - `KEYWARD_RATE_LIMIT_PREFIX` (default: `ratelimit`)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            window_ms: env::var("KEYWARD_RATE_LIMIT_WINDOW_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.window_ms),
            max_requests: env::var("KEYWARD_RATE_LIMIT_MAX")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_requests),
            key_prefix: env::var("KEYWARD_RATE_LIMIT_PREFIX").unwrap_or(defaults.key_prefix),
        }
    }
}
