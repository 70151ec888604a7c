//! Cache configuration with validation.

use crate::domain::errors::CacheError;
use serde::{Deserialize, Serialize};
use std::env;

/// Which backend [`crate::build_cache`] constructs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Process-local map.
    #[default]
    Memory,
    /// Remote Redis-compatible store.
    Redis,
}

/// Cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Backend selection
    pub backend: CacheBackend,
    /// Entry bound for the memory backend (None = unbounded)
    pub max_entries: Option<usize>,
    /// Background expiry sweep for the memory backend (None = lazy only)
    pub sweep_interval_ms: Option<u64>,
    /// Connection URL for the redis backend
    pub redis_url: Option<String>,
    /// Namespace prepended to every key by the redis backend
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            max_entries: None,
            sweep_interval_ms: None,
            redis_url: None,
            key_prefix: String::new(),
        }
    }
}

impl CacheConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), CacheError> {
        if self.max_entries == Some(0) {
            return Err(CacheError::InvalidConfig(
                "max_entries cannot be 0".into(),
            ));
        }

        if self.sweep_interval_ms == Some(0) {
            return Err(CacheError::InvalidConfig(
                "sweep_interval_ms cannot be 0".into(),
            ));
        }

        if self.backend == CacheBackend::Redis && self.redis_url.is_none() {
            return Err(CacheError::InvalidConfig(
                "redis backend requires redis_url".into(),
            ));
        }

        Ok(())
    }

    /// Create configuration from environment variables.
    ///
    /// - `KEYWARD_CACHE_BACKEND`: `memory` or `redis` (default: memory)
    /// - `KEYWARD_CACHE_MAX_ENTRIES`: entry bound (default: unbounded)
    /// - `KEYWARD_CACHE_SWEEP_MS`: sweep interval (default: none)
    /// - `KEYWARD_REDIS_URL`: redis connection URL
    /// - `KEYWARD_CACHE_PREFIX`: redis key namespace
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            backend: match env::var("KEYWARD_CACHE_BACKEND").map(|v| v.to_lowercase()) {
                Ok(v) if v == "redis" => CacheBackend::Redis,
                _ => CacheBackend::Memory,
            },
            max_entries: env::var("KEYWARD_CACHE_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok()),
            sweep_interval_ms: env::var("KEYWARD_CACHE_SWEEP_MS")
                .ok()
                .and_then(|v| v.parse().ok()),
            redis_url: env::var("KEYWARD_REDIS_URL").ok(),
            key_prefix: env::var("KEYWARD_CACHE_PREFIX").unwrap_or(defaults.key_prefix),
        }
    }
}
