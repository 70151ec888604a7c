//! Cache backends and the config-driven factory.

mod memory;
#[cfg(feature = "redis")]
mod redis_cache;

pub use memory::MemoryCache;
#[cfg(feature = "redis")]
pub use redis_cache::RedisCache;

use crate::domain::{CacheBackend, CacheConfig, CacheError};
use crate::ports::Cache;
use kw_telemetry::SharedLogger;
use std::sync::Arc;
use std::time::Duration;

/// Build the backend selected by `config`.
///
/// Must be called from within a tokio runtime when a sweep interval or the
/// redis backend is configured.
pub async fn build_cache(
    config: &CacheConfig,
    logger: SharedLogger,
) -> Result<Arc<dyn Cache>, CacheError> {
    config.validate()?;

    match config.backend {
        CacheBackend::Memory => {
            let cache = match config.max_entries {
                Some(max) => MemoryCache::with_max_entries(max),
                None => MemoryCache::new(),
            };
            let cache = Arc::new(cache.with_logger(Arc::clone(&logger)));
            if let Some(ms) = config.sweep_interval_ms {
                cache.spawn_sweeper(Duration::from_millis(ms));
            }
            logger.info(
                "cache",
                "Memory cache ready",
                &[("bounded", &config.max_entries.is_some())],
            );
            Ok(cache)
        }
        CacheBackend::Redis => build_redis(config, logger).await,
    }
}

#[cfg(feature = "redis")]
async fn build_redis(
    config: &CacheConfig,
    logger: SharedLogger,
) -> Result<Arc<dyn Cache>, CacheError> {
    let url = config
        .redis_url
        .as_deref()
        .ok_or_else(|| CacheError::InvalidConfig("redis backend requires redis_url".into()))?;
    let cache = RedisCache::connect(url, config.key_prefix.clone()).await?;
    logger.info("cache", "Redis cache connected", &[]);
    Ok(Arc::new(cache))
}

#[cfg(not(feature = "redis"))]
async fn build_redis(
    _config: &CacheConfig,
    logger: SharedLogger,
) -> Result<Arc<dyn Cache>, CacheError> {
    logger.error("cache", "Redis backend requested but not compiled in", &[]);
    Err(CacheError::Unsupported(
        "crate built without the `redis` feature".into(),
    ))
}
