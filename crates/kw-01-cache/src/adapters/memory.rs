//! Process-local cache backend.
//!
//! Entries live in an `LruCache` behind a single mutex. Expiry is checked
//! lazily on read; [`MemoryCache::purge_expired`] and the optional sweeper
//! reclaim dead entries in bulk. When a bound is configured, expired entries
//! are reclaimed before any live entry is evicted, and live entries leave in
//! least-recently-used order.

use crate::domain::{CacheError, CacheResult};
use crate::ports::Cache;
use async_trait::async_trait;
use kw_telemetry::{noop_logger, SharedLogger};
use lru::LruCache;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

const COMPONENT: &str = "memory_cache";

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(value: String, ttl_seconds: u64, now: Instant) -> Self {
        let expires_at = (ttl_seconds > 0).then(|| now + Duration::from_secs(ttl_seconds));
        Self { value, expires_at }
    }

    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(at) if at <= now)
    }
}

/// In-memory [`Cache`].
pub struct MemoryCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
    max_entries: Option<usize>,
    logger: SharedLogger,
}

impl MemoryCache {
    /// Unbounded cache.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(LruCache::unbounded()),
            max_entries: None,
            logger: noop_logger(),
        }
    }

    /// Cache holding at most `max_entries` entries (a bound of 0 is treated as 1).
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            max_entries: Some(max_entries.max(1)),
            ..Self::new()
        }
    }

    pub fn with_logger(mut self, logger: SharedLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Number of stored entries, including expired ones not yet reclaimed.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        Self::purge_expired_locked(&mut entries, now)
    }

    /// Run [`purge_expired`](Self::purge_expired) every `interval` until the
    /// cache is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // First tick fires immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(cache) = weak.upgrade() else {
                    break;
                };
                let removed = cache.purge_expired();
                if removed > 0 {
                    cache
                        .logger
                        .debug(COMPONENT, "Swept expired entries", &[("removed", &removed)]);
                }
            }
        })
    }

    fn purge_expired_locked(entries: &mut LruCache<String, CacheEntry>, now: Instant) -> usize {
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            entries.pop(key);
        }
        expired.len()
    }

    /// Insert under the lock, making room first if the cache is bounded.
    fn insert_locked(
        &self,
        entries: &mut LruCache<String, CacheEntry>,
        key: &str,
        entry: CacheEntry,
        now: Instant,
    ) {
        if let Some(max) = self.max_entries {
            if !entries.contains(key) && entries.len() >= max {
                Self::purge_expired_locked(entries, now);
                while entries.len() >= max {
                    match entries.pop_lru() {
                        Some((evicted, _)) => {
                            self.logger.debug(
                                COMPONENT,
                                "Evicted least recently used entry",
                                &[("key", &evicted)],
                            );
                        }
                        None => break,
                    }
                }
            }
        }
        entries.put(key.to_string(), entry);
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        match entries.get(key) {
            None => return Ok(None),
            Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
            Some(_) => {}
        }

        entries.pop(key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> CacheResult<()> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        self.insert_locked(
            &mut entries,
            key,
            CacheEntry::new(value.to_string(), ttl_seconds, now),
            now,
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.entries.lock().pop(key);
        Ok(())
    }

    async fn increment(&self, key: &str, ttl_seconds: u64) -> CacheResult<i64> {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let current = match entries.peek(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry
                    .value
                    .parse::<i64>()
                    .map_err(|_| CacheError::InvalidCounter {
                        key: key.to_string(),
                    })?
            }
            _ => 0,
        };

        let next = current + 1;
        self.insert_locked(
            &mut entries,
            key,
            CacheEntry::new(next.to_string(), ttl_seconds, now),
            now,
        );
        Ok(next)
    }
}
