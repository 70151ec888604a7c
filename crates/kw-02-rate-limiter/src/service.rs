//! # Rate Limiter Service
//!
//! Stateless apart from configuration: every check is one cache round-trip.

use crate::domain::{CheckOptions, RateLimitConfig, RateLimitError, RateLimitResult};
use kw_01_cache::Cache;
use kw_telemetry::{noop_logger, SharedLogger};
use shared_types::{TimeSource, Timestamp};
use std::sync::Arc;

const COMPONENT: &str = "rate_limiter";

/// Fixed-window limiter.
pub struct RateLimiter {
    cache: Arc<dyn Cache>,
    config: RateLimitConfig,
    time_source: Arc<dyn TimeSource>,
    logger: SharedLogger,
}

impl RateLimiter {
    /// Create a limiter. Fails on a zero window or zero budget.
    pub fn new(
        cache: Arc<dyn Cache>,
        config: RateLimitConfig,
        time_source: Arc<dyn TimeSource>,
    ) -> Result<Self, RateLimitError> {
        config.validate()?;
        Ok(Self {
            cache,
            config,
            time_source,
            logger: noop_logger(),
        })
    }

    pub fn with_logger(mut self, logger: SharedLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Check (and by default count) a request for `subject_id`.
    pub async fn check(
        &self,
        subject_id: &str,
        options: CheckOptions,
    ) -> Result<RateLimitResult, RateLimitError> {
        let now = self.time_source.now_ms();
        let window_start = self.window_start(now);
        let subject = options.identifier.as_deref().unwrap_or(subject_id);
        let key = self.counter_key(subject, window_start);
        let limit = self.config.max_requests;

        let (current, allowed) = if options.increment {
            let count = self
                .cache
                .increment(&key, self.config.ttl_seconds())
                .await?;
            let count = clamp_count(count);
            (count, count <= limit)
        } else {
            let count = self.read_count(&key).await?;
            (count, count < limit)
        };

        let reset_at = window_start + self.config.window_ms;
        let result = RateLimitResult {
            allowed,
            current,
            limit,
            remaining: limit.saturating_sub(current),
            reset_ms: reset_at.saturating_sub(now),
            reset_at,
        };

        if !allowed {
            self.logger.debug(
                COMPONENT,
                "Request over limit",
                &[("subject", &subject), ("current", &current), ("limit", &limit)],
            );
        }

        Ok(result)
    }

    /// Drop the current window's counter for `subject_id`.
    pub async fn reset(&self, subject_id: &str) -> Result<(), RateLimitError> {
        let window_start = self.window_start(self.time_source.now_ms());
        self.cache
            .delete(&self.counter_key(subject_id, window_start))
            .await?;
        Ok(())
    }

    /// Requests counted so far in the current window.
    pub async fn get_current_count(&self, subject_id: &str) -> Result<u64, RateLimitError> {
        let window_start = self.window_start(self.time_source.now_ms());
        self.read_count(&self.counter_key(subject_id, window_start))
            .await
    }

    fn window_start(&self, now: Timestamp) -> Timestamp {
        (now / self.config.window_ms) * self.config.window_ms
    }

    fn counter_key(&self, subject: &str, window_start: Timestamp) -> String {
        format!("{}:{}:{}", self.config.key_prefix, subject, window_start)
    }

    async fn read_count(&self, key: &str) -> Result<u64, RateLimitError> {
        let raw = self.cache.get(key).await?;
        Ok(raw
            .and_then(|v| v.trim().parse::<i64>().ok())
            .map(clamp_count)
            .unwrap_or(0))
    }
}

fn clamp_count(count: i64) -> u64 {
    u64::try_from(count).unwrap_or(0)
}
