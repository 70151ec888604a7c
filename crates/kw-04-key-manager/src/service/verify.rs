//! Verification pipeline.
//!
//! ```text
//! extract -> prefix -> digest -> projection? -> store -> validity -> limiter -> success
//! ```
//!
//! A cached negative (revoked, expired) may short-circuit. A cached positive
//! or disabled projection is only a pointer: the authoritative record is
//! loaded by id and the secret re-checked before anything is trusted.

use super::{KeyManager, COMPONENT};
use crate::domain::headers::extract_secret;
use crate::domain::{CachedKeyState, ErrorCode, KeyCarrier, RateLimitInfo, VerifyOptions, VerifyResult};
use kw_02_rate_limiter::CheckOptions;
use kw_03_key_store::StoreError;
use shared_types::{ApiKeyRecord, MetadataPatch, Timestamp};
use std::sync::Arc;

/// Result of resolving a digest to a record.
enum Lookup {
    Found(ApiKeyRecord),
    Rejected(VerifyResult),
}

impl KeyManager {
    /// Verify a secret, never returning an error.
    ///
    /// Every failure is reported through [`VerifyResult::error_code`].
    pub async fn verify(&self, carrier: impl Into<KeyCarrier>, options: VerifyOptions) -> VerifyResult {
        let Some(secret) = self.extract(carrier.into()) else {
            return VerifyResult::failure(ErrorCode::MissingKey);
        };

        if self.config.require_prefix {
            let prefix = self.config.prefix.as_deref().unwrap_or_default();
            if !secret.starts_with(prefix) {
                return VerifyResult::failure(ErrorCode::InvalidFormat);
            }
        }

        let digest = self.hash_key(&secret);
        let use_cache = self.cache.is_some() && !options.skip_cache;

        let record = match self.lookup(&secret, &digest, use_cache).await {
            Ok(Lookup::Found(record)) => record,
            Ok(Lookup::Rejected(result)) => return result,
            Err(err) => {
                self.logger.error(
                    COMPONENT,
                    "Key lookup failed during verification",
                    &[("error", &err)],
                );
                return VerifyResult::failure_with(ErrorCode::InvalidKey, err.to_string());
            }
        };

        let now = self.time_source.now_ms();
        if let Some(code) = validity_failure(&record, now) {
            if use_cache {
                self.invalidate_cache(&digest).await;
            }
            return VerifyResult::failure(code);
        }

        let mut rate_limit = None;
        if let Some(limiter) = &self.rate_limiter {
            let check = CheckOptions {
                increment: true,
                identifier: options.rate_limit_identifier.clone(),
            };
            match limiter.check(&record.id, check).await {
                Ok(result) if !result.allowed => {
                    return VerifyResult::failure(ErrorCode::RateLimitExceeded)
                        .with_rate_limit(RateLimitInfo::from(&result));
                }
                Ok(result) => rate_limit = Some(RateLimitInfo::from(&result)),
                Err(err) => {
                    // Fail open
                    self.logger.warn(
                        COMPONENT,
                        "Rate limiter unavailable, allowing request",
                        &[("key_id", &record.id), ("error", &err)],
                    );
                }
            }
        }

        if use_cache {
            self.write_projection(&digest, &record).await;
        }

        if self.config.auto_track_usage && !options.skip_tracking {
            self.track_usage(&record.id, now);
        }

        let mut result = VerifyResult::success(record);
        result.rate_limit = rate_limit;
        result
    }

    fn extract(&self, carrier: KeyCarrier) -> Option<String> {
        match carrier {
            KeyCarrier::Secret(secret) => {
                let secret = secret.trim();
                (!secret.is_empty()).then(|| secret.to_string())
            }
            KeyCarrier::Headers(headers) => extract_secret(
                &headers,
                &self.config.header_names,
                self.config.extract_bearer,
            ),
        }
    }

    async fn lookup(&self, secret: &str, digest: &str, use_cache: bool) -> Result<Lookup, StoreError> {
        if use_cache {
            if let Some(projection) = self.read_projection(digest).await {
                return self.confirm_projection(secret, digest, projection).await;
            }
        }

        if let Some(record) = self.store.find_by_hash(digest).await? {
            return Ok(Lookup::Found(record));
        }
        // Tombstone: reported as REVOKED by the validity check
        if let Some(record) = self.store.find_revoked_by_hash(digest).await? {
            return Ok(Lookup::Found(record));
        }
        Ok(Lookup::Rejected(VerifyResult::failure(ErrorCode::InvalidKey)))
    }

    async fn confirm_projection(
        &self,
        secret: &str,
        digest: &str,
        projection: CachedKeyState,
    ) -> Result<Lookup, StoreError> {
        let now = self.time_source.now_ms();
        if projection.expires_at.is_some_and(|at| at <= now) {
            return Ok(Lookup::Rejected(VerifyResult::failure(ErrorCode::Expired)));
        }
        if projection.revoked_at.is_some() {
            return Ok(Lookup::Rejected(VerifyResult::failure(ErrorCode::Revoked)));
        }

        match self.store.find_by_id(&projection.id).await? {
            Some(record) if self.matches_secret(secret, &record) => Ok(Lookup::Found(record)),
            _ => {
                self.logger.warn(
                    COMPONENT,
                    "Cached key state points at a missing or different record",
                    &[("key_id", &projection.id)],
                );
                self.invalidate_cache(digest).await;
                Ok(Lookup::Rejected(VerifyResult::failure(ErrorCode::InvalidKey)))
            }
        }
    }

    /// Projection for `digest`, or `None` on miss, cache error, or garbage
    /// (which is deleted).
    async fn read_projection(&self, digest: &str) -> Option<CachedKeyState> {
        let cache = self.cache.as_ref()?;
        let key = CachedKeyState::cache_key(digest);

        let raw = match cache.get(&key).await {
            Ok(raw) => raw?,
            Err(err) => {
                self.logger.warn(COMPONENT, "Cache read failed", &[("error", &err)]);
                return None;
            }
        };

        match serde_json::from_str::<CachedKeyState>(&raw) {
            Ok(projection) => Some(projection),
            Err(err) => {
                self.logger.warn(
                    COMPONENT,
                    "Discarding malformed cached key state",
                    &[("error", &err)],
                );
                if let Err(err) = cache.delete(&key).await {
                    self.logger.warn(
                        COMPONENT,
                        "Failed to delete malformed cached key state",
                        &[("error", &err)],
                    );
                }
                None
            }
        }
    }

    async fn write_projection(&self, digest: &str, record: &ApiKeyRecord) {
        let Some(cache) = &self.cache else {
            return;
        };
        let projection = CachedKeyState::from(record);
        let json = match serde_json::to_string(&projection) {
            Ok(json) => json,
            Err(err) => {
                self.logger.error(
                    COMPONENT,
                    "Failed to encode cached key state",
                    &[("error", &err)],
                );
                return;
            }
        };

        if let Err(err) = cache
            .set(&CachedKeyState::cache_key(digest), &json, self.config.cache_ttl_secs)
            .await
        {
            self.logger.warn(
                COMPONENT,
                "Failed to cache key state",
                &[("key_id", &record.id), ("error", &err)],
            );
        }
    }

    /// Record `last_used_at` in the background. Failures are logged.
    fn track_usage(&self, id: &str, now: Timestamp) {
        let store = Arc::clone(&self.store);
        let logger = Arc::clone(&self.logger);
        let id = id.to_string();
        tokio::spawn(async move {
            let patch = MetadataPatch::new().last_used_at(now);
            if let Err(err) = store.update_metadata(&id, &patch).await {
                logger.warn(
                    COMPONENT,
                    "Failed to record key usage",
                    &[("key_id", &id), ("error", &err)],
                );
            }
        });
    }
}

/// Expiration, then revocation, then the enabled flag.
fn validity_failure(record: &ApiKeyRecord, now: Timestamp) -> Option<ErrorCode> {
    if record.is_expired_at(now) {
        Some(ErrorCode::Expired)
    } else if record.is_revoked() {
        Some(ErrorCode::Revoked)
    } else if !record.metadata.enabled {
        Some(ErrorCode::Disabled)
    } else {
        None
    }
}
