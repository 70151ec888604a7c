//! # Key Manager Service
//!
//! Orchestrates the store, the projection cache, the rate limiter and the
//! audit trail around one API key lifecycle.
//!
//! ## Architecture
//!
//! - `verify.rs`: the verification pipeline (never returns `Err`)
//! - `lifecycle.rs`: guarded transitions (create, revoke, enable, disable,
//!   rotate, update, delete)
//! - `audit.rs`: event fan-out and audit log reads
//!
//! Every collaborator is injected through [`KeyManagerDependencies`].

mod audit;
mod lifecycle;
mod verify;

pub use lifecycle::{IssuedKey, RotatedKey};

use crate::domain::{scopes, CachedKeyState, KeyManagerConfig, KeyResult, KeyState};
use crate::ports::KeyEventListener;
use kw_01_cache::Cache;
use kw_02_rate_limiter::RateLimiter;
use kw_03_key_store::KeyStore;
use kw_telemetry::{noop_logger, SharedLogger};
use parking_lot::RwLock;
use shared_types::{ApiKeyRecord, SystemTimeSource, TimeSource};
use std::sync::Arc;

const COMPONENT: &str = "key_manager";

/// Dependencies for [`KeyManager`].
pub struct KeyManagerDependencies {
    pub store: Arc<dyn KeyStore>,
    pub cache: Option<Arc<dyn Cache>>,
    pub rate_limiter: Option<Arc<RateLimiter>>,
    pub time_source: Arc<dyn TimeSource>,
    pub logger: SharedLogger,
}

impl KeyManagerDependencies {
    /// Store only: no cache, no limiter, system clock, no-op logger.
    pub fn new(store: Arc<dyn KeyStore>) -> Self {
        Self {
            store,
            cache: None,
            rate_limiter: None,
            time_source: Arc::new(SystemTimeSource),
            logger: noop_logger(),
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_rate_limiter(mut self, rate_limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = Some(rate_limiter);
        self
    }

    pub fn with_time_source(mut self, time_source: Arc<dyn TimeSource>) -> Self {
        self.time_source = time_source;
        self
    }

    pub fn with_logger(mut self, logger: SharedLogger) -> Self {
        self.logger = logger;
        self
    }
}

/// API key lifecycle and verification service.
pub struct KeyManager {
    pub(crate) store: Arc<dyn KeyStore>,
    pub(crate) cache: Option<Arc<dyn Cache>>,
    pub(crate) rate_limiter: Option<Arc<RateLimiter>>,
    pub(crate) time_source: Arc<dyn TimeSource>,
    pub(crate) logger: SharedLogger,
    pub(crate) config: KeyManagerConfig,
    pub(crate) listeners: RwLock<Vec<Arc<dyn KeyEventListener>>>,
}

impl KeyManager {
    /// Create a key manager. Fails if `config` does not validate.
    pub fn new(deps: KeyManagerDependencies, config: KeyManagerConfig) -> KeyResult<Self> {
        config.validate()?;
        Ok(Self {
            store: deps.store,
            cache: deps.cache,
            rate_limiter: deps.rate_limiter,
            time_source: deps.time_source,
            logger: deps.logger,
            config,
            listeners: RwLock::new(Vec::new()),
        })
    }

    pub fn config(&self) -> &KeyManagerConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn KeyStore> {
        &self.store
    }

    /// Register a listener for lifecycle events.
    pub fn add_listener(&self, listener: Arc<dyn KeyEventListener>) {
        self.listeners.write().push(listener);
    }

    /// Digest of `secret` under the configured algorithm and salt.
    pub fn hash_key(&self, secret: &str) -> String {
        shared_crypto::digest(secret, self.config.algorithm, self.config.salt.as_deref())
    }

    /// Constant-time check of `secret` against a record's digest.
    pub fn matches_secret(&self, secret: &str, record: &ApiKeyRecord) -> bool {
        shared_crypto::validate(
            secret,
            &record.secret_digest,
            self.config.algorithm,
            self.config.salt.as_deref(),
        )
    }

    pub fn is_expired(&self, record: &ApiKeyRecord) -> bool {
        record.is_expired_at(self.time_source.now_ms())
    }

    pub fn key_state(&self, record: &ApiKeyRecord) -> KeyState {
        KeyState::of(record, self.time_source.now_ms())
    }

    /// Drop the verification projection for `digest`. Cache errors are logged.
    pub async fn invalidate_cache(&self, digest: &str) {
        let Some(cache) = &self.cache else {
            return;
        };
        if let Err(err) = cache.delete(&CachedKeyState::cache_key(digest)).await {
            self.logger.warn(
                COMPONENT,
                "Failed to invalidate cached key state",
                &[("error", &err)],
            );
        }
    }

    // Reads

    pub async fn get_by_id(&self, id: &str) -> KeyResult<Option<ApiKeyRecord>> {
        Ok(self.store.find_by_id(id).await?)
    }

    /// All records of `owner_id`, revoked ones included.
    pub async fn list(&self, owner_id: &str) -> KeyResult<Vec<ApiKeyRecord>> {
        Ok(self.store.find_by_owner(owner_id).await?)
    }

    pub async fn find_by_tag(&self, tag: &str, owner_id: Option<&str>) -> KeyResult<Vec<ApiKeyRecord>> {
        Ok(self.store.find_by_tag(tag, owner_id).await?)
    }

    /// Records carrying any of `tags`.
    pub async fn find_by_tags(
        &self,
        tags: &[String],
        owner_id: Option<&str>,
    ) -> KeyResult<Vec<ApiKeyRecord>> {
        Ok(self.store.find_by_tags(tags, owner_id).await?)
    }

    // Scope checks

    pub fn has_scope(&self, record: &ApiKeyRecord, scope: &str) -> bool {
        scopes::has_scope(record, scope)
    }

    pub fn has_any_scope<S: AsRef<str>>(&self, record: &ApiKeyRecord, required: &[S]) -> bool {
        scopes::has_any_scope(record, required)
    }

    pub fn has_all_scopes<S: AsRef<str>>(&self, record: &ApiKeyRecord, required: &[S]) -> bool {
        scopes::has_all_scopes(record, required)
    }

    pub fn has_resource_scope(
        &self,
        record: &ApiKeyRecord,
        resource_type: &str,
        resource_id: &str,
        scope: &str,
    ) -> bool {
        scopes::has_resource_scope(record, resource_type, resource_id, scope)
    }

    pub fn check_resource_scopes<S: AsRef<str>>(
        &self,
        record: &ApiKeyRecord,
        resource_type: &str,
        resource_id: &str,
        required: &[S],
    ) -> bool {
        scopes::check_resource_scopes(record, resource_type, resource_id, required)
    }

    pub fn resource_scopes(
        &self,
        record: &ApiKeyRecord,
        resource_type: &str,
        resource_id: &str,
    ) -> Vec<String> {
        scopes::resource_scopes(record, resource_type, resource_id)
    }
}
