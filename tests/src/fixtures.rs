//! Shared wiring for the integration flows.

use async_trait::async_trait;
use kw_01_cache::{Cache, MemoryCache};
use kw_02_rate_limiter::{RateLimitConfig, RateLimiter};
use kw_03_key_store::{
    AuditLogStore, InMemoryKVStore, InMemoryKeyStore, KeyStore, KvKeyStore, Precondition,
    StoreResult,
};
use kw_04_key_manager::{KeyManager, KeyManagerConfig, KeyManagerDependencies};
use kw_telemetry::RecordingLogger;
use shared_types::{ApiKeyRecord, ManualTimeSource, MetadataPatch};
use std::sync::Arc;

/// Fixed start of the manual clock (2023-11-14T22:13:20Z).
pub const T0: u64 = 1_700_000_000_000;

/// Which store backs a [`Stack`].
#[derive(Debug, Clone, Copy)]
pub enum Backend {
    Memory,
    KeyValue,
}

impl Backend {
    pub const ALL: [Backend; 2] = [Backend::Memory, Backend::KeyValue];

    pub fn store(self) -> Arc<dyn KeyStore> {
        match self {
            Backend::Memory => Arc::new(InMemoryKeyStore::new()),
            Backend::KeyValue => Arc::new(KvKeyStore::new(InMemoryKVStore::new())),
        }
    }
}

/// Store wrapper that yields before every read and write, so operations
/// joined on one task interleave at each store call.
pub struct YieldingStore {
    inner: Arc<dyn KeyStore>,
}

impl YieldingStore {
    pub fn new(inner: Arc<dyn KeyStore>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl KeyStore for YieldingStore {
    async fn save(&self, record: ApiKeyRecord) -> StoreResult<()> {
        tokio::task::yield_now().await;
        self.inner.save(record).await
    }
    async fn find_by_hash(&self, digest: &str) -> StoreResult<Option<ApiKeyRecord>> {
        tokio::task::yield_now().await;
        self.inner.find_by_hash(digest).await
    }
    async fn find_revoked_by_hash(&self, digest: &str) -> StoreResult<Option<ApiKeyRecord>> {
        tokio::task::yield_now().await;
        self.inner.find_revoked_by_hash(digest).await
    }
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<ApiKeyRecord>> {
        tokio::task::yield_now().await;
        self.inner.find_by_id(id).await
    }
    async fn find_by_owner(&self, owner_id: &str) -> StoreResult<Vec<ApiKeyRecord>> {
        tokio::task::yield_now().await;
        self.inner.find_by_owner(owner_id).await
    }
    async fn find_by_tag(&self, tag: &str, owner_id: Option<&str>) -> StoreResult<Vec<ApiKeyRecord>> {
        tokio::task::yield_now().await;
        self.inner.find_by_tag(tag, owner_id).await
    }
    async fn find_by_tags(
        &self,
        tags: &[String],
        owner_id: Option<&str>,
    ) -> StoreResult<Vec<ApiKeyRecord>> {
        tokio::task::yield_now().await;
        self.inner.find_by_tags(tags, owner_id).await
    }
    async fn update_metadata_if(
        &self,
        id: &str,
        precondition: Precondition,
        patch: &MetadataPatch,
    ) -> StoreResult<ApiKeyRecord> {
        tokio::task::yield_now().await;
        self.inner.update_metadata_if(id, precondition, patch).await
    }
    async fn delete(&self, id: &str) -> StoreResult<bool> {
        tokio::task::yield_now().await;
        self.inner.delete(id).await
    }
    async fn delete_by_owner(&self, owner_id: &str) -> StoreResult<Vec<ApiKeyRecord>> {
        tokio::task::yield_now().await;
        self.inner.delete_by_owner(owner_id).await
    }
    fn audit_log(&self) -> Option<&dyn AuditLogStore> {
        self.inner.audit_log()
    }
}

/// A fully wired key manager with handles on every collaborator.
pub struct Stack {
    pub manager: KeyManager,
    pub store: Arc<dyn KeyStore>,
    pub cache: Arc<dyn Cache>,
    pub clock: Arc<ManualTimeSource>,
    pub logger: Arc<RecordingLogger>,
    pub limiter: Option<Arc<RateLimiter>>,
}

/// Config with background usage tracking off so store reads stay deterministic.
pub fn quiet_config() -> KeyManagerConfig {
    KeyManagerConfig {
        auto_track_usage: false,
        audit_logs: true,
        ..KeyManagerConfig::default()
    }
}

pub struct StackBuilder {
    backend: Backend,
    config: KeyManagerConfig,
    limit: Option<RateLimitConfig>,
    interleaved: bool,
}

impl StackBuilder {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            config: quiet_config(),
            limit: None,
            interleaved: false,
        }
    }

    pub fn config(mut self, config: KeyManagerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn rate_limit(mut self, limit: RateLimitConfig) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Wrap the store in a [`YieldingStore`].
    pub fn interleaved(mut self) -> Self {
        self.interleaved = true;
        self
    }

    pub fn build(self) -> Stack {
        let store: Arc<dyn KeyStore> = if self.interleaved {
            Arc::new(YieldingStore::new(self.backend.store()))
        } else {
            self.backend.store()
        };
        let clock = Arc::new(ManualTimeSource::new(T0));
        let logger = Arc::new(RecordingLogger::new());
        let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new().with_logger(logger.clone()));

        let limiter = self.limit.map(|limit| {
            Arc::new(
                RateLimiter::new(cache.clone(), limit, clock.clone())
                    .expect("valid rate limit config")
                    .with_logger(logger.clone()),
            )
        });

        let mut deps = KeyManagerDependencies::new(store.clone())
            .with_cache(cache.clone())
            .with_time_source(clock.clone())
            .with_logger(logger.clone());
        if let Some(limiter) = &limiter {
            deps = deps.with_rate_limiter(limiter.clone());
        }

        let manager = KeyManager::new(deps, self.config).expect("valid key manager config");
        Stack {
            manager,
            store,
            cache,
            clock,
            logger,
            limiter,
        }
    }
}
