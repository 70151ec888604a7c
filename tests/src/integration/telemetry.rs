//! Config-driven wiring: cache factory, tracing logger and event listeners.

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use kw_01_cache::{build_cache, CacheConfig};
    use kw_03_key_store::InMemoryKeyStore;
    use kw_04_key_manager::{
        CreateKeyRequest, KeyEvent, KeyEventListener, KeyManager, KeyManagerConfig,
        KeyManagerDependencies, VerifyOptions,
    };
    use kw_telemetry::{SharedLogger, TracingLogger};
    use parking_lot::Mutex;
    use shared_types::AuditAction;
    use std::sync::Arc;

    #[derive(Default)]
    struct ActionLog(Mutex<Vec<(AuditAction, String)>>);

    #[async_trait]
    impl KeyEventListener for ActionLog {
        async fn on_event(&self, event: &KeyEvent) {
            self.0.lock().push((event.action, event.key_id.clone()));
        }
    }

    #[tokio::test]
    async fn test_factory_cache_and_tracing_logger() {
        let logger: SharedLogger = Arc::new(TracingLogger);
        let config = CacheConfig {
            max_entries: Some(16),
            sweep_interval_ms: Some(1_000),
            ..CacheConfig::default()
        };
        let cache = build_cache(&config, logger.clone()).await.unwrap();

        let deps = KeyManagerDependencies::new(Arc::new(InMemoryKeyStore::new()))
            .with_cache(cache)
            .with_logger(logger);
        let manager = KeyManager::new(deps, KeyManagerConfig::default()).unwrap();
        let events = Arc::new(ActionLog::default());
        manager.add_listener(events.clone());

        let issued = manager
            .create(CreateKeyRequest::new("user-1"), None)
            .await
            .unwrap();
        assert!(manager.verify(&issued.secret, VerifyOptions::default()).await.valid);
        manager.revoke(&issued.record.id, None).await.unwrap();

        let seen = events.0.lock().clone();
        assert_eq!(
            seen,
            vec![
                (AuditAction::Created, issued.record.id.clone()),
                (AuditAction::Revoked, issued.record.id.clone()),
            ]
        );
    }

    #[test]
    fn test_partial_config_document_fills_defaults() {
        let config: KeyManagerConfig = serde_json::from_value(serde_json::json!({
            "prefix": "sk_test_",
            "key_length": 40,
            "algorithm": "sha512",
        }))
        .unwrap();
        assert_eq!(config.prefix.as_deref(), Some("sk_test_"));
        assert_eq!(config.key_length, 40);
        assert_eq!(config.cache_ttl_secs, KeyManagerConfig::default().cache_ttl_secs);
        assert!(config.validate().is_ok());
    }
}
