//! The projection cache must never make verification more permissive than
//! the store.

#[cfg(test)]
mod tests {
    use crate::fixtures::{Backend, StackBuilder};
    use kw_04_key_manager::{CachedKeyState, CreateKeyRequest, ErrorCode, VerifyOptions};
    use kw_telemetry::LogLevel;
    use shared_types::MetadataPatch;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_stale_positive_is_reconfirmed_against_store() {
        for backend in Backend::ALL {
            let stack = StackBuilder::new(backend).build();
            let issued = stack
                .manager
                .create(CreateKeyRequest::new("user-1"), None)
                .await
                .unwrap();
            assert!(stack.manager.verify(&issued.secret, VerifyOptions::default()).await.valid);

            // Bypass the manager so the cached positive goes stale
            stack
                .store
                .update_metadata(&issued.record.id, &MetadataPatch::new().enabled(false))
                .await
                .unwrap();

            let result = stack.manager.verify(&issued.secret, VerifyOptions::default()).await;
            assert_eq!(result.error_code, Some(ErrorCode::Disabled), "{backend:?}");
        }
    }

    #[tokio::test]
    async fn test_projection_to_deleted_record_is_dropped() {
        for backend in Backend::ALL {
            let stack = StackBuilder::new(backend).build();
            let issued = stack
                .manager
                .create(CreateKeyRequest::new("user-1"), None)
                .await
                .unwrap();
            stack.manager.verify(&issued.secret, VerifyOptions::default()).await;

            let key = CachedKeyState::cache_key(&issued.record.secret_digest);
            assert!(stack.cache.get(&key).await.unwrap().is_some());

            assert!(stack.store.delete(&issued.record.id).await.unwrap());
            let result = stack.manager.verify(&issued.secret, VerifyOptions::default()).await;
            assert_eq!(result.error_code, Some(ErrorCode::InvalidKey), "{backend:?}");
            assert!(stack.cache.get(&key).await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_malformed_projection_is_replaced() {
        let stack = StackBuilder::new(Backend::KeyValue).build();
        let issued = stack
            .manager
            .create(CreateKeyRequest::new("user-1"), None)
            .await
            .unwrap();
        let key = CachedKeyState::cache_key(&issued.record.secret_digest);
        stack.cache.set(&key, "{not json", 60).await.unwrap();

        assert!(stack.manager.verify(&issued.secret, VerifyOptions::default()).await.valid);
        assert!(stack.logger.contains(LogLevel::Warn, "malformed"));

        let raw = stack.cache.get(&key).await.unwrap().unwrap();
        let projection: CachedKeyState = serde_json::from_str(&raw).unwrap();
        assert_eq!(projection.id, issued.record.id);
    }

    #[tokio::test]
    async fn test_every_transition_invalidates_projection() {
        let stack = StackBuilder::new(Backend::Memory).build();
        let km = &stack.manager;
        let issued = km.create(CreateKeyRequest::new("user-1"), None).await.unwrap();
        let id = issued.record.id.clone();
        let key = CachedKeyState::cache_key(&issued.record.secret_digest);

        km.verify(&issued.secret, VerifyOptions::default()).await;
        km.disable(&id, None).await.unwrap();
        assert!(stack.cache.get(&key).await.unwrap().is_none());
        let result = km.verify(&issued.secret, VerifyOptions::default()).await;
        assert_eq!(result.error_code, Some(ErrorCode::Disabled));

        km.enable(&id, None).await.unwrap();
        assert!(km.verify(&issued.secret, VerifyOptions::default()).await.valid);
        assert!(stack.cache.get(&key).await.unwrap().is_some());

        km.update_metadata(&id, MetadataPatch::new().scopes(["admin"]), None)
            .await
            .unwrap();
        assert!(stack.cache.get(&key).await.unwrap().is_none());
        let result = km.verify(&issued.secret, VerifyOptions::default()).await;
        assert_eq!(result.record.unwrap().metadata.scopes, vec!["admin"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_no_success_after_revoke_returns() {
        let stack = Arc::new(StackBuilder::new(Backend::KeyValue).build());
        let issued = stack
            .manager
            .create(CreateKeyRequest::new("user-1"), None)
            .await
            .unwrap();
        let secret = Arc::new(issued.secret);

        let mut readers = Vec::new();
        for _ in 0..8 {
            let stack = Arc::clone(&stack);
            let secret = Arc::clone(&secret);
            readers.push(tokio::spawn(async move {
                for _ in 0..50 {
                    stack
                        .manager
                        .verify(secret.as_str(), VerifyOptions::default())
                        .await;
                }
            }));
        }

        stack.manager.revoke(&issued.record.id, None).await.unwrap();
        for _ in 0..20 {
            let result = stack
                .manager
                .verify(secret.as_str(), VerifyOptions::default())
                .await;
            assert_eq!(result.error_code, Some(ErrorCode::Revoked));
        }

        for reader in readers {
            reader.await.unwrap();
        }
        let result = stack
            .manager
            .verify(secret.as_str(), VerifyOptions::default())
            .await;
        assert_eq!(result.error_code, Some(ErrorCode::Revoked));
    }
}
