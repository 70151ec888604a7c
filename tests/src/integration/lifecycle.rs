//! Full key lifecycle over both store backends.

#[cfg(test)]
mod tests {
    use crate::fixtures::{Backend, StackBuilder, T0};
    use kw_04_key_manager::{
        CreateKeyRequest, ErrorCode, KeyCarrier, KeyError, KeyState, RotateRequest, VerifyOptions,
    };
    use shared_types::{AuditAction, AuditContext, AuditLogQuery, MetadataPatch};

    #[tokio::test]
    async fn test_create_verify_rotate_revoke() {
        for backend in Backend::ALL {
            let stack = StackBuilder::new(backend).build();
            let km = &stack.manager;

            let issued = km
                .create(
                    CreateKeyRequest::new("user-1")
                        .name("ci")
                        .scopes(["read", "write"])
                        .tags(["Prod", "ci"]),
                    Some(AuditContext::actor("admin")),
                )
                .await
                .unwrap();

            let verified = km.verify(&issued.secret, VerifyOptions::default()).await;
            assert!(verified.valid, "{backend:?}: {:?}", verified.error_code);
            assert_eq!(verified.record.unwrap().id, issued.record.id);

            let rotated = km
                .rotate(
                    &issued.record.id,
                    RotateRequest {
                        name: Some("ci-2".into()),
                        ..RotateRequest::default()
                    },
                    None,
                )
                .await
                .unwrap();
            assert_eq!(rotated.record.metadata.scopes, vec!["read", "write"]);
            assert_eq!(rotated.record.metadata.name.as_deref(), Some("ci-2"));
            assert!(rotated.record.metadata.tags.contains("prod"));
            assert_eq!(
                rotated.previous.metadata.rotated_to.as_deref(),
                Some(rotated.record.id.as_str())
            );

            let old = km.verify(&issued.secret, VerifyOptions::default()).await;
            assert_eq!(old.error_code, Some(ErrorCode::Revoked), "{backend:?}");
            assert!(km.verify(&rotated.secret, VerifyOptions::default()).await.valid);

            km.revoke(&rotated.record.id, None).await.unwrap();
            let revoked = km.verify(&rotated.secret, VerifyOptions::default()).await;
            assert_eq!(revoked.error_code, Some(ErrorCode::Revoked), "{backend:?}");

            assert!(matches!(
                km.revoke(&rotated.record.id, None).await,
                Err(KeyError::AlreadyRevoked(_))
            ));
            assert!(matches!(
                km.enable(&rotated.record.id, None).await,
                Err(KeyError::CannotModifyRevoked(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_revoked_key_reports_revoked_on_cold_cache() {
        for backend in Backend::ALL {
            let stack = StackBuilder::new(backend).build();
            let issued = stack
                .manager
                .create(CreateKeyRequest::new("user-1"), None)
                .await
                .unwrap();
            stack.manager.revoke(&issued.record.id, None).await.unwrap();

            let options = VerifyOptions {
                skip_cache: true,
                ..VerifyOptions::default()
            };
            let result = stack.manager.verify(&issued.secret, options).await;
            assert_eq!(result.error_code, Some(ErrorCode::Revoked), "{backend:?}");
        }
    }

    #[tokio::test]
    async fn test_expiry_follows_the_clock() {
        let stack = StackBuilder::new(Backend::KeyValue).build();
        let issued = stack
            .manager
            .create(CreateKeyRequest::new("user-1").expires_at(T0 + 1_000), None)
            .await
            .unwrap();

        assert!(stack.manager.verify(&issued.secret, VerifyOptions::default()).await.valid);
        assert_eq!(stack.manager.key_state(&issued.record), KeyState::Active);

        stack.clock.advance(1_000);
        let result = stack.manager.verify(&issued.secret, VerifyOptions::default()).await;
        assert_eq!(result.error_code, Some(ErrorCode::Expired));
        assert_eq!(stack.manager.key_state(&issued.record), KeyState::Expired);
    }

    #[tokio::test]
    async fn test_verify_from_headers() {
        let stack = StackBuilder::new(Backend::Memory).build();
        let issued = stack
            .manager
            .create(CreateKeyRequest::new("user-1"), None)
            .await
            .unwrap();

        let bearer = KeyCarrier::headers([("Authorization", format!("Bearer {}", issued.secret))]);
        assert!(stack.manager.verify(bearer, VerifyOptions::default()).await.valid);

        let custom = KeyCarrier::headers([("X-API-Key", issued.secret.clone())]);
        assert!(stack.manager.verify(custom, VerifyOptions::default()).await.valid);

        let missing = KeyCarrier::headers([("Accept", "application/json")]);
        let result = stack.manager.verify(missing, VerifyOptions::default()).await;
        assert_eq!(result.error_code, Some(ErrorCode::MissingKey));
    }

    #[tokio::test]
    async fn test_tag_queries_track_updates() {
        for backend in Backend::ALL {
            let stack = StackBuilder::new(backend).build();
            let km = &stack.manager;
            let a = km
                .create(CreateKeyRequest::new("user-1").tags(["alpha"]), None)
                .await
                .unwrap();
            km.create(CreateKeyRequest::new("user-2").tags(["alpha", "beta"]), None)
                .await
                .unwrap();

            assert_eq!(km.find_by_tag("ALPHA", None).await.unwrap().len(), 2);
            assert_eq!(km.find_by_tag("alpha", Some("user-1")).await.unwrap().len(), 1);

            km.update_metadata(&a.record.id, MetadataPatch::new().tags(["gamma"]), None)
                .await
                .unwrap();
            assert_eq!(km.find_by_tag("alpha", None).await.unwrap().len(), 1, "{backend:?}");
            let any = km
                .find_by_tags(&["beta".to_string(), "gamma".to_string()], None)
                .await
                .unwrap();
            assert_eq!(any.len(), 2, "{backend:?}");
        }
    }

    #[tokio::test]
    async fn test_delete_by_owner_removes_every_key() {
        for backend in Backend::ALL {
            let stack = StackBuilder::new(backend).build();
            let km = &stack.manager;
            let mut secrets = Vec::new();
            for _ in 0..3 {
                let issued = km.create(CreateKeyRequest::new("user-1"), None).await.unwrap();
                secrets.push(issued.secret);
            }
            km.create(CreateKeyRequest::new("user-2"), None).await.unwrap();

            assert_eq!(km.delete_by_owner("user-1", None).await.unwrap(), 3);
            assert!(km.list("user-1").await.unwrap().is_empty());
            assert_eq!(km.list("user-2").await.unwrap().len(), 1);
            for secret in &secrets {
                let result = km.verify(secret, VerifyOptions::default()).await;
                assert_eq!(result.error_code, Some(ErrorCode::InvalidKey), "{backend:?}");
            }
        }
    }

    #[tokio::test]
    async fn test_audit_trail_depends_on_store_capability() {
        let memory = StackBuilder::new(Backend::Memory).build();
        let issued = memory
            .manager
            .create(CreateKeyRequest::new("user-1"), Some(AuditContext::actor("admin")))
            .await
            .unwrap();
        memory.manager.disable(&issued.record.id, None).await.unwrap();
        memory.manager.enable(&issued.record.id, None).await.unwrap();

        let logs = memory.manager.get_key_logs(&issued.record.id).await.unwrap();
        let actions: Vec<_> = logs.iter().map(|l| l.action).collect();
        assert_eq!(
            actions,
            vec![AuditAction::Enabled, AuditAction::Disabled, AuditAction::Created]
        );
        let stats = memory.manager.get_log_stats(Some("user-1")).await.unwrap();
        assert_eq!(stats.total, 3);

        let kv = StackBuilder::new(Backend::KeyValue).build();
        kv.manager
            .create(CreateKeyRequest::new("user-1"), None)
            .await
            .unwrap();
        assert!(matches!(
            kv.manager.get_logs(&AuditLogQuery::for_owner("user-1")).await,
            Err(KeyError::StorageNotSupported(_))
        ));
    }

    #[tokio::test]
    async fn test_interleaved_rotate_and_revoke() {
        for backend in Backend::ALL {
            let stack = StackBuilder::new(backend).interleaved().build();
            let km = &stack.manager;
            let issued = km.create(CreateKeyRequest::new("user-1"), None).await.unwrap();
            let id = &issued.record.id;

            let (rotated, revoked) = tokio::join!(
                km.rotate(id, RotateRequest::default(), None),
                km.revoke(id, None),
            );

            let keys = km.list("user-1").await.unwrap();
            let live: Vec<_> = keys.iter().filter(|r| !r.is_revoked()).collect();
            match (rotated, revoked) {
                (Ok(rotated), Err(err)) => {
                    assert_eq!(err.code(), Some(ErrorCode::AlreadyRevoked), "{backend:?}");
                    assert_eq!(live.len(), 1, "{backend:?}");
                    assert_eq!(live[0].id, rotated.record.id);
                }
                (Err(err), Ok(_)) => {
                    assert_eq!(err.code(), Some(ErrorCode::CannotModifyRevoked), "{backend:?}");
                    assert!(live.is_empty(), "{backend:?}: replacement left behind");
                    assert_eq!(keys.len(), 1, "{backend:?}");
                }
                other => panic!("{backend:?}: expected one winner, got {other:?}"),
            }

            let old = km.verify(&issued.secret, VerifyOptions::default()).await;
            assert_eq!(old.error_code, Some(ErrorCode::Revoked), "{backend:?}");
        }
    }

    #[tokio::test]
    async fn test_interleaved_rotations() {
        for backend in Backend::ALL {
            let stack = StackBuilder::new(backend).interleaved().build();
            let km = &stack.manager;
            let issued = km.create(CreateKeyRequest::new("user-1"), None).await.unwrap();
            let id = &issued.record.id;

            let (a, b) = tokio::join!(
                km.rotate(id, RotateRequest::default(), None),
                km.rotate(id, RotateRequest::default(), None),
            );
            let winner = match (a, b) {
                (Ok(ok), Err(err)) | (Err(err), Ok(ok)) => {
                    assert_eq!(err.code(), Some(ErrorCode::CannotModifyRevoked), "{backend:?}");
                    ok
                }
                other => panic!("{backend:?}: expected one winner, got {other:?}"),
            };

            let keys = km.list("user-1").await.unwrap();
            assert_eq!(keys.len(), 2, "{backend:?}");
            let old = keys.iter().find(|r| r.id == *id).unwrap();
            assert_eq!(old.metadata.rotated_to.as_deref(), Some(winner.record.id.as_str()));
            assert!(km.verify(&winner.secret, VerifyOptions::default()).await.valid);
        }
    }

    #[tokio::test]
    async fn test_delete_by_owner_reports_what_it_removed() {
        for backend in Backend::ALL {
            let stack = StackBuilder::new(backend).interleaved().build();
            let km = &stack.manager;
            let first = km.create(CreateKeyRequest::new("user-1"), None).await.unwrap();
            assert!(km.verify(&first.secret, VerifyOptions::default()).await.valid);

            let (created, removed) = tokio::join!(
                km.create(CreateKeyRequest::new("user-1"), None),
                km.delete_by_owner("user-1", None),
            );
            let created = created.unwrap();
            let removed = removed.unwrap();

            let remaining = km.list("user-1").await.unwrap();
            assert_eq!(removed + remaining.len(), 2, "{backend:?}");
            let first_result = km.verify(&first.secret, VerifyOptions::default()).await;
            assert_eq!(first_result.error_code, Some(ErrorCode::InvalidKey), "{backend:?}");

            let second = km.verify(&created.secret, VerifyOptions::default()).await;
            assert_eq!(second.valid, remaining.len() == 1, "{backend:?}");

            if let Backend::Memory = backend {
                let deletions = km
                    .count_logs(&AuditLogQuery {
                        action: Some(AuditAction::Deleted),
                        ..AuditLogQuery::for_owner("user-1")
                    })
                    .await
                    .unwrap();
                assert_eq!(deletions, removed);
            }
        }
    }
}
