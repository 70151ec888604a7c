//! Rate limiting wired into verification over the shared cache.

#[cfg(test)]
mod tests {
    use crate::fixtures::{Backend, StackBuilder};
    use kw_02_rate_limiter::{CheckOptions, RateLimitConfig};
    use kw_04_key_manager::{CreateKeyRequest, ErrorCode, VerifyOptions};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_budget_then_deny_then_window_rollover() {
        let stack = StackBuilder::new(Backend::Memory)
            .rate_limit(RateLimitConfig::new(60_000, 3))
            .build();
        let issued = stack
            .manager
            .create(CreateKeyRequest::new("user-1"), None)
            .await
            .unwrap();

        for remaining in [2, 1, 0] {
            let result = stack.manager.verify(&issued.secret, VerifyOptions::default()).await;
            assert!(result.valid);
            assert_eq!(result.rate_limit.unwrap().remaining, remaining);
        }

        let denied = stack.manager.verify(&issued.secret, VerifyOptions::default()).await;
        assert!(!denied.valid);
        assert_eq!(denied.error_code, Some(ErrorCode::RateLimitExceeded));
        let info = denied.rate_limit.unwrap();
        assert_eq!(info.current, 4);
        assert_eq!(info.remaining, 0);

        stack.clock.advance(info.reset_ms);
        assert!(stack.manager.verify(&issued.secret, VerifyOptions::default()).await.valid);
    }

    #[tokio::test]
    async fn test_identifier_override_isolates_budgets() {
        let stack = StackBuilder::new(Backend::KeyValue)
            .rate_limit(RateLimitConfig::new(60_000, 1))
            .build();
        let issued = stack
            .manager
            .create(CreateKeyRequest::new("user-1"), None)
            .await
            .unwrap();

        let for_client = |client: &str| VerifyOptions {
            rate_limit_identifier: Some(client.to_string()),
            ..VerifyOptions::default()
        };
        assert!(stack.manager.verify(&issued.secret, for_client("10.0.0.1")).await.valid);
        assert!(stack.manager.verify(&issued.secret, for_client("10.0.0.2")).await.valid);
        let denied = stack.manager.verify(&issued.secret, for_client("10.0.0.1")).await;
        assert_eq!(denied.error_code, Some(ErrorCode::RateLimitExceeded));
    }

    #[tokio::test]
    async fn test_invalid_keys_do_not_consume_budget() {
        let stack = StackBuilder::new(Backend::Memory)
            .rate_limit(RateLimitConfig::new(60_000, 2))
            .build();
        let issued = stack
            .manager
            .create(CreateKeyRequest::new("user-1"), None)
            .await
            .unwrap();

        for _ in 0..5 {
            let result = stack.manager.verify("sk_not_a_key", VerifyOptions::default()).await;
            assert_eq!(result.error_code, Some(ErrorCode::InvalidKey));
        }
        let limiter = stack.limiter.as_ref().unwrap();
        assert_eq!(limiter.get_current_count(&issued.record.id).await.unwrap(), 0);

        stack.manager.verify(&issued.secret, VerifyOptions::default()).await;
        assert_eq!(limiter.get_current_count(&issued.record.id).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_verifies_allow_exactly_the_budget() {
        const LIMIT: u64 = 10;
        let stack = Arc::new(
            StackBuilder::new(Backend::Memory)
                .rate_limit(RateLimitConfig::new(60_000, LIMIT))
                .build(),
        );
        let issued = stack
            .manager
            .create(CreateKeyRequest::new("user-1"), None)
            .await
            .unwrap();
        let secret = Arc::new(issued.secret);

        let mut handles = Vec::new();
        for _ in 0..LIMIT + 5 {
            let stack = Arc::clone(&stack);
            let secret = Arc::clone(&secret);
            handles.push(tokio::spawn(async move {
                stack
                    .manager
                    .verify(secret.as_str(), VerifyOptions::default())
                    .await
                    .valid
            }));
        }

        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap() {
                allowed += 1;
            }
        }
        assert_eq!(allowed, LIMIT);

        let dry = stack
            .limiter
            .as_ref()
            .unwrap()
            .check(&issued.record.id, CheckOptions::dry_run())
            .await
            .unwrap();
        assert!(!dry.allowed);
        assert_eq!(dry.current, LIMIT + 5);
    }
}
