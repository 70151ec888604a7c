//! Verification inputs, outputs and the cache projection.

use crate::domain::errors::ErrorCode;
use kw_02_rate_limiter::RateLimitResult;
use serde::{Deserialize, Serialize};
use shared_types::{ApiKeyRecord, KeyId, Timestamp};

/// Where the secret comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyCarrier {
    /// The raw secret.
    Secret(String),
    /// Request headers as `(name, value)` pairs; names match case-insensitively.
    Headers(Vec<(String, String)>),
}

impl KeyCarrier {
    pub fn headers<I, K, V>(headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        KeyCarrier::Headers(
            headers
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<&str> for KeyCarrier {
    fn from(secret: &str) -> Self {
        KeyCarrier::Secret(secret.to_string())
    }
}

impl From<String> for KeyCarrier {
    fn from(secret: String) -> Self {
        KeyCarrier::Secret(secret)
    }
}

impl From<&String> for KeyCarrier {
    fn from(secret: &String) -> Self {
        KeyCarrier::Secret(secret.clone())
    }
}

/// Per-call verification switches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyOptions {
    /// Bypass the projection cache for both read and write.
    pub skip_cache: bool,
    /// Do not record `last_used_at`.
    pub skip_tracking: bool,
    /// Rate-limit subject override (defaults to the key id).
    pub rate_limit_identifier: Option<String>,
}

/// Limiter state attached to a verification result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitInfo {
    pub current: u64,
    pub limit: u64,
    pub remaining: u64,
    pub reset_ms: u64,
    pub reset_at: Timestamp,
}

impl From<&RateLimitResult> for RateLimitInfo {
    fn from(result: &RateLimitResult) -> Self {
        Self {
            current: result.current,
            limit: result.limit,
            remaining: result.remaining,
            reset_ms: result.reset_ms,
            reset_at: result.reset_at,
        }
    }
}

/// Outcome of [`crate::KeyManager::verify`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResult {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<ApiKeyRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimitInfo>,
}

impl VerifyResult {
    pub fn success(record: ApiKeyRecord) -> Self {
        Self {
            valid: true,
            record: Some(record),
            error: None,
            error_code: None,
            rate_limit: None,
        }
    }

    /// Failure with the code's default message.
    pub fn failure(code: ErrorCode) -> Self {
        Self::failure_with(code, code.message())
    }

    pub fn failure_with(code: ErrorCode, error: impl Into<String>) -> Self {
        Self {
            valid: false,
            record: None,
            error: Some(error.into()),
            error_code: Some(code),
            rate_limit: None,
        }
    }

    pub fn with_rate_limit(mut self, info: RateLimitInfo) -> Self {
        self.rate_limit = Some(info);
        self
    }
}

/// Verification projection stored under `apikey:<digest>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedKeyState {
    pub id: KeyId,
    pub expires_at: Option<Timestamp>,
    pub revoked_at: Option<Timestamp>,
    pub enabled: bool,
}

impl From<&ApiKeyRecord> for CachedKeyState {
    fn from(record: &ApiKeyRecord) -> Self {
        Self {
            id: record.id.clone(),
            expires_at: record.metadata.expires_at,
            revoked_at: record.metadata.revoked_at,
            enabled: record.metadata.enabled,
        }
    }
}

impl CachedKeyState {
    /// Cache key for a secret digest.
    pub fn cache_key(digest: &str) -> String {
        format!("apikey:{digest}")
    }
}
