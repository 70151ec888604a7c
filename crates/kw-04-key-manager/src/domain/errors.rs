//! Error codes and typed errors for key operations.

use kw_03_key_store::StoreError;
use serde::{Deserialize, Serialize};
use shared_crypto::CryptoError;
use shared_types::KeyId;
use std::fmt;
use thiserror::Error;

/// Machine-readable failure code, stable on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    MissingKey,
    InvalidFormat,
    InvalidKey,
    Expired,
    Revoked,
    Disabled,
    RateLimitExceeded,
    KeyNotFound,
    AlreadyRevoked,
    AlreadyEnabled,
    AlreadyDisabled,
    CannotModifyRevoked,
    StorageNotSupported,
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingKey => "MISSING_KEY",
            Self::InvalidFormat => "INVALID_FORMAT",
            Self::InvalidKey => "INVALID_KEY",
            Self::Expired => "EXPIRED",
            Self::Revoked => "REVOKED",
            Self::Disabled => "DISABLED",
            Self::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            Self::KeyNotFound => "KEY_NOT_FOUND",
            Self::AlreadyRevoked => "ALREADY_REVOKED",
            Self::AlreadyEnabled => "ALREADY_ENABLED",
            Self::AlreadyDisabled => "ALREADY_DISABLED",
            Self::CannotModifyRevoked => "CANNOT_MODIFY_REVOKED",
            Self::StorageNotSupported => "STORAGE_NOT_SUPPORTED",
        }
    }

    /// Default human-readable message for verification failures.
    pub const fn message(self) -> &'static str {
        match self {
            Self::MissingKey => "API key is missing",
            Self::InvalidFormat => "API key format is invalid",
            Self::InvalidKey => "API key is invalid",
            Self::Expired => "API key has expired",
            Self::Revoked => "API key has been revoked",
            Self::Disabled => "API key is disabled",
            Self::RateLimitExceeded => "Rate limit exceeded",
            Self::KeyNotFound => "API key not found",
            Self::AlreadyRevoked => "API key is already revoked",
            Self::AlreadyEnabled => "API key is already enabled",
            Self::AlreadyDisabled => "API key is already disabled",
            Self::CannotModifyRevoked => "Revoked API keys cannot be modified",
            Self::StorageNotSupported => "Storage backend does not support this operation",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by guarded key operations.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("API key {0} not found")]
    KeyNotFound(KeyId),

    #[error("API key {0} is already revoked")]
    AlreadyRevoked(KeyId),

    #[error("API key {0} is already enabled")]
    AlreadyEnabled(KeyId),

    #[error("API key {0} is already disabled")]
    AlreadyDisabled(KeyId),

    #[error("API key {0} is revoked and cannot be modified")]
    CannotModifyRevoked(KeyId),

    #[error("storage backend does not support {0}")]
    StorageNotSupported(&'static str),

    #[error("invalid key manager configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl KeyError {
    /// Wire code, if this error belongs to the public taxonomy.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::KeyNotFound(_) | Self::Store(StoreError::NotFound(_)) => {
                Some(ErrorCode::KeyNotFound)
            }
            Self::AlreadyRevoked(_) => Some(ErrorCode::AlreadyRevoked),
            Self::AlreadyEnabled(_) => Some(ErrorCode::AlreadyEnabled),
            Self::AlreadyDisabled(_) => Some(ErrorCode::AlreadyDisabled),
            Self::CannotModifyRevoked(_) => Some(ErrorCode::CannotModifyRevoked),
            Self::StorageNotSupported(_) => Some(ErrorCode::StorageNotSupported),
            Self::InvalidConfig(_) | Self::InvalidRequest(_) | Self::Store(_) | Self::Crypto(_) => None,
        }
    }
}

pub type KeyResult<T> = Result<T, KeyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_wire_format() {
        let json = serde_json::to_string(&ErrorCode::RateLimitExceeded).unwrap();
        assert_eq!(json, r#""RATE_LIMIT_EXCEEDED""#);
        assert_eq!(ErrorCode::CannotModifyRevoked.to_string(), "CANNOT_MODIFY_REVOKED");

        let parsed: ErrorCode = serde_json::from_str(r#""STORAGE_NOT_SUPPORTED""#).unwrap();
        assert_eq!(parsed, ErrorCode::StorageNotSupported);
    }

    #[test]
    fn test_key_error_codes() {
        assert_eq!(
            KeyError::AlreadyRevoked("k1".into()).code(),
            Some(ErrorCode::AlreadyRevoked)
        );
        assert_eq!(
            KeyError::Store(StoreError::NotFound("k1".into())).code(),
            Some(ErrorCode::KeyNotFound)
        );
        assert_eq!(KeyError::Store(StoreError::Backend("x".into())).code(), None);
    }
}
