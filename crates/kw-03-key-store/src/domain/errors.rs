//! Store error types.

use crate::domain::precondition::PreconditionFailure;
use shared_types::KeyId;
use thiserror::Error;

/// Errors raised by [`crate::KeyStore`] and [`crate::AuditLogStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("record {0} already exists")]
    DuplicateId(KeyId),

    /// The digest is already indexed, live or revoked.
    #[error("secret digest already indexed for record {existing}")]
    DuplicateHash { existing: KeyId },

    #[error("record {0} not found")]
    NotFound(KeyId),

    /// A conditional update found the record in the wrong state.
    #[error("record {id} is {failure}")]
    PreconditionFailed {
        id: KeyId,
        failure: PreconditionFailure,
    },

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("stored data could not be decoded: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
