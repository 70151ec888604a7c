//! Lifecycle events delivered to listeners.

use shared_types::{ApiKeyRecord, AuditAction, AuditContext, KeyId, Timestamp};

/// A completed lifecycle transition.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyEvent {
    pub action: AuditAction,
    pub key_id: KeyId,
    pub owner_id: String,
    pub timestamp: Timestamp,
    pub context: AuditContext,
    /// Record state after the transition (before it, for deletes).
    pub record: ApiKeyRecord,
    /// Action-specific extras, e.g. the replacement id on rotation.
    pub details: serde_json::Value,
}
