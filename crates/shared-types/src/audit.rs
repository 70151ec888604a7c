//! # Audit Trail Types
//!
//! Entries written by the key manager after each successful lifecycle
//! transition, and the query/statistics shapes used to read them back.

use crate::entities::{KeyId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Lifecycle action recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Created,
    Revoked,
    Rotated,
    Enabled,
    Disabled,
    Updated,
    Deleted,
}

impl AuditAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Revoked => "revoked",
            Self::Rotated => "rotated",
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who performed an operation and from where.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuditContext {
    pub actor: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub request_id: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

impl AuditContext {
    pub fn actor(actor: impl Into<String>) -> Self {
        Self {
            actor: Some(actor.into()),
            ..Self::default()
        }
    }
}

/// One persisted audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: String,
    pub key_id: KeyId,
    pub owner_id: String,
    pub action: AuditAction,
    pub timestamp: Timestamp,
    pub context: AuditContext,
    #[serde(default)]
    pub details: serde_json::Value,
}

/// Filter for reading audit entries. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuditLogQuery {
    pub key_id: Option<KeyId>,
    pub owner_id: Option<String>,
    pub action: Option<AuditAction>,
    /// Inclusive lower bound.
    pub start_time: Option<Timestamp>,
    /// Inclusive upper bound.
    pub end_time: Option<Timestamp>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl AuditLogQuery {
    pub fn for_key(key_id: impl Into<KeyId>) -> Self {
        Self {
            key_id: Some(key_id.into()),
            ..Self::default()
        }
    }

    pub fn for_owner(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: Some(owner_id.into()),
            ..Self::default()
        }
    }

    /// Filter match, ignoring `limit`/`offset`.
    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        self.key_id.as_ref().map_or(true, |k| *k == entry.key_id)
            && self.owner_id.as_ref().map_or(true, |o| *o == entry.owner_id)
            && self.action.map_or(true, |a| a == entry.action)
            && self.start_time.map_or(true, |t| entry.timestamp >= t)
            && self.end_time.map_or(true, |t| entry.timestamp <= t)
    }
}

/// Aggregate view over audit entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogStats {
    pub total: usize,
    pub by_action: BTreeMap<AuditAction, usize>,
    pub last_activity: Option<Timestamp>,
}
