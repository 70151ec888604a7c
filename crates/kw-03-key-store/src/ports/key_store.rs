//! # Key Store Port
//!
//! What the key manager needs from persistence. Implementations own
//! durability; the trait only fixes the index-consistency semantics.

use crate::domain::{Precondition, StoreResult};
use async_trait::async_trait;
use shared_types::{
    ApiKeyRecord, AuditLogEntry, AuditLogQuery, AuditLogStats, MetadataPatch,
};

/// Indexed credential storage.
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Insert a new record. Never overwrites.
    ///
    /// Fails with `DuplicateId` or `DuplicateHash`.
    async fn save(&self, record: ApiKeyRecord) -> StoreResult<()>;

    /// Look up a live (non-revoked) record by secret digest.
    async fn find_by_hash(&self, digest: &str) -> StoreResult<Option<ApiKeyRecord>>;

    /// Look up a revoked record by secret digest.
    async fn find_revoked_by_hash(&self, digest: &str) -> StoreResult<Option<ApiKeyRecord>>;

    /// Look up any record, revoked or not.
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<ApiKeyRecord>>;

    async fn find_by_owner(&self, owner_id: &str) -> StoreResult<Vec<ApiKeyRecord>>;

    /// Records carrying `tag`, optionally restricted to one owner.
    async fn find_by_tag(&self, tag: &str, owner_id: Option<&str>) -> StoreResult<Vec<ApiKeyRecord>>;

    /// Records carrying any of `tags`, optionally restricted to one owner.
    async fn find_by_tags(
        &self,
        tags: &[String],
        owner_id: Option<&str>,
    ) -> StoreResult<Vec<ApiKeyRecord>>;

    /// Read-check-merge-write of one record's metadata. Returns the new record.
    ///
    /// `precondition` is evaluated against the stored record in the same
    /// atomic step as the write; a miss fails with `PreconditionFailed` and
    /// changes nothing. Indices are adjusted by delta in that step too, so a
    /// transition to revoked removes the live hash entry before this returns.
    async fn update_metadata_if(
        &self,
        id: &str,
        precondition: Precondition,
        patch: &MetadataPatch,
    ) -> StoreResult<ApiKeyRecord>;

    /// Unconditional [`KeyStore::update_metadata_if`].
    async fn update_metadata(&self, id: &str, patch: &MetadataPatch) -> StoreResult<ApiKeyRecord> {
        self.update_metadata_if(id, Precondition::Exists, patch).await
    }

    /// Hard delete. Returns whether a record existed.
    async fn delete(&self, id: &str) -> StoreResult<bool>;

    /// Hard delete every record of `owner_id` in one atomic step.
    /// Returns the removed records.
    async fn delete_by_owner(&self, owner_id: &str) -> StoreResult<Vec<ApiKeyRecord>>;

    /// Audit trail capability, if this backend has one.
    fn audit_log(&self) -> Option<&dyn AuditLogStore> {
        None
    }
}

/// Optional audit trail persistence.
#[async_trait]
pub trait AuditLogStore: Send + Sync {
    async fn save_log(&self, entry: AuditLogEntry) -> StoreResult<()>;

    /// Matching entries, newest first, after `offset` and up to `limit`.
    async fn find_logs(&self, query: &AuditLogQuery) -> StoreResult<Vec<AuditLogEntry>>;

    /// Number of matching entries (`limit`/`offset` ignored).
    async fn count_logs(&self, query: &AuditLogQuery) -> StoreResult<usize>;

    /// Delete matching entries (`limit`/`offset` ignored). Returns how many.
    async fn delete_logs(&self, query: &AuditLogQuery) -> StoreResult<usize>;

    async fn get_log_stats(&self, owner_id: Option<&str>) -> StoreResult<AuditLogStats>;
}
