//! # In-Memory Key Store
//!
//! Records and all four indices sit behind one `RwLock`, so every call is a
//! single critical section and multi-index updates are never observed half
//! done. The audit trail has its own lock.

use crate::domain::{IndexDelta, IndexEntry, Precondition, StoreError, StoreResult};
use crate::ports::{AuditLogStore, KeyStore};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{
    normalize_tags, ApiKeyRecord, AuditLogEntry, AuditLogQuery, AuditLogStats, KeyId,
    MetadataPatch,
};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Default)]
struct State {
    records: HashMap<KeyId, ApiKeyRecord>,
    live_hash: HashMap<String, KeyId>,
    revoked_hash: HashMap<String, KeyId>,
    owners: HashMap<String, BTreeSet<KeyId>>,
    tags: HashMap<String, BTreeSet<KeyId>>,
}

impl State {
    fn apply(&mut self, id: &str, delta: &IndexDelta) {
        for entry in &delta.remove {
            match entry {
                IndexEntry::LiveHash(digest) => {
                    self.live_hash.remove(digest);
                }
                IndexEntry::RevokedHash(digest) => {
                    self.revoked_hash.remove(digest);
                }
                IndexEntry::Owner(owner) => remove_member(&mut self.owners, owner, id),
                IndexEntry::Tag(tag) => remove_member(&mut self.tags, tag, id),
            }
        }
        for entry in &delta.add {
            match entry {
                IndexEntry::LiveHash(digest) => {
                    self.live_hash.insert(digest.clone(), id.to_string());
                }
                IndexEntry::RevokedHash(digest) => {
                    self.revoked_hash.insert(digest.clone(), id.to_string());
                }
                IndexEntry::Owner(owner) => {
                    self.owners
                        .entry(owner.clone())
                        .or_default()
                        .insert(id.to_string());
                }
                IndexEntry::Tag(tag) => {
                    self.tags.entry(tag.clone()).or_default().insert(id.to_string());
                }
            }
        }
    }

    fn collect<'a, I>(&self, ids: I, owner_id: Option<&str>) -> Vec<ApiKeyRecord>
    where
        I: IntoIterator<Item = &'a KeyId>,
    {
        let mut out: Vec<ApiKeyRecord> = ids
            .into_iter()
            .filter_map(|id| self.records.get(id))
            .filter(|r| owner_id.map_or(true, |o| r.metadata.owner_id == o))
            .cloned()
            .collect();
        sort_records(&mut out);
        out
    }

    fn remove_record(&mut self, id: &str) -> Option<ApiKeyRecord> {
        let record = self.records.remove(id)?;
        self.apply(id, &IndexDelta::delete(&record));
        Some(record)
    }
}

fn remove_member(index: &mut HashMap<String, BTreeSet<KeyId>>, key: &str, id: &str) {
    if let Some(members) = index.get_mut(key) {
        members.remove(id);
        if members.is_empty() {
            index.remove(key);
        }
    }
}

pub(crate) fn sort_records(records: &mut [ApiKeyRecord]) {
    records.sort_by(|a, b| {
        a.metadata
            .created_at
            .cmp(&b.metadata.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Reference [`KeyStore`] with an audit trail.
#[derive(Debug, Default)]
pub struct InMemoryKeyStore {
    state: RwLock<State>,
    logs: RwLock<Vec<AuditLogEntry>>,
}

impl InMemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every way the indices disagree with the records. Empty when consistent.
    pub fn index_violations(&self) -> Vec<String> {
        let state = self.state.read();
        let mut violations = Vec::new();

        let mut expected = State::default();
        for (id, record) in &state.records {
            expected.apply(id, &IndexDelta::insert(record));
        }

        if expected.live_hash != state.live_hash {
            violations.push("live hash index out of sync".to_string());
        }
        if expected.revoked_hash != state.revoked_hash {
            violations.push("revoked hash index out of sync".to_string());
        }
        if expected.owners != state.owners {
            violations.push("owner index out of sync".to_string());
        }
        if expected.tags != state.tags {
            violations.push("tag index out of sync".to_string());
        }
        violations
    }
}

#[async_trait]
impl KeyStore for InMemoryKeyStore {
    async fn save(&self, mut record: ApiKeyRecord) -> StoreResult<()> {
        record.metadata.tags = normalize_tags(&record.metadata.tags);
        let mut state = self.state.write();

        if state.records.contains_key(&record.id) {
            return Err(StoreError::DuplicateId(record.id));
        }
        let existing = state
            .live_hash
            .get(&record.secret_digest)
            .or_else(|| state.revoked_hash.get(&record.secret_digest));
        if let Some(existing) = existing {
            return Err(StoreError::DuplicateHash {
                existing: existing.clone(),
            });
        }

        let id = record.id.clone();
        state.apply(&id, &IndexDelta::insert(&record));
        state.records.insert(id, record);
        Ok(())
    }

    async fn find_by_hash(&self, digest: &str) -> StoreResult<Option<ApiKeyRecord>> {
        let state = self.state.read();
        Ok(state
            .live_hash
            .get(digest)
            .and_then(|id| state.records.get(id))
            .cloned())
    }

    async fn find_revoked_by_hash(&self, digest: &str) -> StoreResult<Option<ApiKeyRecord>> {
        let state = self.state.read();
        Ok(state
            .revoked_hash
            .get(digest)
            .and_then(|id| state.records.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<ApiKeyRecord>> {
        Ok(self.state.read().records.get(id).cloned())
    }

    async fn find_by_owner(&self, owner_id: &str) -> StoreResult<Vec<ApiKeyRecord>> {
        let state = self.state.read();
        Ok(match state.owners.get(owner_id) {
            Some(ids) => state.collect(ids, None),
            None => Vec::new(),
        })
    }

    async fn find_by_tag(&self, tag: &str, owner_id: Option<&str>) -> StoreResult<Vec<ApiKeyRecord>> {
        let tag = tag.trim().to_lowercase();
        let state = self.state.read();
        Ok(match state.tags.get(&tag) {
            Some(ids) => state.collect(ids, owner_id),
            None => Vec::new(),
        })
    }

    async fn find_by_tags(
        &self,
        tags: &[String],
        owner_id: Option<&str>,
    ) -> StoreResult<Vec<ApiKeyRecord>> {
        let state = self.state.read();
        let ids: BTreeSet<&KeyId> = normalize_tags(tags)
            .iter()
            .filter_map(|tag| state.tags.get(tag))
            .flatten()
            .collect();
        Ok(state.collect(ids, owner_id))
    }

    async fn update_metadata_if(
        &self,
        id: &str,
        precondition: Precondition,
        patch: &MetadataPatch,
    ) -> StoreResult<ApiKeyRecord> {
        let mut state = self.state.write();
        let old = state
            .records
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        precondition
            .check(&old)
            .map_err(|failure| StoreError::PreconditionFailed {
                id: id.to_string(),
                failure,
            })?;

        let mut updated = old.clone();
        patch.apply(&mut updated.metadata);
        updated.metadata.tags = normalize_tags(&updated.metadata.tags);

        state.apply(id, &IndexDelta::between(&old, &updated));
        state.records.insert(id.to_string(), updated.clone());
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        Ok(self.state.write().remove_record(id).is_some())
    }

    async fn delete_by_owner(&self, owner_id: &str) -> StoreResult<Vec<ApiKeyRecord>> {
        let mut state = self.state.write();
        let ids: Vec<KeyId> = state
            .owners
            .get(owner_id)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default();
        let mut removed: Vec<ApiKeyRecord> =
            ids.iter().filter_map(|id| state.remove_record(id)).collect();
        sort_records(&mut removed);
        Ok(removed)
    }

    fn audit_log(&self) -> Option<&dyn AuditLogStore> {
        Some(self)
    }
}

#[async_trait]
impl AuditLogStore for InMemoryKeyStore {
    async fn save_log(&self, entry: AuditLogEntry) -> StoreResult<()> {
        self.logs.write().push(entry);
        Ok(())
    }

    async fn find_logs(&self, query: &AuditLogQuery) -> StoreResult<Vec<AuditLogEntry>> {
        let logs = self.logs.read();
        let mut matched: Vec<&AuditLogEntry> = logs.iter().filter(|e| query.matches(e)).collect();
        // Newest first; insertion order breaks timestamp ties
        matched.reverse();
        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        Ok(matched
            .into_iter()
            .skip(query.offset.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn count_logs(&self, query: &AuditLogQuery) -> StoreResult<usize> {
        Ok(self.logs.read().iter().filter(|e| query.matches(e)).count())
    }

    async fn delete_logs(&self, query: &AuditLogQuery) -> StoreResult<usize> {
        let mut logs = self.logs.write();
        let before = logs.len();
        logs.retain(|e| !query.matches(e));
        Ok(before - logs.len())
    }

    async fn get_log_stats(&self, owner_id: Option<&str>) -> StoreResult<AuditLogStats> {
        let logs = self.logs.read();
        let mut stats = AuditLogStats::default();
        for entry in logs
            .iter()
            .filter(|e| owner_id.map_or(true, |o| e.owner_id == o))
        {
            stats.total += 1;
            *stats.by_action.entry(entry.action).or_insert(0) += 1;
            stats.last_activity = stats.last_activity.max(Some(entry.timestamp));
        }
        Ok(stats)
    }
}
