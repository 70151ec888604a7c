//! # Key-Value Key Store
//!
//! Lays records and indices out as plain keys over a [`KeyValueStore`].
//! Each call holds the store mutex for its whole read-modify-write and ends
//! in exactly one `atomic_batch_write`, so a failed batch leaves both the
//! record and its indices untouched.

use super::memory::sort_records;
use crate::domain::{IndexDelta, IndexEntry, Precondition, StoreError, StoreResult};
use crate::ports::{BatchOperation, KVStoreError, KeyStore, KeyValueStore};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{normalize_tags, ApiKeyRecord, KeyId, MetadataPatch};
use std::collections::{BTreeMap, BTreeSet};

/// Key layout.
pub mod keys {
    pub const NAMESPACE: &str = "apikey";

    pub fn record(id: &str) -> String {
        format!("{NAMESPACE}:{id}")
    }

    pub fn live_hash(digest: &str) -> String {
        format!("{NAMESPACE}:hash:{digest}")
    }

    pub fn revoked_hash(digest: &str) -> String {
        format!("{NAMESPACE}:revoked:{digest}")
    }

    pub fn owner(owner_id: &str) -> String {
        format!("{NAMESPACE}:owner:{owner_id}")
    }

    pub fn tag(tag: &str) -> String {
        format!("{NAMESPACE}:tag:{tag}")
    }
}

fn backend(err: KVStoreError) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn read_string<KV: KeyValueStore>(kv: &KV, key: &str) -> StoreResult<Option<String>> {
    match kv.get(key.as_bytes()).map_err(backend)? {
        Some(bytes) => String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| StoreError::Serialization(e.to_string())),
        None => Ok(None),
    }
}

fn read_record<KV: KeyValueStore>(kv: &KV, id: &str) -> StoreResult<Option<ApiKeyRecord>> {
    match kv.get(keys::record(id).as_bytes()).map_err(backend)? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

fn read_id_set<KV: KeyValueStore>(kv: &KV, key: &str) -> StoreResult<BTreeSet<KeyId>> {
    match kv.get(key.as_bytes()).map_err(backend)? {
        Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
        None => Ok(BTreeSet::new()),
    }
}

fn read_records<'a, KV, I>(kv: &KV, ids: I) -> StoreResult<Vec<ApiKeyRecord>>
where
    KV: KeyValueStore,
    I: IntoIterator<Item = &'a KeyId>,
{
    let mut out = Vec::new();
    for id in ids {
        if let Some(record) = read_record(kv, id)? {
            out.push(record);
        }
    }
    Ok(out)
}

/// Pending writes for one call. Id sets are loaded once and written back
/// once, however many deltas touch them.
struct Batch<'a, KV> {
    kv: &'a KV,
    ops: Vec<BatchOperation>,
    sets: BTreeMap<String, BTreeSet<KeyId>>,
}

impl<'a, KV: KeyValueStore> Batch<'a, KV> {
    fn new(kv: &'a KV) -> Self {
        Self {
            kv,
            ops: Vec::new(),
            sets: BTreeMap::new(),
        }
    }

    fn set_mut(&mut self, key: String) -> StoreResult<&mut BTreeSet<KeyId>> {
        if !self.sets.contains_key(&key) {
            let loaded = read_id_set(self.kv, &key)?;
            self.sets.insert(key.clone(), loaded);
        }
        self.sets
            .get_mut(&key)
            .ok_or_else(|| StoreError::Backend("staged index set vanished".into()))
    }

    fn put_record(&mut self, record: &ApiKeyRecord) -> StoreResult<()> {
        let json = serde_json::to_vec(record)?;
        self.ops.push(BatchOperation::put(keys::record(&record.id), json));
        Ok(())
    }

    fn delete_record(&mut self, id: &str) {
        self.ops.push(BatchOperation::delete(keys::record(id)));
    }

    fn apply(&mut self, id: &str, delta: &IndexDelta) -> StoreResult<()> {
        for entry in &delta.remove {
            match entry {
                IndexEntry::LiveHash(digest) => {
                    self.ops.push(BatchOperation::delete(keys::live_hash(digest)));
                }
                IndexEntry::RevokedHash(digest) => {
                    self.ops.push(BatchOperation::delete(keys::revoked_hash(digest)));
                }
                IndexEntry::Owner(owner) => {
                    self.set_mut(keys::owner(owner))?.remove(id);
                }
                IndexEntry::Tag(tag) => {
                    self.set_mut(keys::tag(tag))?.remove(id);
                }
            }
        }
        for entry in &delta.add {
            match entry {
                IndexEntry::LiveHash(digest) => {
                    self.ops
                        .push(BatchOperation::put(keys::live_hash(digest), id.as_bytes()));
                }
                IndexEntry::RevokedHash(digest) => {
                    self.ops
                        .push(BatchOperation::put(keys::revoked_hash(digest), id.as_bytes()));
                }
                IndexEntry::Owner(owner) => {
                    self.set_mut(keys::owner(owner))?.insert(id.to_string());
                }
                IndexEntry::Tag(tag) => {
                    self.set_mut(keys::tag(tag))?.insert(id.to_string());
                }
            }
        }
        Ok(())
    }

    fn finish(mut self) -> StoreResult<Vec<BatchOperation>> {
        for (key, ids) in std::mem::take(&mut self.sets) {
            if ids.is_empty() {
                self.ops.push(BatchOperation::delete(key));
            } else {
                self.ops.push(BatchOperation::put(key, serde_json::to_vec(&ids)?));
            }
        }
        Ok(self.ops)
    }
}

/// [`KeyStore`] over a byte-level key-value engine.
pub struct KvKeyStore<KV: KeyValueStore> {
    kv: Mutex<KV>,
}

impl<KV: KeyValueStore> KvKeyStore<KV> {
    pub fn new(kv: KV) -> Self {
        Self { kv: Mutex::new(kv) }
    }

    /// Run `f` against the underlying engine under the store lock.
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut KV) -> R) -> R {
        f(&mut self.kv.lock())
    }

    fn find_via(&self, index_key: String) -> StoreResult<Option<ApiKeyRecord>> {
        let kv = self.kv.lock();
        match read_string(&*kv, &index_key)? {
            Some(id) => read_record(&*kv, &id),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl<KV: KeyValueStore> KeyStore for KvKeyStore<KV> {
    async fn save(&self, mut record: ApiKeyRecord) -> StoreResult<()> {
        record.metadata.tags = normalize_tags(&record.metadata.tags);
        let mut kv = self.kv.lock();

        if kv.exists(keys::record(&record.id).as_bytes()).map_err(backend)? {
            return Err(StoreError::DuplicateId(record.id));
        }
        let digest = &record.secret_digest;
        let existing = match read_string(&*kv, &keys::live_hash(digest))? {
            Some(id) => Some(id),
            None => read_string(&*kv, &keys::revoked_hash(digest))?,
        };
        if let Some(existing) = existing {
            return Err(StoreError::DuplicateHash { existing });
        }

        let mut batch = Batch::new(&*kv);
        batch.put_record(&record)?;
        batch.apply(&record.id, &IndexDelta::insert(&record))?;
        let ops = batch.finish()?;
        kv.atomic_batch_write(ops).map_err(backend)
    }

    async fn find_by_hash(&self, digest: &str) -> StoreResult<Option<ApiKeyRecord>> {
        self.find_via(keys::live_hash(digest))
    }

    async fn find_revoked_by_hash(&self, digest: &str) -> StoreResult<Option<ApiKeyRecord>> {
        self.find_via(keys::revoked_hash(digest))
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<ApiKeyRecord>> {
        read_record(&*self.kv.lock(), id)
    }

    async fn find_by_owner(&self, owner_id: &str) -> StoreResult<Vec<ApiKeyRecord>> {
        let kv = self.kv.lock();
        let ids = read_id_set(&*kv, &keys::owner(owner_id))?;
        let mut records = read_records(&*kv, &ids)?;
        sort_records(&mut records);
        Ok(records)
    }

    async fn find_by_tag(&self, tag: &str, owner_id: Option<&str>) -> StoreResult<Vec<ApiKeyRecord>> {
        self.find_by_tags(&[tag.to_string()], owner_id).await
    }

    async fn find_by_tags(
        &self,
        tags: &[String],
        owner_id: Option<&str>,
    ) -> StoreResult<Vec<ApiKeyRecord>> {
        let kv = self.kv.lock();
        let mut ids = BTreeSet::new();
        for tag in normalize_tags(tags) {
            ids.extend(read_id_set(&*kv, &keys::tag(&tag))?);
        }

        let mut records = read_records(&*kv, &ids)?;
        records.retain(|r| owner_id.map_or(true, |o| r.metadata.owner_id == o));
        sort_records(&mut records);
        Ok(records)
    }

    async fn update_metadata_if(
        &self,
        id: &str,
        precondition: Precondition,
        patch: &MetadataPatch,
    ) -> StoreResult<ApiKeyRecord> {
        let mut kv = self.kv.lock();
        let old = read_record(&*kv, id)?.ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        precondition
            .check(&old)
            .map_err(|failure| StoreError::PreconditionFailed {
                id: id.to_string(),
                failure,
            })?;

        let mut updated = old.clone();
        patch.apply(&mut updated.metadata);
        updated.metadata.tags = normalize_tags(&updated.metadata.tags);

        let mut batch = Batch::new(&*kv);
        batch.put_record(&updated)?;
        batch.apply(id, &IndexDelta::between(&old, &updated))?;
        let ops = batch.finish()?;
        kv.atomic_batch_write(ops).map_err(backend)?;
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        let mut kv = self.kv.lock();
        let Some(record) = read_record(&*kv, id)? else {
            return Ok(false);
        };

        let mut batch = Batch::new(&*kv);
        batch.delete_record(id);
        batch.apply(id, &IndexDelta::delete(&record))?;
        let ops = batch.finish()?;
        kv.atomic_batch_write(ops).map_err(backend)?;
        Ok(true)
    }

    async fn delete_by_owner(&self, owner_id: &str) -> StoreResult<Vec<ApiKeyRecord>> {
        let mut kv = self.kv.lock();
        let ids = read_id_set(&*kv, &keys::owner(owner_id))?;
        let mut records = read_records(&*kv, &ids)?;
        if records.is_empty() {
            return Ok(records);
        }

        let mut batch = Batch::new(&*kv);
        for record in &records {
            batch.delete_record(&record.id);
            batch.apply(&record.id, &IndexDelta::delete(record))?;
        }
        let ops = batch.finish()?;
        kv.atomic_batch_write(ops).map_err(backend)?;
        sort_records(&mut records);
        Ok(records)
    }
}
