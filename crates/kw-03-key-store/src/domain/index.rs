//! Index bookkeeping shared by every backend.
//!
//! A record maps to a fixed set of [`IndexEntry`] values. Backends never
//! patch indices by hand: they diff the entry sets of the old and new
//! record and apply exactly that delta.

use shared_types::ApiKeyRecord;
use std::collections::BTreeSet;

/// One secondary-index membership of a record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexEntry {
    LiveHash(String),
    RevokedHash(String),
    Owner(String),
    Tag(String),
}

impl IndexEntry {
    /// All index memberships `record` must have.
    pub fn for_record(record: &ApiKeyRecord) -> BTreeSet<IndexEntry> {
        let mut entries = BTreeSet::new();
        if record.is_revoked() {
            entries.insert(IndexEntry::RevokedHash(record.secret_digest.clone()));
        } else {
            entries.insert(IndexEntry::LiveHash(record.secret_digest.clone()));
        }
        entries.insert(IndexEntry::Owner(record.metadata.owner_id.clone()));
        for tag in &record.metadata.tags {
            entries.insert(IndexEntry::Tag(tag.clone()));
        }
        entries
    }
}

/// Entries to drop and add when a record changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexDelta {
    pub remove: Vec<IndexEntry>,
    pub add: Vec<IndexEntry>,
}

impl IndexDelta {
    pub fn between(old: &ApiKeyRecord, new: &ApiKeyRecord) -> Self {
        let before = IndexEntry::for_record(old);
        let after = IndexEntry::for_record(new);
        Self {
            remove: before.difference(&after).cloned().collect(),
            add: after.difference(&before).cloned().collect(),
        }
    }

    pub fn insert(record: &ApiKeyRecord) -> Self {
        Self {
            remove: Vec::new(),
            add: IndexEntry::for_record(record).into_iter().collect(),
        }
    }

    pub fn delete(record: &ApiKeyRecord) -> Self {
        Self {
            remove: IndexEntry::for_record(record).into_iter().collect(),
            add: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.remove.is_empty() && self.add.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{normalize_tags, ApiKeyMetadata};

    fn record(tags: &[&str]) -> ApiKeyRecord {
        let mut metadata = ApiKeyMetadata::new("owner-1", 1_000);
        metadata.tags = normalize_tags(tags.iter().copied());
        ApiKeyRecord::new("k1", "d1", metadata)
    }

    #[test]
    fn test_tag_delta_only_touches_changed_tags() {
        let old = record(&["a", "b"]);
        let new = record(&["a", "c"]);

        let delta = IndexDelta::between(&old, &new);
        assert_eq!(delta.remove, vec![IndexEntry::Tag("b".into())]);
        assert_eq!(delta.add, vec![IndexEntry::Tag("c".into())]);
    }

    #[test]
    fn test_revocation_moves_hash_to_tombstone() {
        let old = record(&[]);
        let mut new = old.clone();
        new.metadata.revoked_at = Some(2_000);

        let delta = IndexDelta::between(&old, &new);
        assert_eq!(delta.remove, vec![IndexEntry::LiveHash("d1".into())]);
        assert_eq!(delta.add, vec![IndexEntry::RevokedHash("d1".into())]);
    }

    #[test]
    fn test_unchanged_record_has_empty_delta() {
        let old = record(&["x"]);
        let mut new = old.clone();
        new.metadata.last_used_at = Some(5_000);
        assert!(IndexDelta::between(&old, &new).is_empty());
    }

    #[test]
    fn test_insert_and_delete_are_symmetric() {
        let rec = record(&["x", "y"]);
        let insert = IndexDelta::insert(&rec);
        let delete = IndexDelta::delete(&rec);
        assert_eq!(insert.add, delete.remove);
        assert_eq!(insert.add.len(), 4);
    }
}
