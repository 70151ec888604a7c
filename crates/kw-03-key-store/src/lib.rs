//! # Key Store Subsystem (kw-03)
//!
//! Authoritative storage for credential records and the secondary indices
//! used to find them.
//!
//! ## Indices
//!
//! | Index | Maps | Populated while |
//! |-------|------|-----------------|
//! | live hash | digest -> id | record not revoked |
//! | revoked hash | digest -> id | record revoked (tombstone) |
//! | owner | owner -> {id} | always |
//! | tag | tag -> {id} | always, tags lowercased |
//!
//! ## Consistency Contract
//!
//! After any call returns, every index entry refers to an existing record
//! and every record appears in exactly the indices listed above. Index
//! changes are computed as a delta between the old and new record
//! ([`domain::IndexEntry`]) and applied in the same critical section or
//! atomic batch as the record write.
//!
//! ## Backends
//!
//! - [`InMemoryKeyStore`]: one `RwLock` over records, indices and the audit
//!   trail. Provides the [`AuditLogStore`] capability.
//! - [`KvKeyStore`]: record and index keys over any [`KeyValueStore`]
//!   that can apply an atomic batch. No audit capability.
//!
//! ## Key Scheme (`KvKeyStore`)
//!
//! ```text
//! apikey:<id>                -> record JSON
//! apikey:hash:<digest>       -> id
//! apikey:revoked:<digest>    -> id
//! apikey:owner:<owner>       -> JSON array of ids
//! apikey:tag:<tag>           -> JSON array of ids
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::{InMemoryKeyStore, KvKeyStore};
pub use domain::{IndexEntry, Precondition, PreconditionFailure, StoreError, StoreResult};
pub use ports::{
    AuditLogStore, BatchOperation, InMemoryKVStore, KVStoreError, KeyStore, KeyValueStore,
};
