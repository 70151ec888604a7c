//! Store ports.

pub mod key_store;
pub mod kv;

pub use key_store::{AuditLogStore, KeyStore};
pub use kv::{BatchOperation, InMemoryKVStore, KVStoreError, KeyValueStore};
