//! Store backends.

pub mod kv_store;
mod memory;

pub use kv_store::KvKeyStore;
pub use memory::InMemoryKeyStore;
