//! # Cache Subsystem (kw-01)
//!
//! Key-value cache with TTL and an atomic counter, used by the rate limiter
//! for window counters and by the key manager for verification projections.
//!
//! ## Contract
//!
//! | Operation | Semantics |
//! |-----------|-----------|
//! | `get` | value or `None`; expired entries are never returned |
//! | `set` | overwrite with TTL (seconds, `0` = no expiry) |
//! | `delete` | remove; deleting a missing key is not an error |
//! | `increment` | read-modify-write plus TTL (re)application as one indivisible step |
//!
//! ## Backends
//!
//! - [`MemoryCache`]: process-local, lazily expiring, optionally LRU-bounded.
//!   The whole increment runs under one lock, so it is safe under parallel
//!   tasks, not only under cooperative interleaving.
//! - `RedisCache` (feature `redis`): increment is a single server-side
//!   script (`INCR` + `EXPIRE`), atomic across processes.
//!
//! A get-then-set increment is a lost-update bug under concurrent callers;
//! no backend implements it that way.
//!
//! ## Hexagonal Architecture
//!
//! - **Domain Layer** (`domain/`): errors and configuration
//! - **Ports Layer** (`ports/`): the [`Cache`] trait
//! - **Adapters Layer** (`adapters/`): backends and the config-driven factory

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::{build_cache, MemoryCache};
#[cfg(feature = "redis")]
pub use adapters::RedisCache;
pub use domain::{CacheBackend, CacheConfig, CacheError, CacheResult};
pub use ports::Cache;
