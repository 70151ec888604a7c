//! # Rate Limiter Subsystem (kw-02)
//!
//! Fixed-window request counting on top of the [`kw_01_cache::Cache`]
//! atomic counter.
//!
//! ## Window Model
//!
//! ```text
//! windowStart = floor(now / windowMs) * windowMs
//! key         = <prefix>:<subject>:<windowStart>
//! resetAt     = windowStart + windowMs
//! ```
//!
//! The counter key carries a TTL equal to the window length rounded up to
//! whole seconds, so abandoned windows age out of the cache on their own.
//!
//! ## Counting Policy
//!
//! | Mode | Mutation | Allowed when |
//! |------|----------|--------------|
//! | increment (default) | atomic `+1` | `count <= max_requests` |
//! | dry read | none | `count < max_requests` |
//!
//! Denied requests are counted as well: a client that keeps hammering a
//! closed window does not earn extra budget.
//!
//! Concurrency safety comes entirely from the cache's `increment`; the
//! limiter holds no state of its own beyond configuration.

pub mod domain;
pub mod service;

pub use domain::{CheckOptions, RateLimitConfig, RateLimitError, RateLimitResult};
pub use service::RateLimiter;
