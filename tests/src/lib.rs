//! # Keyward Test Suite
//!
//! Cross-crate flows that no single crate can test on its own.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/integration/
//! │   ├── lifecycle.rs    # create → verify → rotate → revoke over both stores
//! │   ├── consistency.rs  # cache projection vs. store under mutation
//! │   ├── limits.rs       # limiter wired into verification
//! │   └── telemetry.rs    # config-driven wiring and listeners
//! └── benches/
//!     └── verify_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p kw-tests
//! cargo test -p kw-tests integration::consistency
//! cargo bench -p kw-tests
//! ```

#[cfg(test)]
pub mod fixtures;
pub mod integration;
