//! # Shared Types Crate
//!
//! Domain entities shared by every Keyward subsystem.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: the credential record and its metadata are
//!   defined once and used by stores, the key manager and tests.
//! - **No Plaintext Secrets**: records carry only the secret digest.
//! - **Injected Time**: all timestamps come from a [`TimeSource`] so
//!   expiration and windowing can be driven deterministically in tests.

pub mod audit;
pub mod entities;
pub mod time;

pub use audit::*;
pub use entities::*;
pub use time::*;
