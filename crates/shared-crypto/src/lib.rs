//! # Shared Crypto - Key Material Primitives
//!
//! ## Components
//!
//! | Module | Primitive | Use Case |
//! |--------|-----------|----------|
//! | `keygen` | OS CSPRNG + rejection sampling | API key generation |
//! | `hashing` | SHA-256, SHA-512, SHA3-256, BLAKE3 | Secret digests |
//! | `compare` | `subtle::ConstantTimeEq` | Digest validation |
//!
//! ## Security Properties
//!
//! - Secrets are never stored; only `H(salt || secret)` in lowercase hex
//! - Validation time does not depend on where two digests first differ
//! - Key characters are drawn without modulo bias

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod compare;
pub mod errors;
pub mod hashing;
pub mod keygen;

// Re-exports
pub use compare::constant_time_eq;
pub use errors::CryptoError;
pub use hashing::{digest, validate, HashAlgorithm};
pub use keygen::{generate_key, secure_random_bytes, DEFAULT_ALPHABET, DEFAULT_KEY_LENGTH};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
