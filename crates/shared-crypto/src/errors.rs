//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Requested key length is zero
    #[error("Invalid key length: {0}")]
    InvalidKeyLength(usize),

    /// Alphabet is empty or too large to sample from a single byte
    #[error("Invalid alphabet: {0}")]
    InvalidAlphabet(String),

    /// Unknown hash algorithm name
    #[error("Unsupported hash algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The OS random source failed
    #[error("Random source failure: {0}")]
    RandomSource(String),
}
