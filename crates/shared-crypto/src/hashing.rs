//! # Secret Digests
//!
//! One-way digests of API key secrets. The stored form is the lowercase hex
//! encoding of `H(salt || secret)`.

use crate::compare::constant_time_eq;
use crate::CryptoError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use sha3::Sha3_256;
use std::fmt;
use std::str::FromStr;

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HashAlgorithm {
    /// SHA-256 (default).
    #[default]
    #[serde(rename = "sha256")]
    Sha256,
    /// SHA-512.
    #[serde(rename = "sha512")]
    Sha512,
    /// SHA3-256 (Keccak).
    #[serde(rename = "sha3-256")]
    Sha3_256,
    /// BLAKE3.
    #[serde(rename = "blake3")]
    Blake3,
}

impl HashAlgorithm {
    /// Canonical length of the hex-encoded digest.
    pub const fn hex_len(self) -> usize {
        match self {
            Self::Sha256 | Self::Sha3_256 | Self::Blake3 => 64,
            Self::Sha512 => 128,
        }
    }

    /// Canonical name, as accepted by [`FromStr`].
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
            Self::Sha3_256 => "sha3-256",
            Self::Blake3 => "blake3",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "sha512" | "sha-512" => Ok(Self::Sha512),
            "sha3-256" | "sha3_256" => Ok(Self::Sha3_256),
            "blake3" => Ok(Self::Blake3),
            other => Err(CryptoError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// Compute the hex digest of `salt || secret`.
pub fn digest(secret: &str, algorithm: HashAlgorithm, salt: Option<&str>) -> String {
    let salt = salt.unwrap_or_default().as_bytes();
    let secret = secret.as_bytes();

    match algorithm {
        HashAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            hasher.update(salt);
            hasher.update(secret);
            hex::encode(hasher.finalize())
        }
        HashAlgorithm::Sha512 => {
            let mut hasher = Sha512::new();
            hasher.update(salt);
            hasher.update(secret);
            hex::encode(hasher.finalize())
        }
        HashAlgorithm::Sha3_256 => {
            let mut hasher = Sha3_256::new();
            hasher.update(salt);
            hasher.update(secret);
            hex::encode(hasher.finalize())
        }
        HashAlgorithm::Blake3 => {
            let mut hasher = blake3::Hasher::new();
            hasher.update(salt);
            hasher.update(secret);
            hasher.finalize().to_hex().to_string()
        }
    }
}

/// Check `secret` against a stored digest.
///
/// A stored digest of the wrong length is rejected before hashing. The
/// final comparison is constant-time.
pub fn validate(
    secret: &str,
    stored_digest: &str,
    algorithm: HashAlgorithm,
    salt: Option<&str>,
) -> bool {
    if stored_digest.len() != algorithm.hex_len() {
        return false;
    }

    let computed = digest(secret, algorithm, salt);
    constant_time_eq(computed.as_bytes(), stored_digest.as_bytes())
}
