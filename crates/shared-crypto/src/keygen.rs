//! # Key Generation
//!
//! API key secrets are drawn from the operating system CSPRNG and mapped
//! onto an alphabet with rejection sampling, so every character is
//! uniformly distributed.

use crate::CryptoError;
use rand::rngs::OsRng;
use rand::RngCore;

/// Base62 alphabet used when none is supplied.
pub const DEFAULT_ALPHABET: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Number of random characters in a generated key (prefix excluded).
pub const DEFAULT_KEY_LENGTH: usize = 32;

/// Fill a fresh buffer with `len` bytes from the OS random source.
pub fn secure_random_bytes(len: usize) -> Result<Vec<u8>, CryptoError> {
    let mut buf = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut buf)
        .map_err(|e| CryptoError::RandomSource(e.to_string()))?;
    Ok(buf)
}

/// Generate a key of `length` random characters, optionally prefixed.
///
/// `prefix` is prepended verbatim and does not count towards `length`.
pub fn generate_key(
    length: usize,
    prefix: Option<&str>,
    alphabet: Option<&str>,
) -> Result<String, CryptoError> {
    if length == 0 {
        return Err(CryptoError::InvalidKeyLength(length));
    }

    let alphabet: Vec<char> = alphabet.unwrap_or(DEFAULT_ALPHABET).chars().collect();
    if alphabet.is_empty() || alphabet.len() > 256 {
        return Err(CryptoError::InvalidAlphabet(format!(
            "alphabet must have 1..=256 characters, got {}",
            alphabet.len()
        )));
    }

    let n = alphabet.len();
    // Largest multiple of n that fits in a byte; bytes at or above it are rejected.
    let limit = 256 - (256 % n);

    let prefix = prefix.unwrap_or_default();
    let mut key = String::with_capacity(prefix.len() + length);
    key.push_str(prefix);

    let mut produced = 0;
    while produced < length {
        let chunk = secure_random_bytes((length - produced) * 2)?;
        for byte in chunk {
            let byte = byte as usize;
            if byte >= limit {
                continue;
            }
            key.push(alphabet[byte % n]);
            produced += 1;
            if produced == length {
                break;
            }
        }
    }

    Ok(key)
}
