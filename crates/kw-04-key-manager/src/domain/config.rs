//! Key manager configuration.

use crate::domain::errors::KeyError;
use serde::{Deserialize, Serialize};
use shared_crypto::{HashAlgorithm, DEFAULT_ALPHABET, DEFAULT_KEY_LENGTH};
use std::env;

/// Key manager configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyManagerConfig {
    /// Prefix prepended to generated secrets (e.g. `sk_live_`)
    pub prefix: Option<String>,
    /// Random characters per secret, prefix excluded
    pub key_length: usize,
    /// Characters secrets are drawn from
    pub alphabet: String,
    /// Digest algorithm for stored secrets
    pub algorithm: HashAlgorithm,
    /// Salt mixed into every digest
    pub salt: Option<String>,
    /// Lifetime of verification projections in the cache
    pub cache_ttl_secs: u64,
    /// Headers searched in order when verifying from headers
    pub header_names: Vec<String>,
    /// Strip a `Bearer ` scheme from header values
    pub extract_bearer: bool,
    /// Reject secrets lacking `prefix` before any lookup
    pub require_prefix: bool,
    /// Record `last_used_at` after successful verification
    pub auto_track_usage: bool,
    /// Persist audit entries when the store supports it
    pub audit_logs: bool,
}

impl Default for KeyManagerConfig {
    fn default() -> Self {
        Self {
            prefix: None,
            key_length: DEFAULT_KEY_LENGTH,
            alphabet: DEFAULT_ALPHABET.to_string(),
            algorithm: HashAlgorithm::Sha256,
            salt: None,
            cache_ttl_secs: 60,
            header_names: vec!["authorization".to_string(), "x-api-key".to_string()],
            extract_bearer: true,
            require_prefix: false,
            auto_track_usage: true,
            audit_logs: false,
        }
    }
}

impl KeyManagerConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), KeyError> {
        if self.key_length == 0 {
            return Err(KeyError::InvalidConfig(
                "key_length must be greater than 0".into(),
            ));
        }

        let alphabet_len = self.alphabet.chars().count();
        if alphabet_len < 2 || alphabet_len > 256 {
            return Err(KeyError::InvalidConfig(format!(
                "alphabet must have between 2 and 256 characters, got {alphabet_len}"
            )));
        }

        if self.require_prefix && self.prefix.as_deref().map_or(true, str::is_empty) {
            return Err(KeyError::InvalidConfig(
                "require_prefix is set but no prefix is configured".into(),
            ));
        }

        if self.cache_ttl_secs == 0 {
            return Err(KeyError::InvalidConfig(
                "cache_ttl_secs must be greater than 0".into(),
            ));
        }

        if self.header_names.iter().all(|h| h.trim().is_empty()) {
            return Err(KeyError::InvalidConfig(
                "at least one header name is required".into(),
            ));
        }

        Ok(())
    }

    /// Create configuration from environment variables.
    ///
    /// - `KEYWARD_KEY_PREFIX`
    /// - `KEYWARD_KEY_LENGTH` (default: 32)
    /// - `KEYWARD_KEY_ALPHABET` (default: base62)
    /// - `KEYWARD_HASH_ALGORITHM`: `sha256`, `sha512`, `sha3-256`, `blake3`
    /// - `KEYWARD_HASH_SALT`
    /// - `KEYWARD_CACHE_TTL_SECS` (default: 60)
    /// - `KEYWARD_HEADER_NAMES`: comma-separated (default: `authorization,x-api-key`)
    /// - `KEYWARD_EXTRACT_BEARER`, `KEYWARD_REQUIRE_PREFIX`,
    ///   `KEYWARD_AUTO_TRACK_USAGE`, `KEYWARD_AUDIT_LOGS`: `true`/`false`
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            prefix: env::var("KEYWARD_KEY_PREFIX").ok().or(defaults.prefix),
            key_length: env::var("KEYWARD_KEY_LENGTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.key_length),
            alphabet: env::var("KEYWARD_KEY_ALPHABET").unwrap_or(defaults.alphabet),
            algorithm: env::var("KEYWARD_HASH_ALGORITHM")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.algorithm),
            salt: env::var("KEYWARD_HASH_SALT").ok().or(defaults.salt),
            cache_ttl_secs: env::var("KEYWARD_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cache_ttl_secs),
            header_names: env::var("KEYWARD_HEADER_NAMES")
                .map(|v| {
                    v.split(',')
                        .map(|h| h.trim().to_lowercase())
                        .filter(|h| !h.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.header_names),
            extract_bearer: env_flag("KEYWARD_EXTRACT_BEARER", defaults.extract_bearer),
            require_prefix: env_flag("KEYWARD_REQUIRE_PREFIX", defaults.require_prefix),
            auto_track_usage: env_flag("KEYWARD_AUTO_TRACK_USAGE", defaults.auto_track_usage),
            audit_logs: env_flag("KEYWARD_AUDIT_LOGS", defaults.audit_logs),
        }
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(v) => matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}
