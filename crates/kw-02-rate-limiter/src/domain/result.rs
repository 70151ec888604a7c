//! Per-check options and outcome.

use serde::{Deserialize, Serialize};
use shared_types::Timestamp;

/// Options for [`crate::RateLimiter::check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOptions {
    /// Count this request (`false` = dry read).
    pub increment: bool,
    /// Counter subject override, e.g. a client IP instead of the key id.
    pub identifier: Option<String>,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            increment: true,
            identifier: None,
        }
    }
}

impl CheckOptions {
    /// Read the current count without consuming budget.
    pub fn dry_run() -> Self {
        Self {
            increment: false,
            identifier: None,
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }
}

/// Outcome of one limiter check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitResult {
    pub allowed: bool,
    /// Requests counted in the current window
    pub current: u64,
    pub limit: u64,
    pub remaining: u64,
    /// Milliseconds until the window closes
    pub reset_ms: u64,
    /// Window end, epoch milliseconds
    pub reset_at: Timestamp,
}
