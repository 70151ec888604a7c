//! Derived lifecycle state.

use serde::{Deserialize, Serialize};
use shared_types::{ApiKeyRecord, Timestamp};

/// Where a record sits in its lifecycle at a given instant.
///
/// `Revoked` and `RotatedAway` are terminal; `Disabled` can go back to
/// `Active`; `Expired` is computed from the clock, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyState {
    Active,
    Expired,
    Revoked,
    RotatedAway,
    Disabled,
}

impl KeyState {
    /// Terminal states outrank time, and time outranks the enabled flag.
    pub fn of(record: &ApiKeyRecord, now: Timestamp) -> Self {
        let metadata = &record.metadata;
        if metadata.revoked_at.is_some() {
            if metadata.rotated_to.is_some() {
                KeyState::RotatedAway
            } else {
                KeyState::Revoked
            }
        } else if record.is_expired_at(now) {
            KeyState::Expired
        } else if !metadata.enabled {
            KeyState::Disabled
        } else {
            KeyState::Active
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, KeyState::Revoked | KeyState::RotatedAway)
    }
}
