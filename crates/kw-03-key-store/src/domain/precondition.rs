//! Record-state guards evaluated inside a store's atomic update.

use serde::{Deserialize, Serialize};
use shared_types::ApiKeyRecord;
use std::fmt;

/// State a record must be in for a conditional update to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Precondition {
    /// Any existing record.
    #[default]
    Exists,
    /// Not revoked.
    Live,
    /// Not revoked, with `enabled` equal to the given value.
    Enabled(bool),
}

/// Why a [`Precondition`] did not hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PreconditionFailure {
    Revoked,
    Enabled,
    Disabled,
}

impl Precondition {
    /// Check `record` against this guard.
    pub fn check(self, record: &ApiKeyRecord) -> Result<(), PreconditionFailure> {
        match self {
            Precondition::Exists => Ok(()),
            Precondition::Live if record.is_revoked() => Err(PreconditionFailure::Revoked),
            Precondition::Live => Ok(()),
            Precondition::Enabled(_) if record.is_revoked() => Err(PreconditionFailure::Revoked),
            Precondition::Enabled(expected) if record.metadata.enabled != expected => {
                Err(if record.metadata.enabled {
                    PreconditionFailure::Enabled
                } else {
                    PreconditionFailure::Disabled
                })
            }
            Precondition::Enabled(_) => Ok(()),
        }
    }
}

impl fmt::Display for PreconditionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PreconditionFailure::Revoked => "revoked",
            PreconditionFailure::Enabled => "enabled",
            PreconditionFailure::Disabled => "disabled",
        })
    }
}
