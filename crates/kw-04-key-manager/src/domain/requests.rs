//! Inputs for key creation and rotation.

use serde::{Deserialize, Serialize};
use shared_types::{ResourceScopes, Timestamp};
use std::collections::BTreeSet;

/// Parameters for [`crate::KeyManager::create`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateKeyRequest {
    pub owner_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub scopes: Vec<String>,
    pub resources: ResourceScopes,
    pub tags: BTreeSet<String>,
    pub expires_at: Option<Timestamp>,
    /// Start disabled; defaults to enabled.
    pub disabled: bool,
}

impl CreateKeyRequest {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            ..Self::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn resource<I, S>(mut self, resource_type: &str, resource_id: &str, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources.insert(
            shared_types::resource_key(resource_type, resource_id),
            scopes.into_iter().map(Into::into).collect(),
        );
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = shared_types::normalize_tags(tags);
        self
    }

    pub fn expires_at(mut self, expires_at: Timestamp) -> Self {
        self.expires_at = Some(expires_at);
        self
    }
}

/// Overrides for the replacement key in [`crate::KeyManager::rotate`].
///
/// Unset fields are carried forward from the rotated key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RotateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub scopes: Option<Vec<String>>,
    pub resources: Option<ResourceScopes>,
    pub tags: Option<BTreeSet<String>>,
    pub expires_at: Option<Option<Timestamp>>,
}
