//! # Core Domain Entities
//!
//! - **Credential**: [`ApiKeyRecord`], [`ApiKeyMetadata`]
//! - **Mutation**: [`MetadataPatch`]
//!
//! Records never carry the plaintext secret, only `secret_digest`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;

/// Opaque record identifier.
pub type KeyId = String;

/// Mapping from `"type:id"` to the scopes granted on that resource.
pub type ResourceScopes = BTreeMap<String, Vec<String>>;

/// Build the `"type:id"` key used in [`ApiKeyMetadata::resources`].
pub fn resource_key(resource_type: &str, resource_id: &str) -> String {
    format!("{resource_type}:{resource_id}")
}

/// Lowercase, trim and de-duplicate tags. Empty tags are dropped.
pub fn normalize_tags<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Descriptive and policy metadata attached to a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyMetadata {
    /// Owner of the credential (user, service, tenant).
    pub owner_id: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: Option<String>,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Globally granted scopes, in insertion order.
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Per-resource scopes keyed by `"type:id"`.
    #[serde(default)]
    pub resources: ResourceScopes,
    /// Lowercase tags.
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Expiration time; `None` never expires.
    #[serde(default)]
    pub expires_at: Option<Timestamp>,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last successful verification.
    #[serde(default)]
    pub last_used_at: Option<Timestamp>,
    /// Disabled keys fail verification but may be re-enabled.
    pub enabled: bool,
    /// Revocation time. A revoked record is logically dead.
    #[serde(default)]
    pub revoked_at: Option<Timestamp>,
    /// Successor record when this key was rotated away.
    #[serde(default)]
    pub rotated_to: Option<KeyId>,
}

impl ApiKeyMetadata {
    /// Fresh, enabled metadata for `owner_id`.
    pub fn new(owner_id: impl Into<String>, created_at: Timestamp) -> Self {
        Self {
            owner_id: owner_id.into(),
            name: None,
            description: None,
            scopes: Vec::new(),
            resources: BTreeMap::new(),
            tags: BTreeSet::new(),
            expires_at: None,
            created_at,
            last_used_at: None,
            enabled: true,
            revoked_at: None,
            rotated_to: None,
        }
    }
}

/// Authoritative credential record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyRecord {
    /// Record identifier.
    pub id: KeyId,
    /// Digest of the secret.
    pub secret_digest: String,
    /// Metadata.
    pub metadata: ApiKeyMetadata,
}

impl ApiKeyRecord {
    pub fn new(id: impl Into<KeyId>, secret_digest: impl Into<String>, metadata: ApiKeyMetadata) -> Self {
        Self {
            id: id.into(),
            secret_digest: secret_digest.into(),
            metadata,
        }
    }

    /// True once `revoked_at` has been set.
    pub fn is_revoked(&self) -> bool {
        self.metadata.revoked_at.is_some()
    }

    /// True when `expires_at` is at or before `now`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        matches!(self.metadata.expires_at, Some(expires_at) if expires_at <= now)
    }
}

/// Partial metadata update.
///
/// `None` leaves a field untouched. Nullable fields use a nested option:
/// `Some(None)` clears the field, `Some(Some(v))` sets it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetadataPatch {
    pub owner_id: Option<String>,
    pub name: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub scopes: Option<Vec<String>>,
    pub resources: Option<ResourceScopes>,
    pub tags: Option<BTreeSet<String>>,
    pub expires_at: Option<Option<Timestamp>>,
    pub last_used_at: Option<Option<Timestamp>>,
    pub enabled: Option<bool>,
    pub revoked_at: Option<Option<Timestamp>>,
    pub rotated_to: Option<Option<KeyId>>,
}

impl MetadataPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    pub fn name(mut self, name: Option<String>) -> Self {
        self.name = Some(name);
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = Some(scopes.into_iter().map(Into::into).collect());
        self
    }

    pub fn resources(mut self, resources: ResourceScopes) -> Self {
        self.resources = Some(resources);
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = Some(normalize_tags(tags));
        self
    }

    pub fn expires_at(mut self, expires_at: Option<Timestamp>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn last_used_at(mut self, at: Timestamp) -> Self {
        self.last_used_at = Some(Some(at));
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn revoked_at(mut self, at: Timestamp) -> Self {
        self.revoked_at = Some(Some(at));
        self
    }

    pub fn rotated_to(mut self, id: impl Into<KeyId>) -> Self {
        self.rotated_to = Some(Some(id.into()));
        self
    }

    /// True if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Names of the lifecycle fields this patch sets. Those belong to the
    /// guarded transitions (revoke, rotate, enable, disable, usage tracking).
    pub fn lifecycle_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.last_used_at.is_some() {
            fields.push("lastUsedAt");
        }
        if self.enabled.is_some() {
            fields.push("enabled");
        }
        if self.revoked_at.is_some() {
            fields.push("revokedAt");
        }
        if self.rotated_to.is_some() {
            fields.push("rotatedTo");
        }
        fields
    }

    /// Overlay the patch onto `metadata`. Tags are normalized.
    pub fn apply(&self, metadata: &mut ApiKeyMetadata) {
        if let Some(owner_id) = &self.owner_id {
            metadata.owner_id = owner_id.clone();
        }
        if let Some(name) = &self.name {
            metadata.name = name.clone();
        }
        if let Some(description) = &self.description {
            metadata.description = description.clone();
        }
        if let Some(scopes) = &self.scopes {
            metadata.scopes = scopes.clone();
        }
        if let Some(resources) = &self.resources {
            metadata.resources = resources.clone();
        }
        if let Some(tags) = &self.tags {
            metadata.tags = normalize_tags(tags);
        }
        if let Some(expires_at) = self.expires_at {
            metadata.expires_at = expires_at;
        }
        if let Some(last_used_at) = self.last_used_at {
            metadata.last_used_at = last_used_at;
        }
        if let Some(enabled) = self.enabled {
            metadata.enabled = enabled;
        }
        if let Some(revoked_at) = self.revoked_at {
            metadata.revoked_at = revoked_at;
        }
        if let Some(rotated_to) = &self.rotated_to {
            metadata.rotated_to = rotated_to.clone();
        }
    }
}
