//! Guarded lifecycle transitions.
//!
//! Each transition writes through [`KeyStore::update_metadata_if`] so the
//! state check and the write happen in one store step. Afterwards the
//! projection is invalidated and an event emitted. Guard misses surface as
//! typed errors.
//!
//! [`KeyStore::update_metadata_if`]: kw_03_key_store::KeyStore::update_metadata_if

use super::{KeyManager, COMPONENT};
use crate::domain::{CreateKeyRequest, KeyError, KeyResult, RotateRequest};
use kw_03_key_store::{Precondition, PreconditionFailure, StoreError};
use serde::Serialize;
use serde_json::json;
use shared_types::{normalize_tags, ApiKeyMetadata, ApiKeyRecord, AuditAction, AuditContext, MetadataPatch};

/// A freshly issued key. `secret` is only ever available here.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedKey {
    pub secret: String,
    pub record: ApiKeyRecord,
}

/// Outcome of a rotation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RotatedKey {
    pub secret: String,
    /// The replacement.
    pub record: ApiKeyRecord,
    /// The rotated-away record, now revoked.
    pub previous: ApiKeyRecord,
}

impl KeyManager {
    /// Issue a new key.
    pub async fn create(
        &self,
        request: CreateKeyRequest,
        context: Option<AuditContext>,
    ) -> KeyResult<IssuedKey> {
        if request.owner_id.trim().is_empty() {
            return Err(KeyError::InvalidRequest("owner_id is required".into()));
        }

        let now = self.time_source.now_ms();
        let mut metadata = ApiKeyMetadata::new(request.owner_id, now);
        metadata.name = request.name;
        metadata.description = request.description;
        metadata.scopes = request.scopes;
        metadata.resources = request.resources;
        metadata.tags = normalize_tags(&request.tags);
        metadata.expires_at = request.expires_at;
        metadata.enabled = !request.disabled;

        let (secret, record) = self.issue(metadata).await?;
        self.logger.info(
            COMPONENT,
            "API key created",
            &[("key_id", &record.id), ("owner_id", &record.metadata.owner_id)],
        );
        self.emit(AuditAction::Created, &record, context, json!({})).await;

        Ok(IssuedKey { secret, record })
    }

    /// Revoke a key permanently.
    pub async fn revoke(&self, id: &str, context: Option<AuditContext>) -> KeyResult<ApiKeyRecord> {
        let now = self.time_source.now_ms();
        let updated = self
            .guarded_update(
                id,
                Precondition::Live,
                &MetadataPatch::new().revoked_at(now),
                KeyError::AlreadyRevoked,
            )
            .await?;
        self.invalidate_cache(&updated.secret_digest).await;

        self.logger.info(COMPONENT, "API key revoked", &[("key_id", &id)]);
        self.emit(AuditAction::Revoked, &updated, context, json!({})).await;
        Ok(updated)
    }

    pub async fn enable(&self, id: &str, context: Option<AuditContext>) -> KeyResult<ApiKeyRecord> {
        self.set_enabled(id, true, context).await
    }

    pub async fn disable(&self, id: &str, context: Option<AuditContext>) -> KeyResult<ApiKeyRecord> {
        self.set_enabled(id, false, context).await
    }

    /// Replace a key with a new secret.
    ///
    /// The new record inherits every metadata field `request` leaves unset.
    /// The old record is revoked with `rotated_to` pointing at the new id,
    /// guarded on it still being live. If another transition revoked it
    /// first, the replacement is deleted again.
    pub async fn rotate(
        &self,
        id: &str,
        request: RotateRequest,
        context: Option<AuditContext>,
    ) -> KeyResult<RotatedKey> {
        let old = self.load(id).await?;
        if old.is_revoked() {
            return Err(KeyError::CannotModifyRevoked(id.to_string()));
        }

        let now = self.time_source.now_ms();
        let inherited = &old.metadata;
        let mut metadata = ApiKeyMetadata::new(inherited.owner_id.clone(), now);
        metadata.name = request.name.or_else(|| inherited.name.clone());
        metadata.description = request.description.or_else(|| inherited.description.clone());
        metadata.scopes = request.scopes.unwrap_or_else(|| inherited.scopes.clone());
        metadata.resources = request.resources.unwrap_or_else(|| inherited.resources.clone());
        metadata.tags = match request.tags {
            Some(tags) => normalize_tags(&tags),
            None => inherited.tags.clone(),
        };
        metadata.expires_at = request.expires_at.unwrap_or(inherited.expires_at);

        let (secret, record) = self.issue(metadata).await?;

        let retire = MetadataPatch::new().revoked_at(now).rotated_to(record.id.clone());
        let retired = self
            .guarded_update(id, Precondition::Live, &retire, KeyError::CannotModifyRevoked)
            .await;
        let previous = match retired {
            Ok(previous) => previous,
            Err(err) => {
                // Leave no second live key behind
                if let Err(cleanup) = self.store.delete(&record.id).await {
                    self.logger.error(
                        COMPONENT,
                        "Failed to remove replacement after aborted rotation",
                        &[("key_id", &record.id), ("error", &cleanup)],
                    );
                }
                return Err(err);
            }
        };
        self.invalidate_cache(&old.secret_digest).await;

        self.logger.info(
            COMPONENT,
            "API key rotated",
            &[("key_id", &id), ("rotated_to", &record.id)],
        );
        self.emit(
            AuditAction::Rotated,
            &previous,
            context.clone(),
            json!({ "rotatedTo": record.id }),
        )
        .await;
        self.emit(
            AuditAction::Created,
            &record,
            context,
            json!({ "rotatedFrom": previous.id }),
        )
        .await;

        Ok(RotatedKey {
            secret,
            record,
            previous,
        })
    }

    /// Patch metadata of a live key.
    ///
    /// Lifecycle fields (`enabled`, `revokedAt`, `rotatedTo`, `lastUsedAt`)
    /// are rejected; they only change through their own transitions.
    pub async fn update_metadata(
        &self,
        id: &str,
        patch: MetadataPatch,
        context: Option<AuditContext>,
    ) -> KeyResult<ApiKeyRecord> {
        let lifecycle = patch.lifecycle_fields();
        if !lifecycle.is_empty() {
            return Err(KeyError::InvalidRequest(format!(
                "lifecycle fields cannot be patched: {}",
                lifecycle.join(", ")
            )));
        }

        let updated = self
            .guarded_update(id, Precondition::Live, &patch, KeyError::CannotModifyRevoked)
            .await?;
        self.invalidate_cache(&updated.secret_digest).await;

        let details = serde_json::to_value(&patch).unwrap_or_default();
        self.emit(AuditAction::Updated, &updated, context, details).await;
        Ok(updated)
    }

    /// Hard delete one key.
    pub async fn delete(&self, id: &str, context: Option<AuditContext>) -> KeyResult<()> {
        let record = self.load(id).await?;
        if !self.store.delete(id).await? {
            return Err(KeyError::KeyNotFound(id.to_string()));
        }
        self.invalidate_cache(&record.secret_digest).await;

        self.logger.info(COMPONENT, "API key deleted", &[("key_id", &id)]);
        self.emit(AuditAction::Deleted, &record, context, json!({})).await;
        Ok(())
    }

    /// Hard delete every key of `owner_id`. Returns how many were removed.
    pub async fn delete_by_owner(
        &self,
        owner_id: &str,
        context: Option<AuditContext>,
    ) -> KeyResult<usize> {
        let removed = self.store.delete_by_owner(owner_id).await?;

        for record in &removed {
            self.invalidate_cache(&record.secret_digest).await;
        }
        self.logger.info(
            COMPONENT,
            "API keys deleted for owner",
            &[("owner_id", &owner_id), ("count", &removed.len())],
        );
        for record in &removed {
            self.emit(AuditAction::Deleted, record, context.clone(), json!({}))
                .await;
        }
        Ok(removed.len())
    }

    async fn set_enabled(
        &self,
        id: &str,
        enabled: bool,
        context: Option<AuditContext>,
    ) -> KeyResult<ApiKeyRecord> {
        let updated = self
            .guarded_update(
                id,
                Precondition::Enabled(!enabled),
                &MetadataPatch::new().enabled(enabled),
                KeyError::CannotModifyRevoked,
            )
            .await?;
        self.invalidate_cache(&updated.secret_digest).await;

        let action = if enabled {
            AuditAction::Enabled
        } else {
            AuditAction::Disabled
        };
        self.logger.info(COMPONENT, "API key state changed", &[("key_id", &id), ("action", &action)]);
        self.emit(action, &updated, context, json!({})).await;
        Ok(updated)
    }

    /// Conditional write. `revoked` builds the error for a record that is
    /// already revoked, which differs between revoke and other transitions.
    async fn guarded_update(
        &self,
        id: &str,
        precondition: Precondition,
        patch: &MetadataPatch,
        revoked: fn(String) -> KeyError,
    ) -> KeyResult<ApiKeyRecord> {
        self.store
            .update_metadata_if(id, precondition, patch)
            .await
            .map_err(|err| match err {
                StoreError::NotFound(_) => KeyError::KeyNotFound(id.to_string()),
                StoreError::PreconditionFailed { failure, .. } => match failure {
                    PreconditionFailure::Revoked => revoked(id.to_string()),
                    PreconditionFailure::Enabled => KeyError::AlreadyEnabled(id.to_string()),
                    PreconditionFailure::Disabled => KeyError::AlreadyDisabled(id.to_string()),
                },
                other => KeyError::Store(other),
            })
    }

    async fn load(&self, id: &str) -> KeyResult<ApiKeyRecord> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| KeyError::KeyNotFound(id.to_string()))
    }

    /// Generate a secret, digest it and persist a new record.
    async fn issue(&self, metadata: ApiKeyMetadata) -> KeyResult<(String, ApiKeyRecord)> {
        let secret = shared_crypto::generate_key(
            self.config.key_length,
            self.config.prefix.as_deref(),
            Some(self.config.alphabet.as_str()),
        )?;
        let id = uuid::Uuid::new_v4().to_string();
        let record = ApiKeyRecord::new(id, self.hash_key(&secret), metadata);
        self.store.save(record.clone()).await?;
        Ok((secret, record))
    }
}
