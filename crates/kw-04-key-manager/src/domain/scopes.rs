//! Scope authorization checks.
//!
//! Global scopes live in `metadata.scopes`; per-resource grants live in
//! `metadata.resources` under `"type:id"`. A global grant satisfies every
//! resource check.

use shared_types::{resource_key, ApiKeyRecord};

pub fn has_scope(record: &ApiKeyRecord, scope: &str) -> bool {
    record.metadata.scopes.iter().any(|s| s == scope)
}

pub fn has_any_scope<S: AsRef<str>>(record: &ApiKeyRecord, scopes: &[S]) -> bool {
    scopes.iter().any(|s| has_scope(record, s.as_ref()))
}

/// True for an empty `scopes` list.
pub fn has_all_scopes<S: AsRef<str>>(record: &ApiKeyRecord, scopes: &[S]) -> bool {
    scopes.iter().all(|s| has_scope(record, s.as_ref()))
}

/// Scopes granted on one resource, excluding global scopes.
pub fn resource_scopes(record: &ApiKeyRecord, resource_type: &str, resource_id: &str) -> Vec<String> {
    record
        .metadata
        .resources
        .get(&resource_key(resource_type, resource_id))
        .cloned()
        .unwrap_or_default()
}

pub fn has_resource_scope(
    record: &ApiKeyRecord,
    resource_type: &str,
    resource_id: &str,
    scope: &str,
) -> bool {
    if has_scope(record, scope) {
        return true;
    }
    record
        .metadata
        .resources
        .get(&resource_key(resource_type, resource_id))
        .map_or(false, |granted| granted.iter().any(|s| s == scope))
}

/// Every scope in `scopes` is granted on the resource (globally or locally).
pub fn check_resource_scopes<S: AsRef<str>>(
    record: &ApiKeyRecord,
    resource_type: &str,
    resource_id: &str,
    scopes: &[S],
) -> bool {
    scopes
        .iter()
        .all(|s| has_resource_scope(record, resource_type, resource_id, s.as_ref()))
}
