//! Event fan-out and audit trail access.

use super::{KeyManager, COMPONENT};
use crate::domain::{KeyError, KeyEvent, KeyResult};
use kw_03_key_store::AuditLogStore;
use shared_types::{
    ApiKeyRecord, AuditAction, AuditContext, AuditLogEntry, AuditLogQuery, AuditLogStats,
};

impl KeyManager {
    /// Notify listeners and, if enabled, persist an audit entry.
    ///
    /// Nothing here can fail the transition that already happened.
    pub(crate) async fn emit(
        &self,
        action: AuditAction,
        record: &ApiKeyRecord,
        context: Option<AuditContext>,
        details: serde_json::Value,
    ) {
        let event = KeyEvent {
            action,
            key_id: record.id.clone(),
            owner_id: record.metadata.owner_id.clone(),
            timestamp: self.time_source.now_ms(),
            context: context.unwrap_or_default(),
            record: record.clone(),
            details,
        };

        if self.config.audit_logs {
            self.persist(&event).await;
        }

        let listeners = self.listeners.read().clone();
        for listener in listeners {
            listener.on_event(&event).await;
        }
    }

    async fn persist(&self, event: &KeyEvent) {
        let Some(audit) = self.store.audit_log() else {
            self.logger.debug(
                COMPONENT,
                "Store has no audit log, entry dropped",
                &[("action", &event.action)],
            );
            return;
        };

        let entry = AuditLogEntry {
            id: uuid::Uuid::new_v4().to_string(),
            key_id: event.key_id.clone(),
            owner_id: event.owner_id.clone(),
            action: event.action,
            timestamp: event.timestamp,
            context: event.context.clone(),
            details: event.details.clone(),
        };
        if let Err(err) = audit.save_log(entry).await {
            self.logger.warn(
                COMPONENT,
                "Failed to write audit log",
                &[("key_id", &event.key_id), ("action", &event.action), ("error", &err)],
            );
        }
    }

    fn audit_store(&self) -> KeyResult<&dyn AuditLogStore> {
        self.store
            .audit_log()
            .ok_or(KeyError::StorageNotSupported("audit logs"))
    }

    /// Audit entries matching `query`, newest first.
    pub async fn get_logs(&self, query: &AuditLogQuery) -> KeyResult<Vec<AuditLogEntry>> {
        Ok(self.audit_store()?.find_logs(query).await?)
    }

    pub async fn count_logs(&self, query: &AuditLogQuery) -> KeyResult<usize> {
        Ok(self.audit_store()?.count_logs(query).await?)
    }

    pub async fn delete_logs(&self, query: &AuditLogQuery) -> KeyResult<usize> {
        Ok(self.audit_store()?.delete_logs(query).await?)
    }

    pub async fn get_log_stats(&self, owner_id: Option<&str>) -> KeyResult<AuditLogStats> {
        Ok(self.audit_store()?.get_log_stats(owner_id).await?)
    }

    /// Audit entries for one key.
    pub async fn get_key_logs(&self, key_id: &str) -> KeyResult<Vec<AuditLogEntry>> {
        self.get_logs(&AuditLogQuery::for_key(key_id)).await
    }
}
