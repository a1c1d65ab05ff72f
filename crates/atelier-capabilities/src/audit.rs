//! Invocation audit records.

use atelier_storage::{Collection, DocumentStore, StorageResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::invocation::Invocation;

/// One persisted record per capability invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationRecord {
    /// Unique record id.
    pub id: Uuid,
    /// The invoked capability name.
    pub capability: String,
    /// Whether the invocation succeeded.
    pub success: bool,
    /// The failure code, when the invocation failed.
    pub error: Option<String>,
    /// When the invocation completed.
    pub timestamp: DateTime<Utc>,
}

/// Persistent sink for invocation records.
///
/// Records land in a document collection so the dashboard can answer "what
/// did the agent actually do". Failures to persist are the registry's to
/// log; they never fail the invocation itself.
pub struct InvocationAudit {
    records: Collection<InvocationRecord>,
}

impl InvocationAudit {
    /// Create an audit sink writing to `collection` on the given store.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the collection name is invalid.
    pub fn new(store: Arc<dyn DocumentStore>, collection: &str) -> StorageResult<Self> {
        Ok(Self {
            records: Collection::new(store, collection)?,
        })
    }

    /// Persist one record for a finished invocation.
    ///
    /// # Errors
    ///
    /// Returns the underlying storage error if the write fails.
    pub async fn record(&self, capability: &str, invocation: &Invocation) -> StorageResult<()> {
        let record = InvocationRecord {
            id: Uuid::new_v4(),
            capability: capability.to_string(),
            success: invocation.is_success(),
            error: invocation.error_code().map(String::from),
            timestamp: Utc::now(),
        };
        self.records.put(&record.id.to_string(), &record).await
    }

    /// Fetch every stored record, oldest first.
    ///
    /// # Errors
    ///
    /// Returns the underlying storage error if a read fails.
    pub async fn all(&self) -> StorageResult<Vec<InvocationRecord>> {
        let mut records = self.records.all().await?;
        records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(records)
    }
}

impl std::fmt::Debug for InvocationAudit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvocationAudit").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CapabilityError;
    use atelier_storage::MemoryDocumentStore;
    use serde_json::json;

    fn audit() -> InvocationAudit {
        let store = Arc::new(MemoryDocumentStore::new());
        InvocationAudit::new(store, "audit_invocations").unwrap()
    }

    #[tokio::test]
    async fn records_success_and_failure() {
        let audit = audit();

        audit
            .record("execute_shell", &Invocation::success(json!({"ok": 1})))
            .await
            .unwrap();
        let error = CapabilityError::Timeout { millis: 100 };
        audit
            .record("execute_shell", &Invocation::failure("execute_shell", &error))
            .await
            .unwrap();

        let records = audit.all().await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].success);
        assert!(records[0].error.is_none());
        assert!(!records[1].success);
        assert_eq!(records[1].error.as_deref(), Some("timeout"));
    }
}
