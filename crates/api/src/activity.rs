//! Best-effort activity recording.
//!
//! The recorder's contract is visible in its signature: [`ActivityRecorder::record`]
//! returns `()`. A failed append is logged at warn level and swallowed --
//! the audit trail never fails or rolls back the mutation that triggered it.

use std::sync::Arc;

use atelier_core::activity::ActivityEntry;
use atelier_core::types::Id;
use atelier_store::Store;

/// Appends audit entries after state-changing operations.
#[derive(Clone)]
pub struct ActivityRecorder {
    store: Arc<dyn Store>,
}

impl ActivityRecorder {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Append one audit entry. Never fails; runs after the primary mutation
    /// has already succeeded.
    pub async fn record(
        &self,
        project: Id,
        actor: Option<Id>,
        kind: &str,
        message: String,
        meta: serde_json::Value,
    ) {
        let entry = ActivityEntry::new(project, actor, kind, message, meta);
        if let Err(err) = self.store.insert_activity(&entry).await {
            tracing::warn!(
                project_id = %project,
                kind,
                error = %err,
                "Failed to record activity"
            );
        }
    }
}
