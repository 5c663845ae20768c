//! Idempotency guard over the status store.

use std::sync::Arc;

use tracing::debug;

use vox_models::TaskStatus;

use crate::error::StatusResult;
use crate::store::StatusStore;

/// Read-before-write idempotency check and status-transition writer.
///
/// The guard is the sole correctness mechanism against duplicate delivery:
/// it protects completed work only, not two workers concurrently mid-flight
/// on the same job (the visibility timeout bounds that race).
#[derive(Clone)]
pub struct StatusGuard {
    store: Arc<dyn StatusStore>,
}

impl StatusGuard {
    /// Create a guard over a store.
    pub fn new(store: Arc<dyn StatusStore>) -> Self {
        Self { store }
    }

    /// True only if the entry exists with status `Completed`.
    ///
    /// Absence or any other status is false. Store errors propagate: prior
    /// completion cannot be assumed unverifiable-but-absent.
    pub async fn is_completed(&self, parent_id: &str, task_id: &str) -> StatusResult<bool> {
        let entry = self.store.get(parent_id, task_id).await?;
        let completed = entry.map(|e| e.is_completed()).unwrap_or(false);
        debug!(parent_id, task_id, completed, "Idempotency check");
        Ok(completed)
    }

    /// Write a status transition, optionally with the artifact location.
    pub async fn set_status(
        &self,
        parent_id: &str,
        task_id: &str,
        status: TaskStatus,
        artifact_uri: Option<&str>,
    ) -> StatusResult<()> {
        self.store
            .update(parent_id, task_id, status, artifact_uri)
            .await
    }
}
