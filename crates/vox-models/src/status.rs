//! Per-task status entries.
//!
//! Each job owns two entries keyed by `(parent_id, task_id)`: one for the
//! audio task and one for the subtitle task. The two are updated in lockstep
//! but as independent records with no transactional coupling, so they can
//! transiently disagree (audio `Completed`, subtitle `Failed`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Task processing status.
///
/// Lifecycle per task id: `Pending -> InProgress -> {Completed, Failed}`.
/// `InProgress` may be re-entered on redelivery; only `Completed` is
/// terminal and checked for the idempotent skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created externally before the job is enqueued
    #[default]
    Pending,
    /// A worker has picked up the job
    InProgress,
    /// Artifact uploaded, entry carries its URI
    Completed,
    /// Unrecoverable error
    Failed,
}

impl TaskStatus {
    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    /// Check if this status counts as terminal for the idempotency check.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted status entry for one task of a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusEntry {
    /// Parent entity id (first half of the composite key)
    pub parent_id: String,
    /// Task id (second half of the composite key)
    pub task_id: String,
    /// Current status
    pub status: TaskStatus,
    /// When the entry was last written
    pub updated_at: DateTime<Utc>,
    /// Artifact location, set when status is `Completed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_uri: Option<String>,
}

impl TaskStatusEntry {
    /// Create a new entry in the `Pending` state.
    pub fn new(parent_id: impl Into<String>, task_id: impl Into<String>) -> Self {
        Self {
            parent_id: parent_id.into(),
            task_id: task_id.into(),
            status: TaskStatus::Pending,
            updated_at: Utc::now(),
            artifact_uri: None,
        }
    }

    /// Check if the entry is completed.
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}
