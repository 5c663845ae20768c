//! Status store collaborator and DynamoDB implementation.

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use chrono::{DateTime, Utc};
use tracing::debug;

use vox_models::{TaskStatus, TaskStatusEntry};

use crate::error::{StatusError, StatusResult};

/// Persistent task-status store keyed by `(parent_id, task_id)`.
///
/// Writes are unconditional (no optimistic-concurrency check). The two
/// entries of a job are updated by sequential independent calls; a crash
/// between them leaves one updated and one not. That inconsistency window is
/// part of the contract, not guarded against.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Read an entry. Absence is `Ok(None)`, not an error.
    async fn get(&self, parent_id: &str, task_id: &str) -> StatusResult<Option<TaskStatusEntry>>;

    /// Write status, update timestamp, and optionally the artifact location.
    ///
    /// When `status` is `Completed` the entry is also dropped from the
    /// pending-work secondary index.
    async fn update(
        &self,
        parent_id: &str,
        task_id: &str,
        status: TaskStatus,
        artifact_uri: Option<&str>,
    ) -> StatusResult<()>;
}

/// DynamoDB-backed status store.
///
/// Items carry `parentId` (partition key), `taskId` (sort key), `status`,
/// `updatedAt` (RFC 3339), optionally `artifactUri`, and a sparse `pendingAt`
/// attribute that backs the pending-work index until completion.
#[derive(Clone)]
pub struct DynamoStatusStore {
    client: Client,
    table: String,
}

impl DynamoStatusStore {
    /// Create a new store for the given table.
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    /// Create from environment variables using the shared AWS config loader.
    pub async fn from_env() -> StatusResult<Self> {
        let table = std::env::var("STATUS_TABLE")
            .map_err(|_| StatusError::config_error("STATUS_TABLE not set"))?;
        let sdk_config = aws_config::load_from_env().await;
        Ok(Self::new(Client::new(&sdk_config), table))
    }

    fn parse_entry(
        parent_id: &str,
        task_id: &str,
        item: &std::collections::HashMap<String, AttributeValue>,
    ) -> StatusResult<TaskStatusEntry> {
        let malformed = |reason: &str| StatusError::MalformedEntry {
            parent_id: parent_id.to_string(),
            task_id: task_id.to_string(),
            reason: reason.to_string(),
        };

        let status = match item
            .get("status")
            .and_then(|v| v.as_s().ok())
            .ok_or_else(|| malformed("status attribute missing"))?
            .as_str()
        {
            "pending" => TaskStatus::Pending,
            "in_progress" => TaskStatus::InProgress,
            "completed" => TaskStatus::Completed,
            "failed" => TaskStatus::Failed,
            other => return Err(malformed(&format!("unknown status '{}'", other))),
        };

        let updated_at = item
            .get("updatedAt")
            .and_then(|v| v.as_s().ok())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        let artifact_uri = item
            .get("artifactUri")
            .and_then(|v| v.as_s().ok())
            .cloned();

        Ok(TaskStatusEntry {
            parent_id: parent_id.to_string(),
            task_id: task_id.to_string(),
            status,
            updated_at,
            artifact_uri,
        })
    }
}

#[async_trait]
impl StatusStore for DynamoStatusStore {
    async fn get(&self, parent_id: &str, task_id: &str) -> StatusResult<Option<TaskStatusEntry>> {
        let response = self
            .client
            .get_item()
            .table_name(&self.table)
            .key("parentId", AttributeValue::S(parent_id.to_string()))
            .key("taskId", AttributeValue::S(task_id.to_string()))
            .send()
            .await
            .map_err(|e| StatusError::read_failed(e.to_string()))?;

        match response.item {
            Some(item) => Ok(Some(Self::parse_entry(parent_id, task_id, &item)?)),
            None => Ok(None),
        }
    }

    async fn update(
        &self,
        parent_id: &str,
        task_id: &str,
        status: TaskStatus,
        artifact_uri: Option<&str>,
    ) -> StatusResult<()> {
        // "status" is a DynamoDB reserved word, hence the name alias.
        let mut expression = String::from("SET #s = :s, updatedAt = :t");
        let mut request = self
            .client
            .update_item()
            .table_name(&self.table)
            .key("parentId", AttributeValue::S(parent_id.to_string()))
            .key("taskId", AttributeValue::S(task_id.to_string()))
            .expression_attribute_names("#s", "status")
            .expression_attribute_values(":s", AttributeValue::S(status.as_str().to_string()))
            .expression_attribute_values(":t", AttributeValue::S(Utc::now().to_rfc3339()));

        if let Some(uri) = artifact_uri {
            expression.push_str(", artifactUri = :a");
            request = request.expression_attribute_values(":a", AttributeValue::S(uri.to_string()));
        }

        // Completion drops the item from the pending-work sparse index.
        if status == TaskStatus::Completed {
            expression.push_str(" REMOVE pendingAt");
        }

        request
            .update_expression(expression)
            .send()
            .await
            .map_err(|e| StatusError::write_failed(e.to_string()))?;

        debug!(parent_id, task_id, status = %status, "Updated task status");
        Ok(())
    }
}
