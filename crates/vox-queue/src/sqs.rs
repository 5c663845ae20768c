//! SQS message queue client.

use async_trait::async_trait;
use aws_sdk_sqs::types::MessageSystemAttributeName;
use aws_sdk_sqs::Client;
use tracing::{debug, info, warn};

use vox_models::DeadLetterEntry;

use crate::error::{QueueError, QueueResult};

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Source queue URL
    pub queue_url: String,
    /// Dead-letter queue URL; derived from the queue URL when not configured
    pub dlq_url: String,
    /// Max messages per receive call
    pub max_messages: i32,
    /// Long-poll wait per receive call, seconds
    pub wait_time_secs: i32,
    /// Visibility timeout per received message, seconds.
    /// Sized to exceed worst-case processing time (synthesis + alignment +
    /// upload); expiry mid-flight makes the message redeliverable.
    pub visibility_timeout_secs: i32,
}

impl QueueConfig {
    /// Create config from environment variables.
    pub fn from_env() -> QueueResult<Self> {
        let queue_url = std::env::var("QUEUE_URL")
            .map_err(|_| QueueError::config_error("QUEUE_URL not set"))?;
        let dlq_url =
            std::env::var("DLQ_URL").unwrap_or_else(|_| format!("{}-dlq", queue_url));
        Ok(Self {
            queue_url,
            dlq_url,
            max_messages: std::env::var("SQS_MAX_MESSAGES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            wait_time_secs: std::env::var("SQS_WAIT_TIME")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(20),
            visibility_timeout_secs: std::env::var("SQS_VISIBILITY_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(300),
        })
    }
}

/// A received message awaiting acknowledgement.
#[derive(Debug, Clone)]
pub struct QueueMessage {
    /// Opaque handle used to delete (acknowledge) the message
    pub receipt_handle: String,
    /// Raw message body
    pub body: String,
    /// How many times the queue has delivered this message
    pub attempt_count: u32,
}

/// Message queue collaborator seam.
///
/// At-least-once delivery; the visibility timeout is the only concurrency
/// control between workers sharing a queue.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Long-poll for messages.
    async fn receive(&self) -> QueueResult<Vec<QueueMessage>>;

    /// Delete (acknowledge) a message.
    async fn delete(&self, receipt_handle: &str) -> QueueResult<()>;

    /// Send a body to an arbitrary queue URL.
    async fn send(&self, queue_url: &str, body: &str) -> QueueResult<()>;

    /// Serialize and send a dead-letter entry to the configured DLQ.
    async fn send_dead_letter(&self, entry: &DeadLetterEntry) -> QueueResult<()>;
}

/// SQS-backed queue client.
#[derive(Clone)]
pub struct SqsQueue {
    client: Client,
    config: QueueConfig,
}

impl SqsQueue {
    /// Create a new queue client.
    pub fn new(client: Client, config: QueueConfig) -> Self {
        Self { client, config }
    }

    /// Create from environment variables using the shared AWS config loader.
    pub async fn from_env() -> QueueResult<Self> {
        let config = QueueConfig::from_env()?;
        let sdk_config = aws_config::load_from_env().await;
        Ok(Self::new(Client::new(&sdk_config), config))
    }

    /// The configured dead-letter queue URL.
    pub fn dlq_url(&self) -> &str {
        &self.config.dlq_url
    }
}

#[async_trait]
impl MessageQueue for SqsQueue {
    async fn receive(&self) -> QueueResult<Vec<QueueMessage>> {
        let response = self
            .client
            .receive_message()
            .queue_url(&self.config.queue_url)
            .max_number_of_messages(self.config.max_messages)
            .wait_time_seconds(self.config.wait_time_secs)
            .visibility_timeout(self.config.visibility_timeout_secs)
            .message_system_attribute_names(MessageSystemAttributeName::ApproximateReceiveCount)
            .send()
            .await
            .map_err(|e| QueueError::receive_failed(e.to_string()))?;

        let mut messages = Vec::new();
        for message in response.messages.unwrap_or_default() {
            let (Some(receipt_handle), Some(body)) = (message.receipt_handle, message.body)
            else {
                warn!("Received SQS message without receipt handle or body, skipping");
                continue;
            };
            let attempt_count = message
                .attributes
                .as_ref()
                .and_then(|attrs| attrs.get(&MessageSystemAttributeName::ApproximateReceiveCount))
                .and_then(|count| count.parse().ok())
                .unwrap_or(1);
            messages.push(QueueMessage {
                receipt_handle,
                body,
                attempt_count,
            });
        }

        debug!("Received {} messages", messages.len());
        Ok(messages)
    }

    async fn delete(&self, receipt_handle: &str) -> QueueResult<()> {
        self.client
            .delete_message()
            .queue_url(&self.config.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|e| QueueError::delete_failed(e.to_string()))?;

        debug!("Deleted message");
        Ok(())
    }

    async fn send(&self, queue_url: &str, body: &str) -> QueueResult<()> {
        self.client
            .send_message()
            .queue_url(queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| QueueError::send_failed(e.to_string()))?;

        Ok(())
    }

    async fn send_dead_letter(&self, entry: &DeadLetterEntry) -> QueueResult<()> {
        let body = serde_json::to_string(entry)?;
        self.send(&self.config.dlq_url, &body).await?;
        info!(
            error_kind = %entry.error_kind,
            attempts = entry.attempt_count,
            "Sent dead-letter entry"
        );
        Ok(())
    }
}
