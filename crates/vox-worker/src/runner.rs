//! Worker polling loop.
//!
//! Single dedicated loop, one message at a time end-to-end. Horizontal
//! scaling is more processes against the same queue; the visibility timeout
//! is the only concurrency-control primitive. The loop is the single point
//! deciding acknowledge vs. leave-for-redelivery vs. dead-letter, and it
//! never crashes on a single bad message.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use vox_models::{DeadLetterEntry, JobRecord, TaskStatus};
use vox_queue::{normalize, EnvelopeError, MessageQueue, QueueMessage};
use vox_status::StatusGuard;

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::processor::JobProcessor;

/// The polling loop.
pub struct WorkerLoop {
    config: WorkerConfig,
    queue: Arc<dyn MessageQueue>,
    processor: JobProcessor,
    guard: StatusGuard,
    shutdown: tokio::sync::watch::Sender<bool>,
}

impl WorkerLoop {
    /// Create a new loop.
    pub fn new(
        config: WorkerConfig,
        queue: Arc<dyn MessageQueue>,
        processor: JobProcessor,
        guard: StatusGuard,
    ) -> Self {
        let (shutdown, _) = tokio::sync::watch::channel(false);
        Self {
            config,
            queue,
            processor,
            guard,
            shutdown,
        }
    }

    /// Signal shutdown.
    pub fn shutdown_handle(&self) -> tokio::sync::watch::Sender<bool> {
        self.shutdown.clone()
    }

    /// Run until shutdown is signalled.
    pub async fn run(&self) -> WorkerResult<()> {
        info!("Starting worker loop");
        let mut shutdown_rx = self.shutdown.subscribe();

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping worker loop");
                        break;
                    }
                }
                result = self.poll_once() => {
                    if let Err(e) = result {
                        error!("Error receiving messages: {}", e);
                        tokio::time::sleep(self.config.poll_backoff).await;
                    }
                }
            }
        }

        info!("Worker loop stopped");
        Ok(())
    }

    /// Receive one batch and process it sequentially.
    pub async fn poll_once(&self) -> WorkerResult<()> {
        let messages = self.queue.receive().await?;
        for message in messages {
            self.handle_message(&message).await;
        }
        Ok(())
    }

    /// Process a single message; all failure routing happens here.
    async fn handle_message(&self, message: &QueueMessage) {
        let job = match normalize(&message.body) {
            Ok(job) => job,
            Err(e) => {
                self.handle_validation_failure(message, e).await;
                return;
            }
        };

        match self.processor.process(&job).await {
            Ok(outcome) => {
                info!(parent_id = %job.parent_id, ?outcome, "Acknowledging message");
                if let Err(e) = self.queue.delete(&message.receipt_handle).await {
                    error!("Failed to delete message: {}", e);
                }
            }
            Err(e) => {
                error!(parent_id = %job.parent_id, kind = e.kind(), "Job failed: {}", e);
                self.fail_job(message, Some(&job), &e).await;
            }
        }
    }

    /// Validation failures are not dead-lettered by default: the message is
    /// left to expire and redeliver, or hit the queue's own max-receive
    /// policy. `dlq_on_validation_failure` flips that.
    async fn handle_validation_failure(&self, message: &QueueMessage, e: EnvelopeError) {
        match &e {
            EnvelopeError::MissingFields { missing, present } => {
                warn!(?missing, ?present, "Dropping message with missing fields");
            }
            EnvelopeError::Malformed { reason, .. } => {
                warn!(reason, "Dropping malformed message");
            }
        }

        if self.config.dlq_on_validation_failure {
            self.fail_job(message, None, &WorkerError::Validation(e)).await;
        }
    }

    /// Mark both tasks failed (when identifiers are recoverable), then
    /// best-effort dead-letter and acknowledge. A DLQ send failure is logged
    /// and the message left for redelivery.
    async fn fail_job(&self, message: &QueueMessage, job: Option<&JobRecord>, e: &WorkerError) {
        if let Some(job) = job {
            for task_id in [&job.tts_task_id, &job.srt_task_id] {
                if let Err(status_err) = self
                    .guard
                    .set_status(&job.parent_id, task_id, TaskStatus::Failed, None)
                    .await
                {
                    warn!(parent_id = %job.parent_id, task_id = %task_id,
                        "Failed to mark task failed: {}", status_err);
                }
            }
        }

        let entry = DeadLetterEntry::new(
            message.body.clone(),
            e.to_string(),
            e.kind(),
            message.attempt_count,
        );
        match self.queue.send_dead_letter(&entry).await {
            Ok(()) => {
                if let Err(delete_err) = self.queue.delete(&message.receipt_handle).await {
                    error!("Failed to delete dead-lettered message: {}", delete_err);
                }
            }
            Err(send_err) => {
                error!("Failed to send dead-letter entry: {}", send_err);
            }
        }
    }
}
