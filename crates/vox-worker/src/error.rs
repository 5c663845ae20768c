//! Worker error types.

use thiserror::Error;

use vox_queue::EnvelopeError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    /// Malformed or incomplete input. Not dead-lettered by default; the
    /// message is left for natural redelivery and the queue's redrive policy.
    #[error("Validation failed: {0}")]
    Validation(#[from] EnvelopeError),

    /// Synthesis produced no audio.
    #[error("Synthesis failed: {0}")]
    Synthesis(String),

    /// Status store failure. Always fatal to the attempt, never assumed
    /// benign: the idempotency check cannot be skipped.
    #[error("Status store error: {0}")]
    Status(#[from] vox_status::StatusError),

    /// Speech engine failure that escaped the fallback chain (the subtitle
    /// output invariant); alignment failures are absorbed before this.
    #[error("Speech engine error: {0}")]
    Speech(#[from] vox_speech::SpeechError),

    #[error("Upload failed: {0}")]
    Upload(#[from] vox_storage::StorageError),

    #[error("Queue error: {0}")]
    Queue(#[from] vox_queue::QueueError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn synthesis(msg: impl Into<String>) -> Self {
        Self::Synthesis(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Check if this is a validation failure (left for redelivery).
    pub fn is_validation(&self) -> bool {
        matches!(self, WorkerError::Validation(_))
    }

    /// Stable classification string recorded as the DLQ entry's error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerError::Validation(_) => "validation",
            WorkerError::Synthesis(_) => "synthesis",
            WorkerError::Status(_) => "status_store",
            WorkerError::Speech(_) => "speech",
            WorkerError::Upload(_) => "upload",
            WorkerError::Queue(_) => "queue",
            WorkerError::ConfigError(_) => "config",
            WorkerError::Io(_) => "io",
        }
    }
}
