//! Status store error types.

use thiserror::Error;

pub type StatusResult<T> = Result<T, StatusError>;

/// Errors from the status store.
///
/// Store errors are always fatal to the current job attempt: the system
/// cannot safely proceed without verifying prior completion, since doing so
/// risks duplicate billable synthesis or duplicate artifact writes.
#[derive(Debug, Error)]
pub enum StatusError {
    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Malformed entry for ({parent_id}, {task_id}): {reason}")]
    MalformedEntry {
        parent_id: String,
        task_id: String,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StatusError {
    pub fn read_failed(msg: impl Into<String>) -> Self {
        Self::ReadFailed(msg.into())
    }

    pub fn write_failed(msg: impl Into<String>) -> Self {
        Self::WriteFailed(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
