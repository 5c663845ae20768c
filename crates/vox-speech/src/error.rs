//! Speech engine error types.

use thiserror::Error;

pub type SpeechResult<T> = Result<T, SpeechError>;

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Synthesis failed: {0}")]
    Synthesis(String),

    #[error("Alignment failed: {0}")]
    Alignment(String),

    /// The subtitle engine's postcondition was violated: it returned without
    /// leaving a usable artifact on disk. Internal invariant, never expected
    /// in normal operation.
    #[error("Subtitle output invariant violated: {0}")]
    SubtitleInvariant(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpeechError {
    pub fn synthesis(msg: impl Into<String>) -> Self {
        Self::Synthesis(msg.into())
    }

    pub fn alignment(msg: impl Into<String>) -> Self {
        Self::Alignment(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
