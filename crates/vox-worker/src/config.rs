//! Worker configuration.

use std::time::Duration;

use crate::error::{WorkerError, WorkerResult};

/// Voice used when neither the message nor the environment names one.
pub const DEFAULT_VOICE: &str = "af_heart";

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Storage prefix artifacts are derived under, e.g. `s3://bucket/out`
    pub output_prefix: String,
    /// Work directory for temporary files
    pub work_dir: String,
    /// Voice applied to jobs that omit one
    pub default_voice: String,
    /// Forward validation failures to the DLQ instead of leaving the
    /// message to the queue's own redrive policy
    pub dlq_on_validation_failure: bool,
    /// Back-off after a receive error
    pub poll_backoff: Duration,
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> WorkerResult<Self> {
        let output_prefix = std::env::var("OUTPUT_PREFIX")
            .map_err(|_| WorkerError::config_error("OUTPUT_PREFIX not set"))?;
        Ok(Self {
            output_prefix,
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/tmp/voxworks".to_string()),
            default_voice: std::env::var("KOKORO_VOICE")
                .unwrap_or_else(|_| DEFAULT_VOICE.to_string()),
            dlq_on_validation_failure: std::env::var("DLQ_ON_VALIDATION_FAILURE")
                .map(|v| v.to_lowercase() == "true")
                .unwrap_or(false),
            poll_backoff: Duration::from_secs(
                std::env::var("POLL_BACKOFF_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Sole test in this binary that touches process environment.
    #[test]
    fn voice_comes_from_env_with_fallback() {
        std::env::set_var("OUTPUT_PREFIX", "s3://bucket/out");

        std::env::remove_var("KOKORO_VOICE");
        let config = WorkerConfig::from_env().unwrap();
        assert_eq!(config.default_voice, DEFAULT_VOICE);

        std::env::set_var("KOKORO_VOICE", "af_bella");
        let config = WorkerConfig::from_env().unwrap();
        assert_eq!(config.default_voice, "af_bella");

        std::env::remove_var("KOKORO_VOICE");
        std::env::remove_var("OUTPUT_PREFIX");
    }
}
