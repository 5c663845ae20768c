//! Forced-alignment collaborator.

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{SpeechError, SpeechResult};

/// Forced-alignment collaborator seam.
///
/// Maps spoken-audio timing onto a known transcript, producing an SRT file
/// at `srt_out`. Treated as unreliable: any error is absorbed by the
/// subtitle fallback chain, never surfaced as the job's failure.
#[async_trait]
pub trait ForcedAligner: Send + Sync {
    /// Align `text` against the audio at `audio_path`, writing SRT to `srt_out`.
    async fn align(&self, audio_path: &Path, text: &str, srt_out: &Path) -> SpeechResult<()>;
}

/// Aligner that shells out to an aeneas-style CLI.
///
/// The command receives the audio path, a transcript file, and the SRT
/// output path as positional arguments.
pub struct CommandAligner {
    program: String,
}

impl CommandAligner {
    /// Create an aligner for the given program.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Create from environment variables (`ALIGNER_BIN`, default `aeneas-align`).
    pub fn from_env() -> Self {
        Self::new(std::env::var("ALIGNER_BIN").unwrap_or_else(|_| "aeneas-align".to_string()))
    }
}

#[async_trait]
impl ForcedAligner for CommandAligner {
    async fn align(&self, audio_path: &Path, text: &str, srt_out: &Path) -> SpeechResult<()> {
        let dir = tempfile::tempdir().map_err(SpeechError::Io)?;
        let transcript = dir.path().join("script.txt");
        tokio::fs::write(&transcript, text).await?;

        debug!(program = %self.program, audio = %audio_path.display(), "Running aligner");

        let output = Command::new(&self.program)
            .arg(audio_path)
            .arg(&transcript)
            .arg(srt_out)
            .output()
            .await
            .map_err(|e| SpeechError::alignment(format!("failed to spawn aligner: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SpeechError::alignment(format!(
                "aligner exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}
