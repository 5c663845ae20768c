//! Job record types.

use serde::{Deserialize, Serialize};

fn default_speed() -> f64 {
    1.0
}

fn default_use_alignment() -> bool {
    true
}

/// The canonical unit of work after envelope normalization.
///
/// Two status entries exist per job: one keyed by `tts_task_id` for the
/// audio artifact and one keyed by `srt_task_id` for the subtitle artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    /// Text to synthesize
    pub text: String,
    /// Parent entity the two tasks belong to
    pub parent_id: String,
    /// Task id for the audio artifact
    pub tts_task_id: String,
    /// Task id for the subtitle artifact
    pub srt_task_id: String,
    /// Voice to synthesize with; absent means the worker's configured
    /// default applies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    /// Playback speed multiplier
    #[serde(default = "default_speed")]
    pub speed: f64,
    /// Whether to attempt forced alignment for subtitle timing
    #[serde(default = "default_use_alignment")]
    pub use_alignment: bool,
}

impl JobRecord {
    /// Create a new job record with default voice settings.
    pub fn new(
        text: impl Into<String>,
        parent_id: impl Into<String>,
        tts_task_id: impl Into<String>,
        srt_task_id: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            parent_id: parent_id.into(),
            tts_task_id: tts_task_id.into(),
            srt_task_id: srt_task_id.into(),
            voice: None,
            speed: default_speed(),
            use_alignment: default_use_alignment(),
        }
    }

    /// Set the voice.
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    /// Set the speed multiplier.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    /// Set whether forced alignment is attempted.
    pub fn with_alignment(mut self, use_alignment: bool) -> Self {
        self.use_alignment = use_alignment;
        self
    }
}
