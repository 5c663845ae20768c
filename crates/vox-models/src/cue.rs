//! Subtitle cues and SRT rendering.

use serde::{Deserialize, Serialize};

/// A single timed subtitle cue.
///
/// Invariant: `start_sec < end_sec`. Cues in a sequence are non-overlapping
/// with monotonically non-decreasing start times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleCue {
    /// Cue start, seconds from the beginning of the audio
    pub start_sec: f64,
    /// Cue end, seconds
    pub end_sec: f64,
    /// Cue text
    pub text: String,
}

impl SubtitleCue {
    /// Create a new cue.
    pub fn new(start_sec: f64, end_sec: f64, text: impl Into<String>) -> Self {
        Self {
            start_sec,
            end_sec,
            text: text.into(),
        }
    }
}

/// Format a timestamp as the SRT `HH:MM:SS,mmm` notation.
fn format_timestamp(seconds: f64) -> String {
    // Round to whole milliseconds first so a fractional second that rounds
    // up carries into the seconds field.
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total = total_ms / 1000;
    let s = total % 60;
    let m = (total / 60) % 60;
    let h = total / 3600;
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms)
}

/// Render a cue sequence as an SRT document.
///
/// Sequential 1-based index line, timing line, trimmed text line, blank
/// separator line per cue.
pub fn render_srt(cues: &[SubtitleCue]) -> String {
    let mut lines = Vec::with_capacity(cues.len() * 4);
    for (i, cue) in cues.iter().enumerate() {
        lines.push((i + 1).to_string());
        lines.push(format!(
            "{} --> {}",
            format_timestamp(cue.start_sec),
            format_timestamp(cue.end_sec)
        ));
        lines.push(cue.text.trim().to_string());
        lines.push(String::new());
    }
    lines.join("\n")
}
