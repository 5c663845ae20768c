//! Speech synthesis, forced alignment, and subtitle generation.
//!
//! This crate provides:
//! - The `SpeechSynthesizer` collaborator seam (PCM chunks at 24 kHz)
//! - WAV assembly from PCM chunks
//! - The `ForcedAligner` collaborator seam (treated as unreliable)
//! - The tiered subtitle fallback engine

pub mod align;
pub mod audio;
pub mod error;
pub mod subtitles;
pub mod synth;

pub use align::{CommandAligner, ForcedAligner};
pub use audio::{concat_chunks, duration_seconds, write_wav, SAMPLE_RATE};
pub use error::{SpeechError, SpeechResult};
pub use subtitles::SubtitleGenerator;
pub use synth::{HttpSynthesizer, SpeechSynthesizer};
