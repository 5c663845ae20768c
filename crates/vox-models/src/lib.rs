//! Shared data models for the voxworks backend.
//!
//! This crate provides Serde-serializable types for:
//! - Job records (the canonical unit of work)
//! - Per-task status entries
//! - Subtitle cues and SRT rendering
//! - Dead-letter entries

pub mod cue;
pub mod dead_letter;
pub mod job;
pub mod status;

// Re-export common types
pub use cue::{render_srt, SubtitleCue};
pub use dead_letter::DeadLetterEntry;
pub use job::JobRecord;
pub use status::{TaskStatus, TaskStatusEntry};
