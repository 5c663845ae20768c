//! Tiered subtitle generation.
//!
//! Contract: given synthesized audio and the source text, always leave a
//! non-empty SRT file on disk. Tiers are tried in order, crudest last; a
//! tier failure is logged and control falls through, never surfaced as the
//! job's failure. The only error that escapes is the postcondition check
//! (output missing or empty), which is an internal-invariant violation.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use vox_models::{render_srt, SubtitleCue};

use crate::align::ForcedAligner;
use crate::error::{SpeechError, SpeechResult};

/// Subtitle fallback engine.
pub struct SubtitleGenerator {
    aligner: Option<Arc<dyn ForcedAligner>>,
}

impl SubtitleGenerator {
    /// Create an engine with a forced aligner as the first tier.
    pub fn new(aligner: Arc<dyn ForcedAligner>) -> Self {
        Self {
            aligner: Some(aligner),
        }
    }

    /// Create an engine without an aligner; only the naive tiers run.
    pub fn without_aligner() -> Self {
        Self { aligner: None }
    }

    /// Produce an SRT file at `out_path` for the given audio and text.
    ///
    /// `duration_secs` is the total audio duration. Alignment is attempted
    /// only when `use_alignment` is set and the text is non-blank.
    pub async fn generate(
        &self,
        audio_path: &Path,
        text: &str,
        duration_secs: f64,
        use_alignment: bool,
        out_path: &Path,
    ) -> SpeechResult<()> {
        if use_alignment && !text.trim().is_empty() {
            if let Some(aligner) = &self.aligner {
                match self.try_alignment(aligner.as_ref(), audio_path, text, out_path).await {
                    Ok(()) => {
                        debug!("Alignment tier produced subtitles");
                        return self.check_output(out_path);
                    }
                    Err(e) => {
                        warn!("Alignment failed, falling back to naive timing: {}", e);
                    }
                }
            }
        }

        let cues = naive_sentence_cues(text, duration_secs);
        tokio::fs::write(out_path, render_srt(&cues)).await?;

        // Last resort: a single cue spanning the whole audio. Should be
        // unreachable, the naive tier always yields at least one cue.
        if file_is_empty(out_path) {
            let cue = SubtitleCue::new(0.0, duration_secs.max(1.0), text);
            tokio::fs::write(out_path, render_srt(&[cue])).await?;
        }

        self.check_output(out_path)
    }

    /// Run the aligner; empty output counts as failure.
    async fn try_alignment(
        &self,
        aligner: &dyn ForcedAligner,
        audio_path: &Path,
        text: &str,
        out_path: &Path,
    ) -> SpeechResult<()> {
        aligner.align(audio_path, text, out_path).await?;
        if file_is_empty(out_path) {
            return Err(SpeechError::alignment("aligner produced empty output"));
        }
        Ok(())
    }

    /// Postcondition: the output file exists and is non-empty.
    fn check_output(&self, out_path: &Path) -> SpeechResult<()> {
        if file_is_empty(out_path) {
            return Err(SpeechError::SubtitleInvariant(format!(
                "no usable subtitle artifact at {}",
                out_path.display()
            )));
        }
        Ok(())
    }
}

fn file_is_empty(path: &Path) -> bool {
    std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true)
}

/// Split text into sentences on terminal punctuation followed by whitespace.
///
/// No boundary found means the whole text is one sentence.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') && chars.peek().is_some_and(|n| n.is_whitespace()) {
            let sentence = current.trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            current.clear();
        }
    }

    let tail = current.trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }

    if sentences.is_empty() {
        sentences.push(text.trim().to_string());
    }
    sentences
}

/// Proportional per-sentence timing: contiguous windows from 0, each
/// `max(1.0, duration / sentence_count)` long, ends clamped to `duration`.
///
/// A window is never clamped below its start: with more sentences than
/// seconds of audio the tail runs past the audio end instead of collapsing,
/// keeping every cue well-formed and the sequence non-overlapping.
fn naive_sentence_cues(text: &str, duration_secs: f64) -> Vec<SubtitleCue> {
    let sentences = split_sentences(text);
    let per = (duration_secs / sentences.len().max(1) as f64).max(1.0);

    let mut cues = Vec::with_capacity(sentences.len());
    let mut t = 0.0;
    for sentence in sentences {
        let mut end = t + per;
        if t < duration_secs && end > duration_secs {
            end = duration_secs;
        }
        cues.push(SubtitleCue::new(t, end, sentence));
        t = end;
    }
    cues
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;

    struct FailingAligner;

    #[async_trait]
    impl ForcedAligner for FailingAligner {
        async fn align(&self, _audio: &Path, _text: &str, _out: &Path) -> SpeechResult<()> {
            Err(SpeechError::alignment("no aligner installed"))
        }
    }

    struct WritingAligner;

    #[async_trait]
    impl ForcedAligner for WritingAligner {
        async fn align(&self, _audio: &Path, _text: &str, out: &Path) -> SpeechResult<()> {
            std::fs::write(out, "1\n00:00:00,000 --> 00:00:01,000\naligned\n\n")?;
            Ok(())
        }
    }

    struct EmptyOutputAligner;

    #[async_trait]
    impl ForcedAligner for EmptyOutputAligner {
        async fn align(&self, _audio: &Path, _text: &str, out: &Path) -> SpeechResult<()> {
            std::fs::write(out, "")?;
            Ok(())
        }
    }

    #[test]
    fn splits_on_terminal_punctuation() {
        let sentences = split_sentences("Hello world. This is a test! Done? yes");
        assert_eq!(sentences, vec!["Hello world.", "This is a test!", "Done?", "yes"]);
    }

    #[test]
    fn no_boundary_is_one_sentence() {
        assert_eq!(split_sentences("no punctuation here"), vec!["no punctuation here"]);
        // Terminal punctuation at end of text is not a boundary
        assert_eq!(split_sentences("one sentence."), vec!["one sentence."]);
    }

    #[test]
    fn two_sentences_split_duration_evenly() {
        let cues = naive_sentence_cues("Hello world. This is a test.", 10.0);
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].start_sec, 0.0);
        assert_eq!(cues[0].end_sec, 5.0);
        assert_eq!(cues[1].start_sec, 5.0);
        assert_eq!(cues[1].end_sec, 10.0);
    }

    #[test]
    fn per_sentence_duration_has_floor() {
        // 10 sentences in 2 seconds: 1 s floor each, the tail running past
        // the audio end rather than collapsing to zero-length cues.
        let text = "A. B. C. D. E. F. G. H. I. J.";
        let cues = naive_sentence_cues(text, 2.0);
        assert_eq!(cues.len(), 10);
        for (i, cue) in cues.iter().enumerate() {
            assert_eq!(cue.start_sec, i as f64);
            assert_eq!(cue.end_sec, (i + 1) as f64);
        }
    }

    #[test]
    fn cues_are_monotonic_and_well_formed() {
        let cues = naive_sentence_cues("One. Two. Three. Four.", 8.0);
        for pair in cues.windows(2) {
            assert!(pair[0].end_sec <= pair[1].start_sec);
        }
        for cue in &cues {
            assert!(cue.start_sec < cue.end_sec);
        }
    }

    #[tokio::test]
    async fn aligner_failure_falls_back_to_naive() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("subs.srt");
        let engine = SubtitleGenerator::new(Arc::new(FailingAligner));

        engine
            .generate(Path::new("/nonexistent.wav"), "Hello world. Bye.", 4.0, true, &out)
            .await
            .unwrap();

        let srt = std::fs::read_to_string(&out).unwrap();
        assert!(srt.contains("Hello world."));
        assert!(srt.contains("Bye."));
    }

    #[tokio::test]
    async fn successful_alignment_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("subs.srt");
        let engine = SubtitleGenerator::new(Arc::new(WritingAligner));

        engine
            .generate(Path::new("/nonexistent.wav"), "Hello.", 2.0, true, &out)
            .await
            .unwrap();

        assert!(std::fs::read_to_string(&out).unwrap().contains("aligned"));
    }

    #[tokio::test]
    async fn empty_aligner_output_counts_as_failure() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("subs.srt");
        let engine = SubtitleGenerator::new(Arc::new(EmptyOutputAligner));

        engine
            .generate(Path::new("/nonexistent.wav"), "Hello there.", 2.0, true, &out)
            .await
            .unwrap();

        // Naive tier overwrote the empty aligner output
        assert!(std::fs::read_to_string(&out).unwrap().contains("Hello there."));
    }

    #[tokio::test]
    async fn alignment_skipped_when_not_requested() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("subs.srt");
        let engine = SubtitleGenerator::new(Arc::new(WritingAligner));

        engine
            .generate(Path::new("/nonexistent.wav"), "Plain timing.", 2.0, false, &out)
            .await
            .unwrap();

        assert!(!std::fs::read_to_string(&out).unwrap().contains("aligned"));
    }

    #[tokio::test]
    async fn empty_text_still_produces_output() {
        for text in ["", "   "] {
            let dir = tempfile::tempdir().unwrap();
            let out = dir.path().join("subs.srt");
            let engine = SubtitleGenerator::without_aligner();

            engine
                .generate(Path::new("/nonexistent.wav"), text, 3.0, true, &out)
                .await
                .unwrap();

            assert!(std::fs::metadata(&out).unwrap().len() > 0);
        }
    }
}
