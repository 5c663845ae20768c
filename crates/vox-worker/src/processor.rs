//! Job processing orchestration.
//!
//! Fixed step order per job: idempotency check, both tasks to `InProgress`,
//! synthesis, subtitle generation, audio upload, subtitle upload, both tasks
//! to `Completed`. Any error propagates to the worker loop without partial
//! status commits beyond what already happened.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use vox_models::{JobRecord, TaskStatus};
use vox_speech::{concat_chunks, duration_seconds, write_wav, SpeechSynthesizer, SubtitleGenerator};
use vox_status::StatusGuard;
use vox_storage::{BlobStore, S3Uri};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};

/// Result of processing a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Artifacts produced and committed
    Completed,
    /// Audio task already completed; nothing re-done
    Skipped,
}

/// Orchestrates one job end-to-end against the injected collaborators.
pub struct JobProcessor {
    config: WorkerConfig,
    guard: StatusGuard,
    blobs: Arc<dyn BlobStore>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    subtitles: SubtitleGenerator,
}

impl JobProcessor {
    /// Create a new processor.
    pub fn new(
        config: WorkerConfig,
        guard: StatusGuard,
        blobs: Arc<dyn BlobStore>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        subtitles: SubtitleGenerator,
    ) -> Self {
        Self {
            config,
            guard,
            blobs,
            synthesizer,
            subtitles,
        }
    }

    /// Deterministic artifact location for a task, under the output prefix.
    ///
    /// Deterministic naming makes re-upload on retry an overwrite of the
    /// same object, which is safe.
    fn artifact_uri(&self, parent_id: &str, task_id: &str, ext: &str) -> WorkerResult<S3Uri> {
        let uri = format!(
            "{}/{}/{}.{}",
            self.config.output_prefix.trim_end_matches('/'),
            parent_id,
            task_id,
            ext
        );
        S3Uri::parse(&uri).map_err(|e| WorkerError::config_error(e.to_string()))
    }

    /// Process one job.
    pub async fn process(&self, job: &JobRecord) -> WorkerResult<ProcessOutcome> {
        let parent_id = &job.parent_id;

        // Dedup short-circuit for at-least-once redelivery. Runs before any
        // status write: `update` is an unconditional overwrite, so writing
        // `InProgress` first would destroy the `Completed` record this
        // check reads.
        if self.guard.is_completed(parent_id, &job.tts_task_id).await? {
            info!(parent_id, task_id = %job.tts_task_id, "Job already completed, skipping");
            return Ok(ProcessOutcome::Skipped);
        }

        self.guard
            .set_status(parent_id, &job.tts_task_id, TaskStatus::InProgress, None)
            .await?;
        self.guard
            .set_status(parent_id, &job.srt_task_id, TaskStatus::InProgress, None)
            .await?;

        let audio_uri = self.artifact_uri(parent_id, &job.tts_task_id, "wav")?;
        let srt_uri = self.artifact_uri(parent_id, &job.srt_task_id, "srt")?;

        let voice = job.voice.as_deref().unwrap_or(&self.config.default_voice);
        let chunks = self
            .synthesizer
            .synthesize(&job.text, voice, job.speed)
            .await
            .map_err(|e| WorkerError::synthesis(e.to_string()))?;
        let samples = concat_chunks(chunks);
        if samples.is_empty() {
            return Err(WorkerError::synthesis("no audio produced"));
        }
        let duration = duration_seconds(&samples);
        debug!(parent_id, duration, "Synthesis complete");

        tokio::fs::create_dir_all(&self.config.work_dir).await?;
        let work_dir = tempfile::tempdir_in(&self.config.work_dir)?;
        let wav_path: PathBuf = work_dir.path().join("tts.wav");
        let srt_path: PathBuf = work_dir.path().join("subs.srt");

        write_wav(&samples, &wav_path)?;
        self.subtitles
            .generate(&wav_path, &job.text, duration, job.use_alignment, &srt_path)
            .await?;

        // Upload order fixed: audio before subtitles. A failure partway
        // leaves both tasks uncommitted and eligible for reprocessing.
        self.blobs.put(&wav_path, &audio_uri).await?;
        self.blobs.put(&srt_path, &srt_uri).await?;

        self.guard
            .set_status(
                parent_id,
                &job.tts_task_id,
                TaskStatus::Completed,
                Some(&audio_uri.to_string()),
            )
            .await?;
        self.guard
            .set_status(
                parent_id,
                &job.srt_task_id,
                TaskStatus::Completed,
                Some(&srt_uri.to_string()),
            )
            .await?;

        info!(parent_id, audio = %audio_uri, subs = %srt_uri, "Job completed");
        Ok(ProcessOutcome::Completed)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Utc;

    use vox_models::TaskStatusEntry;
    use vox_speech::{SpeechError, SpeechResult};
    use vox_status::{StatusResult, StatusStore};
    use vox_storage::{StorageError, StorageResult};

    pub(crate) fn test_config() -> WorkerConfig {
        WorkerConfig {
            output_prefix: "s3://artifacts/out".to_string(),
            work_dir: std::env::temp_dir()
                .join("voxworks-test")
                .to_string_lossy()
                .into_owned(),
            default_voice: "af_heart".to_string(),
            dlq_on_validation_failure: false,
            poll_backoff: Duration::from_millis(10),
        }
    }

    #[derive(Default)]
    pub(crate) struct MemoryStore {
        pub entries: Mutex<HashMap<(String, String), TaskStatusEntry>>,
    }

    impl MemoryStore {
        pub fn status_of(&self, parent_id: &str, task_id: &str) -> Option<TaskStatus> {
            self.entries
                .lock()
                .unwrap()
                .get(&(parent_id.to_string(), task_id.to_string()))
                .map(|e| e.status)
        }
    }

    #[async_trait]
    impl StatusStore for MemoryStore {
        async fn get(
            &self,
            parent_id: &str,
            task_id: &str,
        ) -> StatusResult<Option<TaskStatusEntry>> {
            Ok(self
                .entries
                .lock()
                .unwrap()
                .get(&(parent_id.to_string(), task_id.to_string()))
                .cloned())
        }

        async fn update(
            &self,
            parent_id: &str,
            task_id: &str,
            status: TaskStatus,
            artifact_uri: Option<&str>,
        ) -> StatusResult<()> {
            self.entries.lock().unwrap().insert(
                (parent_id.to_string(), task_id.to_string()),
                TaskStatusEntry {
                    parent_id: parent_id.to_string(),
                    task_id: task_id.to_string(),
                    status,
                    updated_at: Utc::now(),
                    artifact_uri: artifact_uri.map(String::from),
                },
            );
            Ok(())
        }
    }

    #[derive(Default)]
    pub(crate) struct CountingSynth {
        pub calls: AtomicUsize,
        pub voices: Mutex<Vec<String>>,
        pub empty: bool,
    }

    #[async_trait]
    impl SpeechSynthesizer for CountingSynth {
        async fn synthesize(
            &self,
            _text: &str,
            voice: &str,
            _speed: f64,
        ) -> SpeechResult<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.voices.lock().unwrap().push(voice.to_string());
            if self.empty {
                Ok(vec![])
            } else {
                // Two chunks, one second total
                Ok(vec![vec![0.0; 12_000], vec![0.0; 12_000]])
            }
        }
    }

    /// Blob store that records uploads and can fail on the nth call.
    #[derive(Default)]
    pub(crate) struct RecordingBlobs {
        pub uploads: Mutex<Vec<String>>,
        pub fail_on_call: Option<usize>,
        pub calls: AtomicUsize,
    }

    #[async_trait]
    impl BlobStore for RecordingBlobs {
        async fn put(&self, _path: &Path, uri: &S3Uri) -> StorageResult<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on_call == Some(call) {
                return Err(StorageError::upload_failed("simulated outage"));
            }
            self.uploads.lock().unwrap().push(uri.to_string());
            Ok(())
        }
    }

    struct NeverAligner;

    #[async_trait]
    impl vox_speech::ForcedAligner for NeverAligner {
        async fn align(&self, _audio: &Path, _text: &str, _out: &Path) -> SpeechResult<()> {
            Err(SpeechError::alignment("unavailable"))
        }
    }

    pub(crate) fn processor_with(
        store: Arc<MemoryStore>,
        blobs: Arc<RecordingBlobs>,
        synth: Arc<CountingSynth>,
    ) -> JobProcessor {
        JobProcessor::new(
            test_config(),
            StatusGuard::new(store),
            blobs,
            synth,
            SubtitleGenerator::new(Arc::new(NeverAligner)),
        )
    }

    fn job() -> JobRecord {
        JobRecord::new("Hello world. This is a test.", "story-1", "task-a", "task-s")
            .with_alignment(false)
    }

    #[tokio::test]
    async fn full_run_commits_both_tasks() {
        let store = Arc::new(MemoryStore::default());
        let blobs = Arc::new(RecordingBlobs::default());
        let synth = Arc::new(CountingSynth::default());
        let processor = processor_with(store.clone(), blobs.clone(), synth.clone());

        let outcome = processor.process(&job()).await.unwrap();
        assert_eq!(outcome, ProcessOutcome::Completed);

        assert_eq!(store.status_of("story-1", "task-a"), Some(TaskStatus::Completed));
        assert_eq!(store.status_of("story-1", "task-s"), Some(TaskStatus::Completed));

        // Audio uploaded before subtitles, at deterministic URIs
        let uploads = blobs.uploads.lock().unwrap().clone();
        assert_eq!(
            uploads,
            vec![
                "s3://artifacts/out/story-1/task-a.wav",
                "s3://artifacts/out/story-1/task-s.srt"
            ]
        );

        let entry = store.entries.lock().unwrap()
            [&("story-1".to_string(), "task-a".to_string())]
            .clone();
        assert_eq!(entry.artifact_uri.as_deref(), Some("s3://artifacts/out/story-1/task-a.wav"));
    }

    #[tokio::test]
    async fn completed_job_is_skipped_without_side_effects() {
        let store = Arc::new(MemoryStore::default());
        let blobs = Arc::new(RecordingBlobs::default());
        let synth = Arc::new(CountingSynth::default());
        let processor = processor_with(store.clone(), blobs.clone(), synth.clone());

        let job = job();
        processor.process(&job).await.unwrap();
        assert_eq!(synth.calls.load(Ordering::SeqCst), 1);

        let outcome = processor.process(&job).await.unwrap();
        assert_eq!(outcome, ProcessOutcome::Skipped);

        // Redelivery re-invoked neither synthesis nor upload
        assert_eq!(synth.calls.load(Ordering::SeqCst), 1);
        assert_eq!(blobs.uploads.lock().unwrap().len(), 2);

        // The skip wrote nothing: both tasks still read Completed, not
        // downgraded to InProgress
        assert_eq!(store.status_of("story-1", "task-a"), Some(TaskStatus::Completed));
        assert_eq!(store.status_of("story-1", "task-s"), Some(TaskStatus::Completed));
    }

    #[tokio::test]
    async fn configured_default_voice_applies_when_job_omits_one() {
        let store = Arc::new(MemoryStore::default());
        let blobs = Arc::new(RecordingBlobs::default());
        let synth = Arc::new(CountingSynth::default());
        let mut config = test_config();
        config.default_voice = "af_nova".to_string();
        let processor = JobProcessor::new(
            config,
            StatusGuard::new(store),
            blobs,
            synth.clone(),
            SubtitleGenerator::without_aligner(),
        );

        processor.process(&job()).await.unwrap();
        let explicit = JobRecord::new("Hello.", "story-2", "t2", "s2")
            .with_voice("af_bella")
            .with_alignment(false);
        processor.process(&explicit).await.unwrap();

        // Config default for the omitted voice; message voice wins when set
        assert_eq!(*synth.voices.lock().unwrap(), vec!["af_nova", "af_bella"]);
    }

    #[tokio::test]
    async fn empty_synthesis_output_fails() {
        let store = Arc::new(MemoryStore::default());
        let blobs = Arc::new(RecordingBlobs::default());
        let synth = Arc::new(CountingSynth {
            empty: true,
            ..Default::default()
        });
        let processor = processor_with(store, blobs.clone(), synth);

        let err = processor.process(&job()).await.unwrap_err();
        assert!(matches!(err, WorkerError::Synthesis(_)));
        assert!(blobs.uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn subtitle_upload_failure_leaves_no_completed_commit() {
        let store = Arc::new(MemoryStore::default());
        let blobs = Arc::new(RecordingBlobs {
            fail_on_call: Some(1), // audio succeeds, subtitles fail
            ..Default::default()
        });
        let synth = Arc::new(CountingSynth::default());
        let processor = processor_with(store.clone(), blobs.clone(), synth);

        let err = processor.process(&job()).await.unwrap_err();
        assert!(matches!(err, WorkerError::Upload(_)));

        // Audio artifact exists at its URI but neither task is Completed
        assert_eq!(blobs.uploads.lock().unwrap().len(), 1);
        assert_eq!(store.status_of("story-1", "task-a"), Some(TaskStatus::InProgress));
        assert_eq!(store.status_of("story-1", "task-s"), Some(TaskStatus::InProgress));
    }

    #[tokio::test]
    async fn alignment_failure_still_completes_job() {
        let store = Arc::new(MemoryStore::default());
        let blobs = Arc::new(RecordingBlobs::default());
        let synth = Arc::new(CountingSynth::default());
        let processor = processor_with(store.clone(), blobs, synth);

        // use_alignment = true with an aligner that always fails
        let job = JobRecord::new("Hello world.", "story-2", "t", "s");
        assert!(job.use_alignment);
        processor.process(&job).await.unwrap();

        assert_eq!(store.status_of("story-2", "t"), Some(TaskStatus::Completed));
        assert_eq!(store.status_of("story-2", "s"), Some(TaskStatus::Completed));
    }
}
