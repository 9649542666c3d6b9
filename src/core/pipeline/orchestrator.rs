//! Pipeline Orchestrator
//!
//! Drives one run through its stages: transcript acquisition, the branch
//! chosen by the run configuration (offline, transcript-only, or full video
//! mode), remote upload/poll/generate when applicable, and the final save.
//! Every remote-stage failure has exactly one fallback path: the local
//! heuristic generator fed by the transcript, when one exists.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use super::{CancelToken, PipelineConfig};
use crate::core::acquire::{self, AlwaysReuse, MediaFetcher, ReuseDecider};
use crate::core::output;
use crate::core::quiz::{self, HeuristicConfig, QuizDocument};
use crate::core::remote::{GenerateInput, RemoteJobClient};
use crate::core::subtitles;
use crate::core::transcode::Transcoder;
use crate::core::{Artifact, ArtifactKind, ContentRef, CoreError, CoreResult};

// =============================================================================
// Stages and Progress
// =============================================================================

/// Pipeline run stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    AcquireTranscript,
    OfflineGenerate,
    TranscriptOnlyRemote,
    AcquireVideo,
    RemoteUpload,
    RemoteGenerate,
    Save,
    Done,
    Cancelled,
    Failed,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Init => "init",
            Stage::AcquireTranscript => "acquire_transcript",
            Stage::OfflineGenerate => "offline_generate",
            Stage::TranscriptOnlyRemote => "transcript_only_remote",
            Stage::AcquireVideo => "acquire_video",
            Stage::RemoteUpload => "remote_upload",
            Stage::RemoteGenerate => "remote_generate",
            Stage::Save => "save",
            Stage::Done => "done",
            Stage::Cancelled => "cancelled",
            Stage::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Progress reporting capability; injected, never global
pub trait ProgressSink: Send + Sync {
    fn stage_changed(&self, stage: Stage);
    fn message(&self, text: &str);
}

/// Default sink that forwards progress to tracing
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn stage_changed(&self, stage: Stage) {
        info!(%stage, "pipeline stage");
    }

    fn message(&self, text: &str) {
        info!("{}", text);
    }
}

// =============================================================================
// Run Report
// =============================================================================

/// Which generator produced the final document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorKind {
    Remote,
    Heuristic,
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub content_id: String,
    pub output_path: PathBuf,
    pub document: QuizDocument,
    pub generator: GeneratorKind,
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Run-local ledger of acquired artifacts, keyed by `(id, kind)`.
/// An entry means acquisition already happened this run; no second fetch.
type ArtifactLedger = HashMap<(String, ArtifactKind), Artifact>;

fn record(ledger: &mut ArtifactLedger, artifact: Artifact) {
    ledger.insert(artifact.key(), artifact);
}

/// Drives a single pipeline run over the injected capabilities
pub struct Orchestrator {
    config: PipelineConfig,
    fetcher: Arc<dyn MediaFetcher>,
    transcoder: Option<Arc<dyn Transcoder>>,
    remote: Option<RemoteJobClient>,
    reuse: Arc<dyn ReuseDecider>,
    sink: Arc<dyn ProgressSink>,
}

impl Orchestrator {
    pub fn new(config: PipelineConfig, fetcher: Arc<dyn MediaFetcher>) -> Self {
        Self {
            config: config.normalize(),
            fetcher,
            transcoder: None,
            remote: None,
            reuse: Arc::new(AlwaysReuse),
            sink: Arc::new(TracingSink),
        }
    }

    pub fn with_transcoder(mut self, transcoder: Arc<dyn Transcoder>) -> Self {
        self.config.transcoder_available = true;
        self.transcoder = Some(transcoder);
        self
    }

    pub fn with_remote(mut self, remote: RemoteJobClient) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn with_reuse_decider(mut self, reuse: Arc<dyn ReuseDecider>) -> Self {
        self.reuse = reuse;
        self
    }

    pub fn with_progress_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    fn set_stage(&self, stage: Stage) {
        self.sink.stage_changed(stage);
    }

    /// Runs the pipeline to completion for one content reference.
    ///
    /// `Err(CoreError::Cancelled)` is a distinct outcome, not a failure; the
    /// caller reports it separately. Partially-acquired artifacts are left
    /// on disk in every outcome so a later run can reuse them.
    pub async fn run(&self, content: &ContentRef, cancel: &CancelToken) -> CoreResult<RunReport> {
        let result = self.run_inner(content, cancel).await;
        match &result {
            Ok(report) => {
                self.set_stage(Stage::Done);
                self.sink.message(&format!(
                    "quiz with {} questions written to {}",
                    report.document.len(),
                    report.output_path.display()
                ));
            }
            Err(e) if e.is_cancelled() => self.set_stage(Stage::Cancelled),
            Err(e) => {
                self.set_stage(Stage::Failed);
                self.sink.message(&format!("run failed: {}", e));
            }
        }
        result
    }

    async fn run_inner(&self, content: &ContentRef, cancel: &CancelToken) -> CoreResult<RunReport> {
        self.set_stage(Stage::Init);
        self.config.validate()?;
        tokio::fs::create_dir_all(&self.config.output_dir).await?;
        let mut ledger = ArtifactLedger::new();

        // Transcript first: the cheapest artifact and the universal fallback
        // fuel for every branch.
        cancel.check()?;
        self.set_stage(Stage::AcquireTranscript);
        let transcript = match self.acquire_transcript(content, &mut ledger).await {
            Ok(t) => t,
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => {
                warn!("transcript acquisition failed: {}", e);
                None
            }
        };

        let (document, generator) = if self.config.offline_mode {
            cancel.check()?;
            self.set_stage(Stage::OfflineGenerate);
            let text = transcript.ok_or(CoreError::NoFallbackMaterial)?;
            (self.heuristic(&text)?, GeneratorKind::Heuristic)
        } else if self.config.transcript_only || !self.config.download_video {
            cancel.check()?;
            self.set_stage(Stage::TranscriptOnlyRemote);
            let text = transcript.ok_or(CoreError::NoFallbackMaterial)?;
            self.generate_from_text(&text, cancel).await?
        } else {
            cancel.check()?;
            self.set_stage(Stage::AcquireVideo);
            match self.acquire_video(content, &mut ledger).await {
                Ok(video) => {
                    self.generate_from_media(
                        content,
                        &video,
                        transcript.as_deref(),
                        &mut ledger,
                        cancel,
                    )
                    .await?
                }
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => match transcript {
                    // Degrade to the transcript-only branch
                    Some(text) => {
                        warn!("video acquisition failed, degrading to transcript: {}", e);
                        self.set_stage(Stage::TranscriptOnlyRemote);
                        self.generate_from_text(&text, cancel).await?
                    }
                    None => return Err(CoreError::NoAcquisitionSucceeded),
                },
            }
        };

        cancel.check()?;
        self.set_stage(Stage::Save);
        let output_path = output::write_quiz(&document, &self.config.output_dir, &content.id).await?;

        Ok(RunReport {
            content_id: content.id.clone(),
            output_path,
            document,
            generator,
        })
    }

    // =========================================================================
    // Acquisition
    // =========================================================================

    /// Acquires the normalized transcript, reusing an on-disk artifact when
    /// the reuse decider accepts it. `None` means the source has no
    /// subtitles; whether that fails the run depends on the branch.
    async fn acquire_transcript(
        &self,
        content: &ContentRef,
        ledger: &mut ArtifactLedger,
    ) -> CoreResult<Option<String>> {
        let dir = &self.config.output_dir;
        let key = (content.id.clone(), ArtifactKind::Transcript);

        if let Some(artifact) = ledger.get(&key) {
            return Ok(Some(tokio::fs::read_to_string(&artifact.path).await?));
        }
        if let Some(existing) = acquire::existing_artifact(dir, &content.id, ArtifactKind::Transcript)
        {
            if self.reuse.reuse_existing(&existing, ArtifactKind::Transcript) {
                info!(path = %existing.display(), "reusing existing transcript");
                let text = tokio::fs::read_to_string(&existing).await?;
                record(
                    ledger,
                    Artifact::new(ArtifactKind::Transcript, existing, content.clone()),
                );
                return Ok(Some(text));
            }
            // Declined: the stale file must not survive next to the re-fetch
            info!(path = %existing.display(), "discarding declined transcript");
            acquire::remove_artifact(dir, &content.id, ArtifactKind::Transcript)?;
        }

        let fetched = self
            .fetcher
            .fetch_subtitles(content, &self.config.subtitle_lang, dir)
            .await?;
        let Some(subs) = fetched else {
            return Ok(None);
        };

        let raw = tokio::fs::read_to_string(&subs.path).await?;
        let title = subs.title.as_deref().unwrap_or(&content.id);
        let normalized = subtitles::normalize_cues(&raw, title);

        let path = acquire::transcript_path(dir, &content.id);
        tokio::fs::write(&path, normalized.as_bytes()).await?;
        record(
            ledger,
            Artifact::new(ArtifactKind::Transcript, path, content.clone()),
        );
        Ok(Some(normalized))
    }

    /// Acquires the video artifact under the configured format constraint
    async fn acquire_video(
        &self,
        content: &ContentRef,
        ledger: &mut ArtifactLedger,
    ) -> CoreResult<PathBuf> {
        let dir = &self.config.output_dir;
        let key = (content.id.clone(), ArtifactKind::Video);

        if let Some(artifact) = ledger.get(&key) {
            return Ok(artifact.path.clone());
        }
        if let Some(existing) = acquire::existing_artifact(dir, &content.id, ArtifactKind::Video) {
            if self.reuse.reuse_existing(&existing, ArtifactKind::Video) {
                info!(path = %existing.display(), "reusing existing video");
                record(
                    ledger,
                    Artifact::new(ArtifactKind::Video, existing.clone(), content.clone()),
                );
                return Ok(existing);
            }
            // Declined: a stale {id}_orig.* under another extension would win
            // later directory scans over the fresh download
            info!(path = %existing.display(), "discarding declined video");
            acquire::remove_artifact(dir, &content.id, ArtifactKind::Video)?;
        }

        let constraint = acquire::video_constraint(&self.config);
        let media = self.fetcher.fetch_media(content, constraint, dir).await?;
        record(
            ledger,
            Artifact::new(ArtifactKind::Video, media.path.clone(), content.clone()),
        );
        Ok(media.path)
    }

    /// Narrows the video to an audio-only derivative when a transcoder is
    /// available. This is an upload-size optimization; failure falls back to
    /// uploading the video itself.
    async fn upload_artifact(
        &self,
        content: &ContentRef,
        video: &Path,
        ledger: &mut ArtifactLedger,
    ) -> PathBuf {
        let Some(transcoder) = &self.transcoder else {
            return video.to_path_buf();
        };
        match transcoder.extract_audio(video).await {
            Ok(audio) => {
                record(
                    ledger,
                    Artifact::new(ArtifactKind::Audio, audio.clone(), content.clone()),
                );
                audio
            }
            Err(e) => {
                warn!("audio extraction failed, uploading video instead: {}", e);
                video.to_path_buf()
            }
        }
    }

    // =========================================================================
    // Generation
    // =========================================================================

    /// Remote generation from transcript text, falling back to the heuristic
    /// generator on any remote failure. This is the single fallback path for
    /// the transcript-only branch.
    async fn generate_from_text(
        &self,
        text: &str,
        cancel: &CancelToken,
    ) -> CoreResult<(QuizDocument, GeneratorKind)> {
        if let Some(client) = self.remote.as_ref().filter(|c| c.is_available()) {
            cancel.check()?;
            let input = GenerateInput::Text(self.bounded(text));
            match self.remote_document(client, &input).await {
                Ok(doc) => return Ok((doc, GeneratorKind::Remote)),
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => warn!("remote generation failed, using local generator: {}", e),
            }
        }
        Ok((self.heuristic(text)?, GeneratorKind::Heuristic))
    }

    /// Remote upload + poll + generation from a media artifact. On any
    /// remote-stage failure, falls back to the heuristic generator when a
    /// transcript exists; otherwise the run fails.
    async fn generate_from_media(
        &self,
        content: &ContentRef,
        video: &Path,
        transcript: Option<&str>,
        ledger: &mut ArtifactLedger,
        cancel: &CancelToken,
    ) -> CoreResult<(QuizDocument, GeneratorKind)> {
        match self
            .remote_from_media(content, video, transcript, ledger, cancel)
            .await
        {
            Ok(doc) => Ok((doc, GeneratorKind::Remote)),
            Err(e) if e.is_cancelled() => Err(e),
            Err(e) => match transcript {
                Some(text) => {
                    warn!("remote stage failed, using local generator: {}", e);
                    Ok((self.heuristic(text)?, GeneratorKind::Heuristic))
                }
                None => {
                    warn!("remote stage failed with no fallback transcript: {}", e);
                    Err(CoreError::RemoteFailedNoFallback)
                }
            },
        }
    }

    async fn remote_from_media(
        &self,
        content: &ContentRef,
        video: &Path,
        transcript: Option<&str>,
        ledger: &mut ArtifactLedger,
        cancel: &CancelToken,
    ) -> CoreResult<QuizDocument> {
        let client = self
            .remote
            .as_ref()
            .filter(|c| c.is_available())
            .ok_or_else(|| {
                CoreError::RemoteUpload("no remote service is configured and available".to_string())
            })?;

        cancel.check()?;
        self.set_stage(Stage::RemoteUpload);
        let artifact = self.upload_artifact(content, video, ledger).await;
        let mut job = client.submit(&artifact).await?;
        let handle = client
            .await_completion(
                &mut job,
                self.config.poll_timeout,
                self.config.poll_interval,
                cancel,
            )
            .await?;

        cancel.check()?;
        self.set_stage(Stage::RemoteGenerate);
        let input = GenerateInput::Media {
            handle,
            auxiliary_text: transcript.map(|t| self.bounded(t)),
        };
        self.remote_document(client, &input).await
    }

    async fn remote_document(
        &self,
        client: &RemoteJobClient,
        input: &GenerateInput,
    ) -> CoreResult<QuizDocument> {
        let text = client.analyze(input, &self.prompt()).await?;
        quiz::parse_remote_quiz(&text)
    }

    fn heuristic(&self, text: &str) -> CoreResult<QuizDocument> {
        let config = HeuristicConfig {
            max_chars: self.config.max_transcript_chars,
            ..HeuristicConfig::default()
        };
        quiz::generate(text, self.config.question_count, &config)
    }

    fn prompt(&self) -> String {
        format!(
            "Create {} quiz questions about the provided content. \
             Write each question on a line starting with \"Q:\" followed by \
             its answer on a line starting with \"A:\". \
             Do not add any other text.",
            self.config.question_count
        )
    }

    /// Bounded transcript prefix sent to the remote service
    fn bounded(&self, text: &str) -> String {
        if text.len() <= self.config.max_transcript_chars {
            text.to_string()
        } else {
            text.chars().take(self.config.max_transcript_chars).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::acquire::MockFetcher;
    use crate::core::remote::{MockRemoteService, RemoteFileState};
    use crate::core::transcode::MockTranscoder;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    const ID: &str = "dQw4w9WgXcQ";

    fn content() -> ContentRef {
        ContentRef::new(format!("https://www.youtube.com/watch?v={}", ID), ID)
    }

    fn config(dir: &Path) -> PipelineConfig {
        PipelineConfig {
            poll_interval: Duration::from_millis(5),
            poll_timeout: Duration::from_secs(5),
            ..PipelineConfig::new(dir)
        }
    }

    // -------------------------------------------------------------------------
    // Offline and fallback branches
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_offline_run_uses_local_generator_only() {
        let dir = tempfile::tempdir().unwrap();
        let remote_service = Arc::new(MockRemoteService::new());
        let orchestrator = Orchestrator::new(
            PipelineConfig {
                offline_mode: true,
                question_count: 5,
                ..config(dir.path())
            },
            Arc::new(MockFetcher::new()),
        )
        .with_remote(RemoteJobClient::new(remote_service.clone()));

        let report = orchestrator.run(&content(), &CancelToken::new()).await.unwrap();

        assert_eq!(report.document.len(), 5);
        assert_eq!(report.generator, GeneratorKind::Heuristic);
        assert!(report.output_path.exists());
        // No remote traffic at all
        assert_eq!(remote_service.upload_calls.load(Ordering::SeqCst), 0);
        assert_eq!(remote_service.generate_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transcript_only_falls_back_on_remote_failure() {
        let dir = tempfile::tempdir().unwrap();
        let remote_service = Arc::new(MockRemoteService::new().with_generation_failure());
        let orchestrator = Orchestrator::new(
            PipelineConfig {
                transcript_only: true,
                ..config(dir.path())
            },
            Arc::new(MockFetcher::new()),
        )
        .with_remote(RemoteJobClient::new(remote_service.clone()));

        let report = orchestrator.run(&content(), &CancelToken::new()).await.unwrap();

        assert_eq!(report.generator, GeneratorKind::Heuristic);
        assert!(!report.document.is_empty());
        assert!(report.output_path.exists());
        assert_eq!(remote_service.generate_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_offline_without_transcript_has_no_fallback_material() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(
            PipelineConfig {
                offline_mode: true,
                ..config(dir.path())
            },
            Arc::new(MockFetcher::new().with_subtitles_available(false)),
        );

        let err = orchestrator.run(&content(), &CancelToken::new()).await.unwrap_err();
        assert!(matches!(err, CoreError::NoFallbackMaterial));
    }

    // -------------------------------------------------------------------------
    // Full mode
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_full_mode_remote_success() {
        let dir = tempfile::tempdir().unwrap();
        let remote_service = Arc::new(MockRemoteService::new().with_generation(
            "Q: First question?\nA: First answer.\nQ: Second question?\nA: Second answer.",
        ));
        let orchestrator = Orchestrator::new(
            PipelineConfig {
                download_video: true,
                ..config(dir.path())
            },
            Arc::new(MockFetcher::new()),
        )
        .with_transcoder(Arc::new(MockTranscoder::new()))
        .with_remote(RemoteJobClient::new(remote_service.clone()));

        let report = orchestrator.run(&content(), &CancelToken::new()).await.unwrap();

        assert_eq!(report.generator, GeneratorKind::Remote);
        assert_eq!(report.document.len(), 2);
        let body = std::fs::read_to_string(&report.output_path).unwrap();
        assert!(body.contains("First question?"));
        // The audio derivative was produced and preferred for upload
        assert!(dir.path().join(format!("{}_audio.mp3", ID)).exists());
        assert_eq!(remote_service.upload_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_full_mode_degrades_to_transcript_when_video_fails() {
        let dir = tempfile::tempdir().unwrap();
        let remote_service = Arc::new(MockRemoteService::new());
        let orchestrator = Orchestrator::new(
            PipelineConfig {
                download_video: true,
                ..config(dir.path())
            },
            Arc::new(MockFetcher::new().with_media_available(false)),
        )
        .with_remote(RemoteJobClient::new(remote_service.clone()));

        let report = orchestrator.run(&content(), &CancelToken::new()).await.unwrap();

        // Remote generation from transcript text, no upload
        assert_eq!(report.generator, GeneratorKind::Remote);
        assert_eq!(remote_service.upload_calls.load(Ordering::SeqCst), 0);
        assert_eq!(remote_service.generate_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_full_mode_both_acquisitions_failing_ends_run() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(
            PipelineConfig {
                download_video: true,
                ..config(dir.path())
            },
            Arc::new(
                MockFetcher::new()
                    .with_media_available(false)
                    .with_subtitles_available(false),
            ),
        )
        .with_remote(RemoteJobClient::new(Arc::new(MockRemoteService::new())));

        let err = orchestrator.run(&content(), &CancelToken::new()).await.unwrap_err();

        assert!(matches!(err, CoreError::NoAcquisitionSucceeded));
        assert!(!output::quiz_path(dir.path(), ID).exists());
    }

    #[tokio::test]
    async fn test_full_mode_failed_state_falls_back_quickly() {
        let dir = tempfile::tempdir().unwrap();
        // Remote processing reaches terminal Failed; the poll loop must not
        // wait out the timeout before falling back
        let remote_service =
            Arc::new(MockRemoteService::new().with_states([RemoteFileState::Failed]));
        let orchestrator = Orchestrator::new(
            PipelineConfig {
                download_video: true,
                poll_timeout: Duration::from_secs(600),
                ..config(dir.path())
            },
            Arc::new(MockFetcher::new()),
        )
        .with_remote(RemoteJobClient::new(remote_service));

        let started = std::time::Instant::now();
        let report = orchestrator.run(&content(), &CancelToken::new()).await.unwrap();

        assert_eq!(report.generator, GeneratorKind::Heuristic);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_full_mode_remote_failure_without_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(
            PipelineConfig {
                download_video: true,
                ..config(dir.path())
            },
            Arc::new(MockFetcher::new().with_subtitles_available(false)),
        )
        .with_remote(RemoteJobClient::new(Arc::new(
            MockRemoteService::new().with_upload_failure(),
        )));

        let err = orchestrator.run(&content(), &CancelToken::new()).await.unwrap_err();
        assert!(matches!(err, CoreError::RemoteFailedNoFallback));
    }

    // -------------------------------------------------------------------------
    // Cancellation
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_cancellation_during_poll_leaves_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        // Processing never terminates; the run will sit in the poll loop
        let remote_service =
            Arc::new(MockRemoteService::new().with_states([RemoteFileState::Processing]));
        let orchestrator = Arc::new(
            Orchestrator::new(
                PipelineConfig {
                    download_video: true,
                    poll_timeout: Duration::from_secs(600),
                    ..config(dir.path())
                },
                Arc::new(MockFetcher::new()),
            )
            .with_remote(RemoteJobClient::new(remote_service)),
        );

        let cancel = CancelToken::new();
        let run = {
            let orchestrator = orchestrator.clone();
            let cancel = cancel.clone();
            let content = content();
            tokio::spawn(async move { orchestrator.run(&content, &cancel).await })
        };

        tokio::time::sleep(Duration::from_millis(30)).await;
        cancel.cancel();
        let err = run.await.unwrap().unwrap_err();

        assert!(matches!(err, CoreError::Cancelled));
        // Partially-acquired artifacts remain for reuse; no output written
        assert!(dir.path().join(format!("{}_orig.mp4", ID)).exists());
        assert!(!output::quiz_path(dir.path(), ID).exists());
    }

    // -------------------------------------------------------------------------
    // Idempotence
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_declined_reuse_discards_stale_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        // Stale downloads from an earlier run, under extensions the fresh
        // fetch will not produce
        let stale_video = dir.path().join(format!("{}_orig.webm", ID));
        std::fs::write(&stale_video, b"stale video").unwrap();
        let stale_transcript = dir.path().join(format!("{}_transcript.txt", ID));
        std::fs::write(&stale_transcript, b"stale transcript").unwrap();

        let fetcher = Arc::new(MockFetcher::new());
        let orchestrator = Orchestrator::new(
            PipelineConfig {
                download_video: true,
                ..config(dir.path())
            },
            fetcher.clone(),
        )
        .with_reuse_decider(Arc::new(crate::core::acquire::NeverReuse))
        .with_remote(RemoteJobClient::new(Arc::new(MockRemoteService::new())));

        let report = orchestrator.run(&content(), &CancelToken::new()).await.unwrap();
        assert_eq!(report.generator, GeneratorKind::Remote);

        // Declined artifacts were removed, not left beside the re-fetch
        assert!(!stale_video.exists());
        assert!(dir.path().join(format!("{}_orig.mp4", ID)).exists());
        assert_eq!(fetcher.media_calls.load(Ordering::SeqCst), 1);
        assert_eq!(fetcher.subtitle_calls.load(Ordering::SeqCst), 1);
        let transcript = std::fs::read_to_string(&stale_transcript).unwrap();
        assert!(!transcript.contains("stale"));
    }

    #[tokio::test]
    async fn test_unavailable_remote_service_uses_local_generator() {
        let dir = tempfile::tempdir().unwrap();
        let remote_service = Arc::new(MockRemoteService::new().with_unavailable());
        let orchestrator = Orchestrator::new(
            PipelineConfig {
                transcript_only: true,
                ..config(dir.path())
            },
            Arc::new(MockFetcher::new()),
        )
        .with_remote(RemoteJobClient::new(remote_service.clone()));

        let report = orchestrator.run(&content(), &CancelToken::new()).await.unwrap();

        assert_eq!(report.generator, GeneratorKind::Heuristic);
        assert_eq!(remote_service.generate_calls.load(Ordering::SeqCst), 0);
        assert_eq!(remote_service.upload_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_second_run_reuses_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(MockFetcher::new());
        let orchestrator = Orchestrator::new(
            PipelineConfig {
                offline_mode: true,
                ..config(dir.path())
            },
            fetcher.clone(),
        );

        orchestrator.run(&content(), &CancelToken::new()).await.unwrap();
        orchestrator.run(&content(), &CancelToken::new()).await.unwrap();

        // The transcript saved by the first run is reused by the second
        assert_eq!(fetcher.subtitle_calls.load(Ordering::SeqCst), 1);
    }
}
