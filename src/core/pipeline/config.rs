//! Pipeline Run Configuration
//!
//! All run-level toggles collapse into one immutable struct handed to the
//! orchestrator at start. Front-ends (CLI here) are pure producers of this
//! struct and hold no pipeline state of their own.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{CoreError, CoreResult};

/// Default question count per run
pub const DEFAULT_QUESTION_COUNT: usize = 5;

/// Default cap on transcript characters fed to generators
pub const DEFAULT_MAX_TRANSCRIPT_CHARS: usize = 12_000;

/// Default remote poll interval (seconds)
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Default remote poll timeout (seconds)
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 600;

/// Default maximum video height requested from the fetcher
pub const DEFAULT_MAX_VIDEO_HEIGHT: u32 = 360;

/// Configuration for a single pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Acquire the full video artifact (full mode)
    pub download_video: bool,
    /// Use only the transcript; no media acquisition or upload
    pub transcript_only: bool,
    /// Never contact the remote service; heuristic generation only
    pub offline_mode: bool,
    /// Number of questions requested
    pub question_count: usize,
    /// Directory artifacts and the quiz document are written to
    pub output_dir: PathBuf,
    /// Whether a local transcoder (ffmpeg) was detected
    pub transcoder_available: bool,
    /// Resolution cap for video acquisition
    pub max_video_height: u32,
    /// Fixed interval between remote state polls
    pub poll_interval: Duration,
    /// Total time budget for the remote poll loop
    pub poll_timeout: Duration,
    /// Transcript prefix length fed to generators
    pub max_transcript_chars: usize,
    /// Preferred subtitle language code
    pub subtitle_lang: String,
}

impl PipelineConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            download_video: false,
            transcript_only: false,
            offline_mode: false,
            question_count: DEFAULT_QUESTION_COUNT,
            output_dir: output_dir.into(),
            transcoder_available: false,
            max_video_height: DEFAULT_MAX_VIDEO_HEIGHT,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            poll_timeout: Duration::from_secs(DEFAULT_POLL_TIMEOUT_SECS),
            max_transcript_chars: DEFAULT_MAX_TRANSCRIPT_CHARS,
            subtitle_lang: "en".to_string(),
        }
    }

    /// Resolves flag interactions. Transcript-only runs never acquire video,
    /// whatever the video toggle says.
    pub fn normalize(mut self) -> Self {
        if self.transcript_only {
            self.download_video = false;
        }
        self
    }

    /// Validates run parameters
    pub fn validate(&self) -> CoreResult<()> {
        if self.question_count < 1 {
            return Err(CoreError::Validation(
                "question count must be at least 1".to_string(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(CoreError::Validation(
                "poll interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
