//! Transcode Capability
//!
//! Optional external transcoder used to narrow a video artifact to an
//! audio-only derivative before upload, reducing upload size. Absence of the
//! tool never aborts the pipeline; it only disables this optimization and
//! restricts video acquisition to progressive streams.

use std::path::{Path, PathBuf};
use std::process::Command;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::core::{CoreError, CoreResult};

// =============================================================================
// Detection
// =============================================================================

/// Locates an ffmpeg binary on the system, checking common install locations
/// before falling back to a PATH search.
pub fn detect_ffmpeg() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    let binary_name = "ffmpeg.exe";

    #[cfg(not(target_os = "windows"))]
    let binary_name = "ffmpeg";

    for dir in common_ffmpeg_paths() {
        let candidate = dir.join(binary_name);
        if candidate.exists() {
            return Some(candidate);
        }
    }

    #[cfg(target_os = "windows")]
    let which_cmd = "where";

    #[cfg(not(target_os = "windows"))]
    let which_cmd = "which";

    let output = Command::new(which_cmd).arg("ffmpeg").output().ok()?;
    if output.status.success() {
        let path_str = String::from_utf8_lossy(&output.stdout);
        if let Some(first_line) = path_str.lines().next() {
            let trimmed = first_line.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
    }

    None
}

fn common_ffmpeg_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    #[cfg(target_os = "windows")]
    {
        paths.push(PathBuf::from(r"C:\ffmpeg\bin"));
        paths.push(PathBuf::from(r"C:\Program Files\ffmpeg\bin"));
    }

    #[cfg(target_os = "macos")]
    {
        paths.push(PathBuf::from("/opt/homebrew/bin"));
        paths.push(PathBuf::from("/usr/local/bin"));
    }

    #[cfg(target_os = "linux")]
    {
        paths.push(PathBuf::from("/usr/bin"));
        paths.push(PathBuf::from("/usr/local/bin"));
        paths.push(PathBuf::from("/snap/bin"));
    }

    paths
}

// =============================================================================
// Capability Trait
// =============================================================================

/// External transcoding capability
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Produces an audio-only derivative of `video`, or fails
    async fn extract_audio(&self, video: &Path) -> CoreResult<PathBuf>;
}

/// FFmpeg-backed transcoder
pub struct FfmpegTranscoder {
    binary: PathBuf,
}

impl FfmpegTranscoder {
    /// Creates a transcoder when ffmpeg can be located
    pub fn detect() -> Option<Self> {
        let binary = detect_ffmpeg()?;
        info!(path = %binary.display(), "ffmpeg detected");
        Some(Self { binary })
    }

    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Audio derivative path for a video artifact: `{stem}_audio.mp3`, with a
    /// trailing `_orig` marker replaced
    fn audio_path_for(video: &Path) -> PathBuf {
        let stem = video
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let base = stem.strip_suffix("_orig").unwrap_or(&stem);
        video.with_file_name(format!("{}_audio.mp3", base))
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn extract_audio(&self, video: &Path) -> CoreResult<PathBuf> {
        if !video.exists() {
            return Err(CoreError::Transcode(format!(
                "input file does not exist: {}",
                video.display()
            )));
        }

        let audio_path = Self::audio_path_for(video);
        if audio_path.exists() {
            info!(path = %audio_path.display(), "reusing existing audio derivative");
            return Ok(audio_path);
        }

        let output = tokio::process::Command::new(&self.binary)
            .args([
                "-y",
                "-i",
                &video.to_string_lossy(),
                "-vn",
                "-acodec",
                "libmp3lame",
                "-q:a",
                "7",
                &audio_path.to_string_lossy(),
            ])
            .output()
            .await
            .map_err(|e| CoreError::Transcode(format!("failed to launch ffmpeg: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("ffmpeg audio extraction failed: {}", stderr.trim());
            return Err(CoreError::Transcode(format!(
                "ffmpeg exited with {}",
                output.status
            )));
        }

        info!(path = %audio_path.display(), "audio derivative created");
        Ok(audio_path)
    }
}

// =============================================================================
// Mock Transcoder for Testing
// =============================================================================

/// Mock transcoder that writes a placeholder audio file
#[derive(Debug, Default)]
pub struct MockTranscoder {
    fail: bool,
}

impl MockTranscoder {
    pub fn new() -> Self {
        Self { fail: false }
    }

    pub fn failing() -> Self {
        Self { fail: true }
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    async fn extract_audio(&self, video: &Path) -> CoreResult<PathBuf> {
        if self.fail {
            return Err(CoreError::Transcode("mock: transcode failed".to_string()));
        }
        let audio_path = FfmpegTranscoder::audio_path_for(video);
        tokio::fs::write(&audio_path, b"mock audio bytes").await?;
        Ok(audio_path)
    }
}
