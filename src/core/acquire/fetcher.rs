//! Media Fetch Capability
//!
//! Abstracts the external download tool that turns a `ContentRef` into local
//! media and subtitle files. The production implementation shells out to
//! `yt-dlp`; tests use the in-tree mock.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::core::{ContentRef, CoreError, CoreResult};

// =============================================================================
// Capability Types
// =============================================================================

/// Constraint on the media format to acquire.
///
/// Split video+audio streams need a local merge step, so they are only
/// permitted when a transcoder is available; otherwise acquisition is
/// restricted to a single progressive stream at a conservative resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatConstraint {
    /// Best split streams up to `max_height`, merged locally
    MergedStreams { max_height: u32 },
    /// Single progressive stream up to `max_height`, no merge needed
    Progressive { max_height: u32 },
}

impl FormatConstraint {
    /// Format selector in the download tool's syntax
    pub fn selector(&self) -> String {
        match self {
            FormatConstraint::MergedStreams { max_height } => format!(
                "bestvideo[height<={h}]+bestaudio/best[height<={h}]",
                h = max_height
            ),
            FormatConstraint::Progressive { max_height } => {
                format!("best[height<={}][ext=mp4]/best[ext=mp4]", max_height)
            }
        }
    }

    pub fn needs_merge(&self) -> bool {
        matches!(self, FormatConstraint::MergedStreams { .. })
    }
}

/// A fetched media file
#[derive(Debug, Clone)]
pub struct FetchedMedia {
    pub path: PathBuf,
    /// Logical duration when the tool reports it
    pub duration_sec: Option<f64>,
}

/// A fetched raw subtitle file (timestamped cue format)
#[derive(Debug, Clone)]
pub struct FetchedSubtitles {
    pub path: PathBuf,
    /// Content title when the tool reports it
    pub title: Option<String>,
}

/// External acquisition capability
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Fetches media for `content` into `dir` under the given constraint
    async fn fetch_media(
        &self,
        content: &ContentRef,
        constraint: FormatConstraint,
        dir: &Path,
    ) -> CoreResult<FetchedMedia>;

    /// Fetches a raw subtitle file for `content`, or `None` when the source
    /// has no subtitles in the preferred language
    async fn fetch_subtitles(
        &self,
        content: &ContentRef,
        lang: &str,
        dir: &Path,
    ) -> CoreResult<Option<FetchedSubtitles>>;
}

// =============================================================================
// yt-dlp Implementation
// =============================================================================

/// `MediaFetcher` backed by the `yt-dlp` command-line tool
pub struct YtDlpFetcher {
    binary: PathBuf,
}

impl YtDlpFetcher {
    /// Creates a fetcher using `yt-dlp` from PATH
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("yt-dlp"),
        }
    }

    /// Creates a fetcher with an explicit binary path
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    async fn run(&self, args: &[String]) -> CoreResult<String> {
        debug!(?args, "invoking yt-dlp");
        let output = tokio::process::Command::new(&self.binary)
            .args(args)
            .output()
            .await
            .map_err(|e| CoreError::Acquisition(format!("failed to launch yt-dlp: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CoreError::Acquisition(format!(
                "yt-dlp exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl Default for YtDlpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn fetch_media(
        &self,
        content: &ContentRef,
        constraint: FormatConstraint,
        dir: &Path,
    ) -> CoreResult<FetchedMedia> {
        tokio::fs::create_dir_all(dir).await?;

        let mut args: Vec<String> = vec![
            "--quiet".into(),
            "--no-warnings".into(),
            "--no-playlist".into(),
            "--no-simulate".into(),
            "--format".into(),
            constraint.selector(),
            "--paths".into(),
            dir.to_string_lossy().into_owned(),
            "--output".into(),
            format!("{}_orig.%(ext)s", content.id),
            "--print".into(),
            "after_move:filepath".into(),
            "--print".into(),
            "duration".into(),
        ];
        if constraint.needs_merge() {
            args.push("--merge-output-format".into());
            args.push("mp4".into());
        }
        args.push(content.raw_reference.clone());

        let stdout = self.run(&args).await?;

        let mut path: Option<PathBuf> = None;
        let mut duration_sec: Option<f64> = None;
        for line in stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if let Ok(d) = line.parse::<f64>() {
                duration_sec = Some(d);
            } else {
                path = Some(PathBuf::from(line));
            }
        }

        // The tool's printed path is authoritative; fall back to scanning
        // the output template when it is missing.
        let path = match path {
            Some(p) if p.exists() => p,
            _ => scan_for_prefix(dir, &format!("{}_orig.", content.id)).ok_or_else(|| {
                CoreError::Acquisition(format!(
                    "download finished but no file matching {}_orig.* was found",
                    content.id
                ))
            })?,
        };

        info!(path = %path.display(), "media download complete");
        Ok(FetchedMedia { path, duration_sec })
    }

    async fn fetch_subtitles(
        &self,
        content: &ContentRef,
        lang: &str,
        dir: &Path,
    ) -> CoreResult<Option<FetchedSubtitles>> {
        tokio::fs::create_dir_all(dir).await?;

        let args: Vec<String> = vec![
            "--quiet".into(),
            "--no-warnings".into(),
            "--no-playlist".into(),
            "--skip-download".into(),
            "--write-subs".into(),
            "--write-auto-subs".into(),
            "--sub-langs".into(),
            lang.to_string(),
            "--convert-subs".into(),
            "vtt".into(),
            "--paths".into(),
            dir.to_string_lossy().into_owned(),
            "--output".into(),
            format!("{}.%(ext)s", content.id),
            "--print".into(),
            "title".into(),
            content.raw_reference.clone(),
        ];

        let stdout = self.run(&args).await?;
        let title = stdout
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(str::to_string);

        match scan_for_subtitle(dir, &content.id) {
            Some(path) => Ok(Some(FetchedSubtitles { path, title })),
            None => {
                warn!(id = %content.id, lang, "no subtitles available");
                Ok(None)
            }
        }
    }
}

/// Finds a file in `dir` whose name starts with `prefix`
fn scan_for_prefix(dir: &Path, prefix: &str) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let name = entry.file_name();
        if name.to_string_lossy().starts_with(prefix) {
            return Some(entry.path());
        }
    }
    None
}

/// Finds a `.vtt` (or `.srt`) subtitle file for the given content id
fn scan_for_subtitle(dir: &Path, id: &str) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(id) && (name.ends_with(".vtt") || name.ends_with(".srt")) {
            return Some(entry.path());
        }
    }
    None
}

// =============================================================================
// Mock Fetcher for Testing
// =============================================================================

/// Mock fetcher that materializes placeholder files on disk
#[derive(Debug, Default)]
pub struct MockFetcher {
    media_available: bool,
    subtitles_available: bool,
    subtitle_body: String,
    pub media_calls: AtomicU32,
    pub subtitle_calls: AtomicU32,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            media_available: true,
            subtitles_available: true,
            subtitle_body: default_subtitle_body(),
            media_calls: AtomicU32::new(0),
            subtitle_calls: AtomicU32::new(0),
        }
    }

    pub fn with_media_available(mut self, available: bool) -> Self {
        self.media_available = available;
        self
    }

    pub fn with_subtitles_available(mut self, available: bool) -> Self {
        self.subtitles_available = available;
        self
    }

    pub fn with_subtitle_body(mut self, body: impl Into<String>) -> Self {
        self.subtitle_body = body.into();
        self
    }
}

/// Ten qualifying cue lines so the heuristic generator has material
fn default_subtitle_body() -> String {
    let mut body = String::from("WEBVTT\n\n");
    for i in 0..10 {
        body.push_str(&format!(
            "00:00:{:02}.000 --> 00:00:{:02}.000\nCue number {} carries enough words to qualify as a sentence.\n\n",
            i * 2,
            i * 2 + 2,
            i
        ));
    }
    body
}

#[async_trait]
impl MediaFetcher for MockFetcher {
    async fn fetch_media(
        &self,
        content: &ContentRef,
        _constraint: FormatConstraint,
        dir: &Path,
    ) -> CoreResult<FetchedMedia> {
        self.media_calls.fetch_add(1, Ordering::SeqCst);
        if !self.media_available {
            return Err(CoreError::Acquisition("mock: media unavailable".to_string()));
        }

        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(format!("{}_orig.mp4", content.id));
        tokio::fs::write(&path, b"mock video bytes").await?;
        Ok(FetchedMedia {
            path,
            duration_sec: Some(120.0),
        })
    }

    async fn fetch_subtitles(
        &self,
        content: &ContentRef,
        _lang: &str,
        dir: &Path,
    ) -> CoreResult<Option<FetchedSubtitles>> {
        self.subtitle_calls.fetch_add(1, Ordering::SeqCst);
        if !self.subtitles_available {
            return Ok(None);
        }

        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(format!("{}.en.vtt", content.id));
        tokio::fs::write(&path, self.subtitle_body.as_bytes()).await?;
        Ok(Some(FetchedSubtitles {
            path,
            title: Some("Mock Title".to_string()),
        }))
    }
}
