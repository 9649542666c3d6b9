//! Acquisition Strategy
//!
//! Decides which artifacts (transcript / audio / video) to fetch given the
//! run configuration and tool availability, and where each artifact lives on
//! disk. Acquisition is idempotent: an existing artifact for `(id, kind)` is
//! offered for reuse; the caller decides reuse vs re-fetch.

mod fetcher;

pub use fetcher::{
    FetchedMedia, FetchedSubtitles, FormatConstraint, MediaFetcher, MockFetcher, YtDlpFetcher,
};

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::pipeline::PipelineConfig;
use crate::core::ArtifactKind;

/// Conservative cap for progressive single-stream downloads, avoiding the
/// need for a local merge step
pub const PROGRESSIVE_MAX_HEIGHT: u32 = 360;

/// One entry of an acquisition plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedArtifact {
    pub kind: ArtifactKind,
    /// Whether failing to acquire this artifact fails the stage (best-effort
    /// artifacts only log)
    pub required: bool,
}

/// Builds the acquisition plan for a run. Evaluated once per run.
pub fn plan(config: &PipelineConfig) -> Vec<PlannedArtifact> {
    let plan = if config.transcript_only || config.offline_mode {
        // Video/audio are never needed when no media upload will happen
        vec![PlannedArtifact {
            kind: ArtifactKind::Transcript,
            required: true,
        }]
    } else {
        let mut entries = vec![PlannedArtifact {
            kind: ArtifactKind::Transcript,
            required: false,
        }];
        if config.download_video {
            entries.push(PlannedArtifact {
                kind: ArtifactKind::Video,
                required: true,
            });
        }
        entries
    };

    debug!(?plan, "acquisition plan");
    plan
}

/// Format constraint for video acquisition under this configuration
pub fn video_constraint(config: &PipelineConfig) -> FormatConstraint {
    if config.transcoder_available {
        FormatConstraint::MergedStreams {
            max_height: config.max_video_height,
        }
    } else {
        FormatConstraint::Progressive {
            max_height: config.max_video_height.min(PROGRESSIVE_MAX_HEIGHT),
        }
    }
}

/// Deterministic on-disk location prefix for an artifact kind
pub fn existing_artifact(dir: &Path, id: &str, kind: ArtifactKind) -> Option<PathBuf> {
    match kind {
        ArtifactKind::Video => scan_prefix(dir, &format!("{}_orig.", id)),
        ArtifactKind::Audio => {
            let path = dir.join(format!("{}_audio.mp3", id));
            path.exists().then_some(path)
        }
        ArtifactKind::Transcript => {
            let path = transcript_path(dir, id);
            path.exists().then_some(path)
        }
    }
}

/// Path where the normalized transcript for `id` is stored
pub fn transcript_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("{}_transcript.txt", id))
}

/// Removes every on-disk artifact file for `(id, kind)`.
///
/// Called when reuse is declined: the replacement download may land under a
/// different extension, and a stale `{id}_orig.*` sibling would win later
/// directory scans.
pub fn remove_artifact(dir: &Path, id: &str, kind: ArtifactKind) -> std::io::Result<()> {
    while let Some(path) = existing_artifact(dir, id, kind) {
        debug!(path = %path.display(), "removing declined artifact");
        std::fs::remove_file(&path)?;
    }
    Ok(())
}

fn scan_prefix(dir: &Path, prefix: &str) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        if entry.file_name().to_string_lossy().starts_with(prefix) {
            return Some(entry.path());
        }
    }
    None
}

// =============================================================================
// Reuse Capability
// =============================================================================

/// Confirmation capability for reusing artifacts already on disk.
///
/// Interactive front-ends ask the user; headless runs decide by policy.
pub trait ReuseDecider: Send + Sync {
    fn reuse_existing(&self, path: &Path, kind: ArtifactKind) -> bool;
}

/// Always reuse what is already on disk (the non-interactive default)
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysReuse;

impl ReuseDecider for AlwaysReuse {
    fn reuse_existing(&self, _path: &Path, _kind: ArtifactKind) -> bool {
        true
    }
}

/// Always re-fetch, discarding artifacts on disk
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverReuse;

impl ReuseDecider for NeverReuse {
    fn reuse_existing(&self, _path: &Path, _kind: ArtifactKind) -> bool {
        false
    }
}
