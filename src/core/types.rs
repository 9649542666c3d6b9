//! Shared Value Types
//!
//! Common types used across pipeline stages.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Resolved canonical identifier for a piece of remote content.
///
/// Two references are the same content iff their `id` matches, regardless of
/// how the raw reference was formatted (short link, embed link, shorts link,
/// trailing query parameters).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRef {
    /// The reference string exactly as the user supplied it
    pub raw_reference: String,
    /// 11-character opaque content token
    pub id: String,
}

impl ContentRef {
    pub fn new(raw_reference: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            raw_reference: raw_reference.into(),
            id: id.into(),
        }
    }
}

impl PartialEq for ContentRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ContentRef {}

impl std::fmt::Display for ContentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Kind of locally-stored acquisition byproduct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Transcript,
    Audio,
    Video,
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactKind::Transcript => write!(f, "transcript"),
            ArtifactKind::Audio => write!(f, "audio"),
            ArtifactKind::Video => write!(f, "video"),
        }
    }
}

/// A locally-stored byproduct of acquisition.
///
/// Content-addressed by `(source_ref.id, kind)`; the orchestrator keeps a
/// ledger of artifacts produced so far to avoid duplicate acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub source_ref: ContentRef,
}

impl Artifact {
    pub fn new(kind: ArtifactKind, path: impl Into<PathBuf>, source_ref: ContentRef) -> Self {
        Self {
            kind,
            path: path.into(),
            source_ref,
        }
    }

    /// Ledger key for duplicate-acquisition checks
    pub fn key(&self) -> (String, ArtifactKind) {
        (self.source_ref.id.clone(), self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_ref_equality_ignores_raw_form() {
        let a = ContentRef::new("https://www.youtube.com/watch?v=dQw4w9WgXcQ", "dQw4w9WgXcQ");
        let b = ContentRef::new("https://youtu.be/dQw4w9WgXcQ", "dQw4w9WgXcQ");
        assert_eq!(a, b);

        let c = ContentRef::new("https://youtu.be/AAAAAAAAAAA", "AAAAAAAAAAA");
        assert_ne!(a, c);
    }

    #[test]
    fn test_artifact_key() {
        let reference = ContentRef::new("ref", "dQw4w9WgXcQ");
        let artifact = Artifact::new(ArtifactKind::Video, "/tmp/v.mp4", reference);
        assert_eq!(
            artifact.key(),
            ("dQw4w9WgXcQ".to_string(), ArtifactKind::Video)
        );
    }

    #[test]
    fn test_artifact_kind_display() {
        assert_eq!(ArtifactKind::Transcript.to_string(), "transcript");
        assert_eq!(ArtifactKind::Audio.to_string(), "audio");
        assert_eq!(ArtifactKind::Video.to_string(), "video");
    }
}
