//! VidQuiz Error Definitions
//!
//! Defines error types used throughout the pipeline.

use thiserror::Error;

/// Core pipeline error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Resolution Errors
    // =========================================================================
    #[error("Invalid content reference: {0}")]
    InvalidReference(String),

    // =========================================================================
    // Acquisition Errors
    // =========================================================================
    #[error("Acquisition failed: {0}")]
    Acquisition(String),

    #[error("Transcode failed: {0}")]
    Transcode(String),

    #[error("No acquisition succeeded: neither video nor transcript could be fetched")]
    NoAcquisitionSucceeded,

    // =========================================================================
    // Generation Errors
    // =========================================================================
    #[error("Insufficient content: {0}")]
    InsufficientContent(String),

    #[error("No fallback material: no transcript available for local generation")]
    NoFallbackMaterial,

    // =========================================================================
    // Remote Job Errors
    // =========================================================================
    #[error("Remote upload failed: {0}")]
    RemoteUpload(String),

    #[error("Remote processing failed: {0}")]
    RemoteProcessing(String),

    #[error("Remote job timed out after {waited_secs}s")]
    RemoteTimeout { waited_secs: u64 },

    #[error("Remote generation failed: {0}")]
    RemoteGeneration(String),

    #[error("Remote stage failed and no transcript is available as fallback")]
    RemoteFailedNoFallback,

    // =========================================================================
    // Run Control
    // =========================================================================
    #[error("Run cancelled")]
    Cancelled,

    #[error("A pipeline run is already in progress")]
    RunInProgress,

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Core pipeline result type
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// True when the error is a cancellation, which run reports treat as a
    /// distinct outcome rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CoreError::Cancelled)
    }

    /// True when the error belongs to the remote stage and therefore has a
    /// defined local fallback when a transcript exists.
    pub fn is_remote_stage(&self) -> bool {
        matches!(
            self,
            CoreError::RemoteUpload(_)
                | CoreError::RemoteProcessing(_)
                | CoreError::RemoteTimeout { .. }
                | CoreError::RemoteGeneration(_)
        )
    }
}
