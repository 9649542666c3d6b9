//! Pipeline Module
//!
//! The orchestrator state machine, run configuration, cooperative
//! cancellation, and the single-run-at-a-time runner.

mod cancel;
mod config;
mod orchestrator;
mod runner;

pub use cancel::CancelToken;
pub use config::{
    PipelineConfig, DEFAULT_MAX_TRANSCRIPT_CHARS, DEFAULT_MAX_VIDEO_HEIGHT,
    DEFAULT_POLL_INTERVAL_SECS, DEFAULT_POLL_TIMEOUT_SECS, DEFAULT_QUESTION_COUNT,
};
pub use orchestrator::{GeneratorKind, Orchestrator, ProgressSink, RunReport, Stage, TracingSink};
pub use runner::{PipelineRunner, RunHandle};
