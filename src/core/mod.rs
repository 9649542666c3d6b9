//! VidQuiz Core Engine
//!
//! Core pipeline module. Handles reference resolution, artifact acquisition,
//! remote analysis jobs, local heuristic quiz generation, and output writing.

pub mod acquire;
pub mod output;
pub mod pipeline;
pub mod quiz;
pub mod remote;
pub mod resolver;
pub mod subtitles;
pub mod transcode;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;
