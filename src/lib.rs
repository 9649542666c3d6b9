//! VidQuiz Library
//!
//! Turns a remote media reference into a structured quiz document.
//!
//! The pipeline acquires a representation of the source content (transcript,
//! audio, or video), optionally hands it to an asynchronous remote analysis
//! service, and always degrades to a local heuristic generator when the
//! remote path is unavailable, invalid, or slow.

pub mod core;

pub use core::{CoreError, CoreResult};
