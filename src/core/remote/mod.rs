//! Remote Analysis Module
//!
//! Uploads a local artifact to a remote analysis capability, polls the job
//! until a terminal state, and runs generation against the ready handle.

mod client;
mod gemini;
mod service;

pub use client::{RemoteJob, RemoteJobClient};
pub use gemini::GeminiService;
pub use service::{
    GenerateInput, MockRemoteService, RemoteAnalysisService, RemoteFileState, RemoteHandle,
};
