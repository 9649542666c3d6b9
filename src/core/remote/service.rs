//! Remote Analysis Capability
//!
//! Trait abstraction over the external analysis service: upload a file, poll
//! its processing state, and generate text from a ready handle or from plain
//! text. The production implementation targets the Gemini Files API; tests
//! use the in-tree mock.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::{CoreError, CoreResult};

// =============================================================================
// Capability Types
// =============================================================================

/// Processing state of an uploaded remote file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteFileState {
    Queued,
    Processing,
    /// Terminal: ready for generation
    Active,
    /// Terminal: processing failed
    Failed,
}

impl RemoteFileState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RemoteFileState::Active | RemoteFileState::Failed)
    }

    /// Monotonic rank; states never regress
    pub(crate) fn rank(&self) -> u8 {
        match self {
            RemoteFileState::Queued => 0,
            RemoteFileState::Processing => 1,
            RemoteFileState::Active | RemoteFileState::Failed => 2,
        }
    }
}

impl std::fmt::Display for RemoteFileState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteFileState::Queued => write!(f, "queued"),
            RemoteFileState::Processing => write!(f, "processing"),
            RemoteFileState::Active => write!(f, "active"),
            RemoteFileState::Failed => write!(f, "failed"),
        }
    }
}

/// Opaque handle to an uploaded remote file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteHandle {
    /// Service-assigned resource token
    pub token: String,
    /// Resource URI used in generation requests, when the service reports one
    pub uri: Option<String>,
    /// MIME type of the uploaded content
    pub mime_type: Option<String>,
    /// Upload timestamp (unix seconds)
    pub submitted_at: i64,
}

/// Input to a generation call
#[derive(Debug, Clone)]
pub enum GenerateInput {
    /// A ready uploaded file, optionally with auxiliary context text
    Media {
        handle: RemoteHandle,
        auxiliary_text: Option<String>,
    },
    /// Plain text as the sole input
    Text(String),
}

/// External remote analysis capability
#[async_trait]
pub trait RemoteAnalysisService: Send + Sync {
    /// Service name for diagnostics
    fn name(&self) -> &str;

    /// Whether the service is configured (e.g. has an API key)
    fn is_available(&self) -> bool;

    /// Uploads a local file; a returned handle starts in a non-terminal state
    async fn upload(&self, path: &Path) -> CoreResult<RemoteHandle>;

    /// Queries the current processing state of an uploaded file
    async fn get_state(&self, handle: &RemoteHandle) -> CoreResult<RemoteFileState>;

    /// Generates text from the given input and prompt
    async fn generate(&self, input: &GenerateInput, prompt: &str) -> CoreResult<String>;
}

// =============================================================================
// Mock Service for Testing
// =============================================================================

/// Mock remote service with a scriptable state sequence
#[derive(Debug)]
pub struct MockRemoteService {
    available: bool,
    upload_ok: bool,
    /// States returned by successive `get_state` calls; the last one repeats
    states: Mutex<VecDeque<RemoteFileState>>,
    generation: Option<String>,
    pub upload_calls: AtomicU32,
    pub state_calls: AtomicU32,
    pub generate_calls: AtomicU32,
}

impl MockRemoteService {
    pub fn new() -> Self {
        Self {
            available: true,
            upload_ok: true,
            states: Mutex::new(VecDeque::from([RemoteFileState::Active])),
            generation: Some("Q: Mock question?\nA: Mock answer.".to_string()),
            upload_calls: AtomicU32::new(0),
            state_calls: AtomicU32::new(0),
            generate_calls: AtomicU32::new(0),
        }
    }

    /// The service reports itself as not configured
    pub fn with_unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn with_upload_failure(mut self) -> Self {
        self.upload_ok = false;
        self
    }

    pub fn with_states(self, states: impl IntoIterator<Item = RemoteFileState>) -> Self {
        *self.states.lock().unwrap() = states.into_iter().collect();
        self
    }

    /// Generation calls will fail
    pub fn with_generation_failure(mut self) -> Self {
        self.generation = None;
        self
    }

    pub fn with_generation(mut self, text: impl Into<String>) -> Self {
        self.generation = Some(text.into());
        self
    }
}

impl Default for MockRemoteService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteAnalysisService for MockRemoteService {
    fn name(&self) -> &str {
        "mock"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn upload(&self, path: &Path) -> CoreResult<RemoteHandle> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        if !self.upload_ok {
            return Err(CoreError::Internal("mock: upload refused".to_string()));
        }
        Ok(RemoteHandle {
            token: format!("files/mock-{}", path.file_name().unwrap_or_default().to_string_lossy()),
            uri: Some("https://mock.invalid/files/mock".to_string()),
            mime_type: Some("video/mp4".to_string()),
            submitted_at: chrono::Utc::now().timestamp(),
        })
    }

    async fn get_state(&self, _handle: &RemoteHandle) -> CoreResult<RemoteFileState> {
        self.state_calls.fetch_add(1, Ordering::SeqCst);
        let mut states = self.states.lock().unwrap();
        let state = if states.len() > 1 {
            states.pop_front().unwrap()
        } else {
            *states.front().unwrap_or(&RemoteFileState::Active)
        };
        Ok(state)
    }

    async fn generate(&self, _input: &GenerateInput, _prompt: &str) -> CoreResult<String> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        match &self.generation {
            Some(text) => Ok(text.clone()),
            None => Err(CoreError::Internal("mock: generation refused".to_string())),
        }
    }
}
