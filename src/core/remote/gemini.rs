//! Google Gemini Remote Analysis Service
//!
//! Implements `RemoteAnalysisService` over the Gemini Files API: media
//! upload, file state polling, and `generateContent` with either an uploaded
//! file reference or plain text.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{GenerateInput, RemoteAnalysisService, RemoteFileState, RemoteHandle};
use crate::core::{CoreError, CoreResult};

// =============================================================================
// Constants
// =============================================================================

/// Default Gemini API base URL
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default upload endpoint base (media upload uses a distinct path prefix)
const DEFAULT_UPLOAD_BASE_URL: &str = "https://generativelanguage.googleapis.com/upload/v1beta";

/// Default model for generation
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Request timeout; uploads of audio derivatives can take a while
const REQUEST_TIMEOUT_SECS: u64 = 300;

// =============================================================================
// API Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: FileResource,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileResource {
    name: String,
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    state: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum Part {
    #[serde(rename = "text")]
    Text(String),
    #[serde(rename = "file_data")]
    FileData { file_uri: String, mime_type: String },
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

// =============================================================================
// GeminiService
// =============================================================================

/// Gemini-backed remote analysis service
pub struct GeminiService {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    upload_base_url: String,
    model: String,
}

impl std::fmt::Debug for GeminiService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiService")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiService {
    /// Creates a new service with the given API key
    pub fn new(api_key: impl Into<String>) -> CoreResult<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(CoreError::Validation(
                "Gemini API key cannot be empty".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| CoreError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            upload_base_url: DEFAULT_UPLOAD_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        })
    }

    /// Set custom base URLs (test servers)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.upload_base_url = format!("{}/upload", url.trim_end_matches('/'));
        self.base_url = url;
        self
    }

    /// Set custom model ID
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn upload_url(&self) -> String {
        format!("{}/files?key={}", self.upload_base_url, self.api_key)
    }

    fn file_url(&self, token: &str) -> String {
        // Tokens are resource names of the form "files/abc123"
        format!("{}/{}?key={}", self.base_url, token, self.api_key)
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }

    /// Guesses the upload MIME type from the file extension
    fn mime_type_for(path: &Path) -> &'static str {
        match path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .as_deref()
        {
            Some("mp4") => "video/mp4",
            Some("webm") => "video/webm",
            Some("mkv") => "video/x-matroska",
            Some("mp3") => "audio/mpeg",
            Some("m4a") => "audio/mp4",
            Some("wav") => "audio/wav",
            Some("txt") => "text/plain",
            _ => "application/octet-stream",
        }
    }

    fn map_state(state: Option<&str>) -> RemoteFileState {
        match state {
            Some("ACTIVE") => RemoteFileState::Active,
            Some("FAILED") => RemoteFileState::Failed,
            Some("PROCESSING") => RemoteFileState::Processing,
            Some(other) => {
                warn!("Unknown Gemini file state: {}", other);
                RemoteFileState::Processing
            }
            None => RemoteFileState::Queued,
        }
    }

    /// Parses an error response body
    fn parse_api_error(status: StatusCode, body: &str) -> CoreError {
        if let Ok(err_resp) = serde_json::from_str::<ApiErrorResponse>(body) {
            if let Some(detail) = err_resp.error {
                return CoreError::Internal(format!(
                    "Gemini API error ({}): {} ({})",
                    status,
                    detail.message.unwrap_or_default(),
                    detail.status.unwrap_or_default(),
                ));
            }
        }

        let truncated: String = body.chars().take(500).collect();
        CoreError::Internal(format!("Gemini API error ({}): {}", status, truncated))
    }

    fn build_generate_request(input: &GenerateInput, prompt: &str) -> CoreResult<GenerateContentRequest> {
        let mut parts = vec![Part::Text(prompt.to_string())];

        match input {
            GenerateInput::Media {
                handle,
                auxiliary_text,
            } => {
                let file_uri = handle.uri.clone().ok_or_else(|| {
                    CoreError::Validation("handle carries no resource URI".to_string())
                })?;
                let mime_type = handle
                    .mime_type
                    .clone()
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                parts.push(Part::FileData {
                    file_uri,
                    mime_type,
                });
                if let Some(aux) = auxiliary_text {
                    if !aux.trim().is_empty() {
                        parts.push(Part::Text(format!("Transcript for reference:\n{}", aux)));
                    }
                }
            }
            GenerateInput::Text(text) => {
                parts.push(Part::Text(text.clone()));
            }
        }

        Ok(GenerateContentRequest {
            contents: vec![Content { parts }],
        })
    }
}

#[async_trait]
impl RemoteAnalysisService for GeminiService {
    fn name(&self) -> &str {
        "gemini"
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn upload(&self, path: &Path) -> CoreResult<RemoteHandle> {
        let bytes = tokio::fs::read(path).await?;
        let mime_type = Self::mime_type_for(path);
        info!(
            path = %path.display(),
            bytes = bytes.len(),
            mime_type,
            "uploading to Gemini Files API"
        );

        let resp = self
            .client
            .post(self.upload_url())
            .header("X-Goog-Upload-Protocol", "raw")
            .header("Content-Type", mime_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| CoreError::Internal(format!("Network error: {}", e)))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| CoreError::Internal(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(Self::parse_api_error(status, &body));
        }

        let parsed: UploadResponse = serde_json::from_str(&body)
            .map_err(|e| CoreError::Internal(format!("Failed to parse upload response: {}", e)))?;

        debug!(token = %parsed.file.name, "upload accepted");
        Ok(RemoteHandle {
            token: parsed.file.name,
            uri: parsed.file.uri,
            mime_type: parsed.file.mime_type.or_else(|| Some(mime_type.to_string())),
            submitted_at: chrono::Utc::now().timestamp(),
        })
    }

    async fn get_state(&self, handle: &RemoteHandle) -> CoreResult<RemoteFileState> {
        let resp = self
            .client
            .get(self.file_url(&handle.token))
            .send()
            .await
            .map_err(|e| CoreError::Internal(format!("Network error: {}", e)))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| CoreError::Internal(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(Self::parse_api_error(status, &body));
        }

        let parsed: FileResource = serde_json::from_str(&body)
            .map_err(|e| CoreError::Internal(format!("Failed to parse file resource: {}", e)))?;

        Ok(Self::map_state(parsed.state.as_deref()))
    }

    async fn generate(&self, input: &GenerateInput, prompt: &str) -> CoreResult<String> {
        let request = Self::build_generate_request(input, prompt)?;

        let resp = self
            .client
            .post(self.generate_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| CoreError::Internal(format!("Network error: {}", e)))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| CoreError::Internal(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(Self::parse_api_error(status, &body));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body).map_err(|e| {
            CoreError::Internal(format!("Failed to parse generation response: {}", e))
        })?;

        let text: String = parsed
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(CoreError::Internal(
                "generation response contained no text candidates".to_string(),
            ));
        }

        Ok(text)
    }
}
