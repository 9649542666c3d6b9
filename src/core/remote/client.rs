//! Remote Job Client
//!
//! Wraps a `RemoteAnalysisService` with the upload/poll/generate job
//! protocol: upload is a single call (no automatic retry; retrying is the
//! orchestrator's decision), polling runs at a fixed caller-supplied
//! interval until a terminal state, cancellation, or timeout.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use super::{GenerateInput, RemoteAnalysisService, RemoteFileState, RemoteHandle};
use crate::core::pipeline::CancelToken;
use crate::core::{CoreError, CoreResult};

/// A handle to an in-progress asynchronous remote analysis task
#[derive(Debug, Clone)]
pub struct RemoteJob {
    pub handle: RemoteHandle,
    state: RemoteFileState,
}

impl RemoteJob {
    pub fn new(handle: RemoteHandle) -> Self {
        Self {
            handle,
            state: RemoteFileState::Queued,
        }
    }

    pub fn state(&self) -> RemoteFileState {
        self.state
    }

    /// Records an observed state. Transitions are monotonic; a regression
    /// reported by the service is ignored.
    fn observe(&mut self, observed: RemoteFileState) -> RemoteFileState {
        if observed.rank() >= self.state.rank() {
            self.state = observed;
        }
        self.state
    }
}

/// Client for the upload/poll/generate job protocol
pub struct RemoteJobClient {
    service: Arc<dyn RemoteAnalysisService>,
}

impl RemoteJobClient {
    pub fn new(service: Arc<dyn RemoteAnalysisService>) -> Self {
        Self { service }
    }

    pub fn service_name(&self) -> &str {
        self.service.name()
    }

    /// Whether the underlying service is configured and worth attempting
    pub fn is_available(&self) -> bool {
        self.service.is_available()
    }

    /// Uploads a local artifact. Any error is wrapped as a remote upload
    /// failure; no automatic retry.
    pub async fn submit(&self, artifact: &Path) -> CoreResult<RemoteJob> {
        info!(path = %artifact.display(), service = self.service.name(), "uploading artifact");
        let handle = self
            .service
            .upload(artifact)
            .await
            .map_err(|e| CoreError::RemoteUpload(e.to_string()))?;
        Ok(RemoteJob::new(handle))
    }

    /// Polls the job at a fixed interval until it becomes `Active`.
    ///
    /// Terminal `Failed` propagates immediately, never after the timeout
    /// elapses. Cancellation is observed on every tick. No backoff growth:
    /// the remote service's processing time is not correlated with poll
    /// frequency.
    pub async fn await_completion(
        &self,
        job: &mut RemoteJob,
        timeout: Duration,
        poll_interval: Duration,
        cancel: &CancelToken,
    ) -> CoreResult<RemoteHandle> {
        let started = Instant::now();

        loop {
            cancel.check()?;

            let observed = self
                .service
                .get_state(&job.handle)
                .await
                .map_err(|e| CoreError::RemoteProcessing(e.to_string()))?;
            let state = job.observe(observed);
            debug!(token = %job.handle.token, %state, "remote job state");

            match state {
                RemoteFileState::Active => {
                    info!(token = %job.handle.token, "remote file active");
                    return Ok(job.handle.clone());
                }
                RemoteFileState::Failed => {
                    return Err(CoreError::RemoteProcessing(format!(
                        "remote processing of {} reached terminal failed state",
                        job.handle.token
                    )));
                }
                RemoteFileState::Queued | RemoteFileState::Processing => {}
            }

            if started.elapsed() >= timeout {
                return Err(CoreError::RemoteTimeout {
                    waited_secs: started.elapsed().as_secs(),
                });
            }

            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Runs generation against a ready handle (or plain text).
    ///
    /// Failures here are catchable separately from upload/poll failures so
    /// callers can fall back without treating them as pipeline-fatal.
    pub async fn analyze(&self, input: &GenerateInput, prompt: &str) -> CoreResult<String> {
        let text = self
            .service
            .generate(input, prompt)
            .await
            .map_err(|e| CoreError::RemoteGeneration(e.to_string()))?;

        if text.trim().is_empty() {
            return Err(CoreError::RemoteGeneration(
                "service returned an empty response".to_string(),
            ));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::remote::MockRemoteService;
    use std::sync::atomic::Ordering;

    const TICK: Duration = Duration::from_millis(5);
    const LONG: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_submit_wraps_upload_errors() {
        let client = RemoteJobClient::new(Arc::new(MockRemoteService::new().with_upload_failure()));
        let err = client.submit(Path::new("/tmp/x.mp4")).await.unwrap_err();
        assert!(matches!(err, CoreError::RemoteUpload(_)));
    }

    #[tokio::test]
    async fn test_await_completion_reaches_active() {
        let service = Arc::new(MockRemoteService::new().with_states([
            RemoteFileState::Queued,
            RemoteFileState::Processing,
            RemoteFileState::Active,
        ]));
        let client = RemoteJobClient::new(service.clone());

        let mut job = client.submit(Path::new("/tmp/x.mp4")).await.unwrap();
        let cancel = CancelToken::new();
        let handle = client
            .await_completion(&mut job, LONG, TICK, &cancel)
            .await
            .unwrap();

        assert_eq!(handle.token, job.handle.token);
        assert_eq!(job.state(), RemoteFileState::Active);
        assert_eq!(service.state_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_await_completion_failed_short_circuits() {
        // Failed must propagate immediately, not after the timeout elapses
        let service = Arc::new(
            MockRemoteService::new()
                .with_states([RemoteFileState::Processing, RemoteFileState::Failed]),
        );
        let client = RemoteJobClient::new(service);

        let mut job = client.submit(Path::new("/tmp/x.mp4")).await.unwrap();
        let cancel = CancelToken::new();

        let started = std::time::Instant::now();
        let err = client
            .await_completion(&mut job, Duration::from_secs(600), TICK, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::RemoteProcessing(_)));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_await_completion_times_out() {
        let service =
            Arc::new(MockRemoteService::new().with_states([RemoteFileState::Processing]));
        let client = RemoteJobClient::new(service);

        let mut job = client.submit(Path::new("/tmp/x.mp4")).await.unwrap();
        let cancel = CancelToken::new();
        let err = client
            .await_completion(&mut job, Duration::from_millis(20), TICK, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::RemoteTimeout { .. }));
    }

    #[tokio::test]
    async fn test_await_completion_observes_cancellation() {
        let service =
            Arc::new(MockRemoteService::new().with_states([RemoteFileState::Processing]));
        let client = RemoteJobClient::new(service);

        let mut job = client.submit(Path::new("/tmp/x.mp4")).await.unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = client
            .await_completion(&mut job, LONG, TICK, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Cancelled));
    }

    #[tokio::test]
    async fn test_job_state_is_monotonic() {
        let handle = RemoteHandle {
            token: "files/t".to_string(),
            uri: None,
            mime_type: None,
            submitted_at: 0,
        };
        let mut job = RemoteJob::new(handle);

        assert_eq!(job.observe(RemoteFileState::Processing), RemoteFileState::Processing);
        // A regression back to Queued is ignored
        assert_eq!(job.observe(RemoteFileState::Queued), RemoteFileState::Processing);
        assert_eq!(job.observe(RemoteFileState::Active), RemoteFileState::Active);
    }

    #[tokio::test]
    async fn test_analyze_maps_errors_and_rejects_empty() {
        let client =
            RemoteJobClient::new(Arc::new(MockRemoteService::new().with_generation_failure()));
        let err = client
            .analyze(&GenerateInput::Text("t".to_string()), "prompt")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::RemoteGeneration(_)));

        let client = RemoteJobClient::new(Arc::new(MockRemoteService::new().with_generation("  ")));
        let err = client
            .analyze(&GenerateInput::Text("t".to_string()), "prompt")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::RemoteGeneration(_)));
    }
}
