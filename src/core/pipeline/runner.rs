//! Pipeline Runner
//!
//! Owns the single background unit of work per invocation. At most one run
//! is active at a time; a second start request while one is in flight is
//! rejected so the output directory has exactly one mutator.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use super::{CancelToken, Orchestrator, RunReport};
use crate::core::{ContentRef, CoreError, CoreResult};

/// Handle to a running pipeline task
pub struct RunHandle {
    pub run_id: String,
    pub cancel: CancelToken,
    handle: JoinHandle<CoreResult<RunReport>>,
}

impl RunHandle {
    /// Waits for the run to finish and returns its outcome
    pub async fn join(self) -> CoreResult<RunReport> {
        self.handle
            .await
            .map_err(|e| CoreError::Internal(format!("pipeline task panicked: {}", e)))?
    }
}

/// Starts pipeline runs, one at a time
pub struct PipelineRunner {
    orchestrator: Arc<Orchestrator>,
    active: Arc<AtomicBool>,
}

impl PipelineRunner {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Spawns a run for `content`. Fails with `RunInProgress` when a run is
    /// already active.
    pub fn start(&self, content: ContentRef) -> CoreResult<RunHandle> {
        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(CoreError::RunInProgress);
        }

        let run_id = ulid::Ulid::new().to_string();
        let cancel = CancelToken::new();
        info!(run_id, id = %content.id, "starting pipeline run");

        let orchestrator = self.orchestrator.clone();
        let active = self.active.clone();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            let result = orchestrator.run(&content, &token).await;
            active.store(false, Ordering::SeqCst);
            result
        });

        Ok(RunHandle {
            run_id,
            cancel,
            handle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::acquire::MockFetcher;
    use crate::core::pipeline::PipelineConfig;
    use std::time::Duration;

    const ID: &str = "dQw4w9WgXcQ";

    fn runner(dir: &std::path::Path) -> PipelineRunner {
        let config = PipelineConfig {
            offline_mode: true,
            ..PipelineConfig::new(dir)
        };
        PipelineRunner::new(Orchestrator::new(config, Arc::new(MockFetcher::new())))
    }

    #[tokio::test]
    async fn test_single_run_at_a_time() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path());
        let content = ContentRef::new("ref", ID);

        let first = runner.start(content.clone()).unwrap();
        assert!(runner.is_running());
        let second = runner.start(content.clone());
        assert!(matches!(second, Err(CoreError::RunInProgress)));

        let report = first.join().await.unwrap();
        assert!(!report.document.is_empty());

        // Slot is free again once the run finished
        assert!(!runner.is_running());
        let third = runner.start(content).unwrap();
        third.join().await.unwrap();
    }

    #[tokio::test]
    async fn test_run_ids_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path());

        let first = runner.start(ContentRef::new("ref", ID)).unwrap();
        let first_id = first.run_id.clone();
        first.join().await.unwrap();

        let second = runner.start(ContentRef::new("ref", ID)).unwrap();
        assert_ne!(first_id, second.run_id);
        second.join().await.unwrap();
    }

    #[tokio::test]
    async fn test_cancel_through_handle() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path());

        let handle = runner.start(ContentRef::new("ref", ID)).unwrap();
        handle.cancel.cancel();
        // The run either finished before the cancel landed or reports it
        match handle.join().await {
            Ok(_) => {}
            Err(e) => assert!(e.is_cancelled()),
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(!runner.is_running());
    }
}
