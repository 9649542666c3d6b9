//! Cooperative Cancellation
//!
//! Per-run cancellation flag: single writer (user action), many readers
//! (pipeline stages and the remote poll loop). Cancellation is observed at
//! stage boundaries and on every poll tick; it never preempts an in-flight
//! operation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::core::{CoreError, CoreResult};

/// Cheap clonable cancellation flag
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Returns `Err(CoreError::Cancelled)` when cancellation was requested.
    /// Called at every stage boundary and poll tick.
    pub fn check(&self) -> CoreResult<()> {
        if self.is_cancelled() {
            Err(CoreError::Cancelled)
        } else {
            Ok(())
        }
    }
}
