//! Job types flowing through the handler pipeline.

use std::sync::Arc;

use nsm_adapter_core::{Event, OperationFamily, OperationRequest, Operations};

/// One accepted operation, ready to run on the worker pool.
#[derive(Debug, Clone)]
pub struct Job {
    pub family: OperationFamily,
    pub request: OperationRequest,
    /// Snapshot of the operations table taken when the request was dispatched.
    pub operations: Arc<Operations>,
}

impl Job {
    /// Name of the requested operation.
    #[must_use]
    pub fn operation_name(&self) -> &str {
        &self.request.operation_name
    }
}

/// A job paired with the event that will carry its outcome.
#[derive(Debug)]
pub struct Dispatch {
    pub job: Job,
    pub event: Event,
}

/// Success narrative produced by a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub summary: String,
    pub details: String,
}

/// Failure produced by a handler: the summary to report and the underlying error.
#[derive(Debug)]
pub struct HandlerFailure {
    pub summary: String,
    pub error: anyhow::Error,
}

impl HandlerFailure {
    #[must_use]
    pub fn new(summary: impl Into<String>, error: impl Into<anyhow::Error>) -> Self {
        Self {
            summary: summary.into(),
            error: error.into(),
        }
    }
}

/// Errors returned synchronously from `Dispatcher::apply_operation`.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("failed to load operations table: {0}")]
    Config(#[from] nsm_adapter_core::ConfigError),
}

/// Why the worker pool refused a dispatch. The rejected dispatch is handed back
/// so its event can still be reported.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The job queue is at capacity.
    #[error("operation queue is full (capacity {capacity})")]
    Overloaded { dispatch: Dispatch, capacity: usize },
    /// The pool has been shut down.
    #[error("worker pool is shut down")]
    Closed { dispatch: Dispatch },
}
