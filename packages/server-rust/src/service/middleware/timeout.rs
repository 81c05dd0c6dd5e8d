//! Timeout middleware for operation jobs.
//!
//! Fails jobs that outlive the configured deadline with `ErrOperationTimeout`.
//! Without a deadline the layer passes calls straight through.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use nsm_adapter_core::AdapterError;
use tower::{Layer, Service};

use crate::service::operation::{Completion, HandlerFailure, Job};

// ---------------------------------------------------------------------------
// TimeoutLayer
// ---------------------------------------------------------------------------

/// Tower layer that bounds how long a single job may run.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeoutLayer {
    timeout_ms: Option<u64>,
}

impl TimeoutLayer {
    #[must_use]
    pub fn new(timeout_ms: Option<u64>) -> Self {
        Self { timeout_ms }
    }
}

impl<S> Layer<S> for TimeoutLayer {
    type Service = TimeoutService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TimeoutService {
            inner,
            timeout_ms: self.timeout_ms,
        }
    }
}

// ---------------------------------------------------------------------------
// TimeoutService
// ---------------------------------------------------------------------------

/// Service wrapper that enforces the job deadline.
#[derive(Debug, Clone)]
pub struct TimeoutService<S> {
    inner: S,
    timeout_ms: Option<u64>,
}

impl<S> Service<Job> for TimeoutService<S>
where
    S: Service<Job, Response = Completion, Error = HandlerFailure> + Send,
    S::Future: Send + 'static,
{
    type Response = Completion;
    type Error = HandlerFailure;
    type Future = Pin<Box<dyn Future<Output = Result<Completion, HandlerFailure>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, job: Job) -> Self::Future {
        let Some(timeout_ms) = self.timeout_ms else {
            return Box::pin(self.inner.call(job));
        };
        let name = job.operation_name().to_string();
        let fut = self.inner.call(job);
        Box::pin(async move {
            match tokio::time::timeout(Duration::from_millis(timeout_ms), fut).await {
                Ok(result) => result,
                Err(_elapsed) => Err(HandlerFailure::new(
                    format!("Operation {name} timed out"),
                    AdapterError::operation_timeout(&name, timeout_ms),
                )),
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
