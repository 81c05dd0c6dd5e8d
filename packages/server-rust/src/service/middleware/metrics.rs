//! Metrics middleware for operation jobs.
//!
//! Wraps each job in an `operation` span and records
//! `nsm_operations_total{family,outcome}` and
//! `nsm_operation_duration_seconds{family}` through the `metrics` facade.
//! Without an installed recorder the macros are no-ops.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use tower::{Layer, Service};
use tracing::{info_span, Instrument};

use crate::service::operation::{Completion, HandlerFailure, Job};

pub const OPERATIONS_TOTAL: &str = "nsm_operations_total";
pub const OPERATION_DURATION_SECONDS: &str = "nsm_operation_duration_seconds";

// ---------------------------------------------------------------------------
// MetricsLayer
// ---------------------------------------------------------------------------

/// Tower layer that instruments jobs with timing and outcome counting.
#[derive(Debug, Clone)]
pub struct MetricsLayer;

impl<S> Layer<S> for MetricsLayer {
    type Service = MetricsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsService { inner }
    }
}

// ---------------------------------------------------------------------------
// MetricsService
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct MetricsService<S> {
    inner: S,
}

impl<S> Service<Job> for MetricsService<S>
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
        let family = job.family.as_str();

        let span = info_span!(
            "operation",
            family = family,
            operation = %job.operation_name(),
            operation_id = %job.request.operation_id,
            delete = job.request.is_delete_operation,
            duration_ms = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );

        let fut = self.inner.call(job);

        Box::pin(
            async move {
                let start = Instant::now();
                let result = fut.await;
                let elapsed = start.elapsed();

                let outcome = match &result {
                    Ok(_) => "ok",
                    Err(_) => "error",
                };

                #[allow(clippy::cast_possible_truncation)]
                let duration_ms = elapsed.as_millis() as u64;
                tracing::Span::current().record("duration_ms", duration_ms);
                tracing::Span::current().record("outcome", outcome);

                metrics::counter!(OPERATIONS_TOTAL, "family" => family, "outcome" => outcome)
                    .increment(1);
                metrics::histogram!(OPERATION_DURATION_SECONDS, "family" => family)
                    .record(elapsed.as_secs_f64());

                tracing::info!(family, duration_ms, outcome, "operation complete");

                result
            }
            .instrument(span),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
