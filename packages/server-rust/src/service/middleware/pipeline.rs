//! Pipeline composition: wraps the handler service with the middleware layers.

use tower::util::BoxCloneService;
use tower::ServiceBuilder;

use super::metrics::MetricsLayer;
use super::timeout::TimeoutLayer;
use crate::service::config::AdapterConfig;
use crate::service::handlers::HandlerService;
use crate::service::operation::{Completion, HandlerFailure, Job};

/// Type-erased handler pipeline, cloned once per job by the worker pool.
pub type HandlerPipeline = BoxCloneService<Job, Completion, HandlerFailure>;

/// Build the handler pipeline around `handler`.
///
/// Layer order (outermost to innermost):
/// 1. `TimeoutLayer` -- enforce the optional per-operation deadline
/// 2. `MetricsLayer` -- record timing and outcome (closest to the handler)
///
/// A timed-out job is therefore reported by the timeout layer and never
/// reaches the metrics layer's completion log.
#[must_use]
pub fn build_handler_pipeline(handler: HandlerService, config: &AdapterConfig) -> HandlerPipeline {
    let stack = ServiceBuilder::new()
        .layer(TimeoutLayer::new(config.operation_timeout_ms))
        .layer(MetricsLayer)
        .service(handler);
    BoxCloneService::new(stack)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
