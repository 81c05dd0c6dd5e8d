//! Tower middleware layers for the handler pipeline.
//!
//! - [`timeout`]: Optional per-operation deadline
//! - [`metrics`]: Operation timing and outcome counting
//! - [`pipeline`]: Composes all layers around the handler service

pub mod metrics;
pub mod pipeline;
pub mod timeout;

pub use metrics::MetricsLayer;
pub use pipeline::{build_handler_pipeline, HandlerPipeline};
pub use timeout::TimeoutLayer;
