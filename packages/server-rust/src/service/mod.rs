//! Operation dispatch framework.
//!
//! 1. **Dispatch** (`dispatcher`): validate a request, build its placeholder
//!    event and queue a job, or report the rejection
//! 2. **Worker pool** (`worker`): bounded queue and concurrency for jobs
//! 3. **Middleware** (`middleware`): Tower layers (timeout, metrics)
//! 4. **Handlers** (`handlers`): one external action per operation family
//! 5. **Reporting** (`report`): turn an outcome into the terminal event

pub mod config;
pub mod dispatcher;
pub mod handlers;
pub mod middleware;
pub mod operation;
pub mod report;
pub mod worker;

pub use config::AdapterConfig;
pub use dispatcher::Dispatcher;
pub use handlers::{HandlerService, SmiSettings};
pub use operation::{Completion, Dispatch, DispatchError, HandlerFailure, Job, SubmitError};
pub use worker::WorkerPool;
