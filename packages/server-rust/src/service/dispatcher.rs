//! Operation dispatcher: the adapter's single entry point for mesh operations.
//!
//! `apply_operation` validates a request synchronously and hands accepted work
//! to the worker pool. From the moment the placeholder event is built, every
//! request produces exactly one terminal event on the sink: a rejection
//! reported here, or the handler outcome reported by the pool.

use std::sync::Arc;

use nsm_adapter_core::{
    load_operations, AdapterError, Component, ConfigHandler, Event, EventSink, MeshActions,
    OperationFamily, OperationRequest, Operations,
};
use tracing::{debug, warn};

use super::config::AdapterConfig;
use super::handlers::{HandlerService, SmiSettings};
use super::middleware::build_handler_pipeline;
use super::operation::{Dispatch, DispatchError, Job, SubmitError};
use super::report::stream_error;
use super::worker::WorkerPool;
use crate::shutdown::ShutdownController;

/// Summary reported for operation names outside the known families.
pub const INVALID_OPERATION: &str = "Invalid operation";

pub struct Dispatcher {
    config: Arc<dyn ConfigHandler>,
    sink: Arc<dyn EventSink>,
    component: Component,
    pool: WorkerPool,
}

impl Dispatcher {
    /// Builds the handler pipeline and starts the worker pool.
    ///
    /// Must be called within a tokio runtime.
    #[must_use]
    pub fn new(
        settings: &AdapterConfig,
        config: Arc<dyn ConfigHandler>,
        sink: Arc<dyn EventSink>,
        actions: Arc<dyn MeshActions>,
        shutdown: Arc<ShutdownController>,
    ) -> Self {
        let handler = HandlerService::new(actions, SmiSettings::from(settings));
        let pipeline = build_handler_pipeline(handler, settings);
        let pool = WorkerPool::start(pipeline, Arc::clone(&sink), shutdown, settings);
        Self {
            config,
            sink,
            component: settings.component(),
            pool,
        }
    }

    /// Validates `request` and schedules it for execution.
    ///
    /// Returns as soon as the request is either queued or rejected; the
    /// outcome arrives later as a single event on the sink. Unknown operation
    /// names, a full queue and a stopped pool are all reported as error events
    /// and still return `Ok`.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Config` when the operations table cannot be
    /// read. No event is emitted in that case.
    pub async fn apply_operation(&self, request: OperationRequest) -> Result<(), DispatchError> {
        let operations = load_operations(self.config.as_ref()).inspect_err(|err| {
            warn!(
                operation = %request.operation_name,
                operation_id = %request.operation_id,
                error = %err,
                "operations table unavailable"
            );
        })?;

        let event = Event::placeholder(request.operation_id.clone(), &self.component);

        let Some(family) = OperationFamily::classify(&request.operation_name) else {
            warn!(
                operation = %request.operation_name,
                operation_id = %request.operation_id,
                "unsupported operation"
            );
            stream_error(
                self.sink.as_ref(),
                event,
                INVALID_OPERATION,
                &AdapterError::op_invalid(),
            )
            .await;
            return Ok(());
        };

        debug!(
            operation = %request.operation_name,
            operation_id = %request.operation_id,
            family = family.as_str(),
            delete = request.is_delete_operation,
            "dispatching operation"
        );

        let dispatch = Dispatch {
            job: Job {
                family,
                request,
                operations: Arc::new(operations),
            },
            event,
        };

        if let Err(rejection) = self.pool.submit(dispatch) {
            warn!(error = %rejection, "operation rejected");
            let (dispatch, err) = match rejection {
                SubmitError::Overloaded { dispatch, capacity } => {
                    (dispatch, AdapterError::overloaded(capacity))
                }
                SubmitError::Closed { dispatch } => (dispatch, AdapterError::shutting_down()),
            };
            let summary = format!("Operation {} rejected", dispatch.job.operation_name());
            stream_error(self.sink.as_ref(), dispatch.event, summary, &err).await;
        }
        Ok(())
    }

    /// Current operations table, as advertised to callers.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Config` when the table cannot be read.
    pub fn operations(&self) -> Result<Operations, DispatchError> {
        Ok(load_operations(self.config.as_ref())?)
    }

    /// Whether new operations are still accepted.
    #[must_use]
    pub fn is_accepting(&self) -> bool {
        self.pool.is_accepting()
    }

    /// Stops accepting operations and waits for every accepted one to report.
    pub async fn shutdown(&self) {
        self.pool.shutdown().await;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
