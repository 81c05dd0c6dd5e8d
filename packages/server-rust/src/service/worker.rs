//! Bounded worker pool executing accepted operations.
//!
//! Dispatches are queued on a bounded mpsc channel and drained by a single
//! loop task. The loop takes a semaphore permit before it dequeues, so at most
//! `max_concurrent_operations` jobs execute at once while up to
//! `queue_capacity` wait in the channel behind them. A full queue is reported
//! back to the caller instead of blocking it.
//!
//! A job that panics still reports: the panic is caught and turned into an
//! `ErrHandlerPanicked` failure.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use nsm_adapter_core::{AdapterError, EventSink};
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tower::ServiceExt;
use tracing::{debug, error, info};

use super::config::AdapterConfig;
use super::middleware::HandlerPipeline;
use super::operation::{Dispatch, HandlerFailure, SubmitError};
use super::report::report_outcome;
use crate::shutdown::ShutdownController;

// ---------------------------------------------------------------------------
// WorkerPool
// ---------------------------------------------------------------------------

/// Handle to the running pool: submit dispatches, then shut it down.
pub struct WorkerPool {
    tx: RwLock<Option<mpsc::Sender<Dispatch>>>,
    capacity: usize,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Spawns the pool loop. Must be called within a tokio runtime.
    #[must_use]
    pub fn start(
        pipeline: HandlerPipeline,
        sink: Arc<dyn EventSink>,
        shutdown: Arc<ShutdownController>,
        config: &AdapterConfig,
    ) -> Self {
        let capacity = config.queue_capacity.max(1);
        let workers = config.max_concurrent_operations.max(1) as usize;
        let (tx, rx) = mpsc::channel(capacity);
        let permits = Arc::new(Semaphore::new(workers));

        debug!(capacity, workers, "starting worker pool");
        let handle = tokio::spawn(run_pool(rx, pipeline, sink, permits, shutdown));

        Self {
            tx: RwLock::new(Some(tx)),
            capacity,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Queues `dispatch` without waiting.
    ///
    /// # Errors
    ///
    /// Returns `SubmitError::Overloaded` when the queue is full and
    /// `SubmitError::Closed` after [`shutdown`](Self::shutdown). Either way the
    /// dispatch is handed back.
    pub fn submit(&self, dispatch: Dispatch) -> Result<(), SubmitError> {
        let guard = self.tx.read();
        let Some(tx) = guard.as_ref() else {
            return Err(SubmitError::Closed { dispatch });
        };
        tx.try_send(dispatch).map_err(|err| match err {
            TrySendError::Full(dispatch) => SubmitError::Overloaded {
                dispatch,
                capacity: self.capacity,
            },
            TrySendError::Closed(dispatch) => SubmitError::Closed { dispatch },
        })
    }

    /// Whether new dispatches are still accepted.
    #[must_use]
    pub fn is_accepting(&self) -> bool {
        self.tx.read().is_some()
    }

    /// Stops accepting work and waits until every queued and running job has
    /// reported its terminal event.
    pub async fn shutdown(&self) {
        self.tx.write().take();
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                error!(error = %err, "worker pool loop failed");
            }
            info!("worker pool drained");
        }
    }
}

// ---------------------------------------------------------------------------
// Pool loop
// ---------------------------------------------------------------------------

async fn run_pool(
    mut rx: mpsc::Receiver<Dispatch>,
    pipeline: HandlerPipeline,
    sink: Arc<dyn EventSink>,
    permits: Arc<Semaphore>,
    shutdown: Arc<ShutdownController>,
) {
    let mut running = JoinSet::new();

    loop {
        // A dispatch leaves the channel only once it can start.
        let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
            break;
        };
        let Some(dispatch) = rx.recv().await else {
            break;
        };
        let svc = pipeline.clone();
        let sink = Arc::clone(&sink);
        let in_flight = shutdown.in_flight_guard();

        running.spawn(async move {
            let Dispatch { job, event } = dispatch;
            let name = job.operation_name().to_string();
            let outcome = match AssertUnwindSafe(svc.oneshot(job)).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(payload) => Err(panicked(&name, payload.as_ref())),
            };
            report_outcome(sink.as_ref(), event, outcome).await;
            drop(permit);
            drop(in_flight);
        });

        while let Some(result) = running.try_join_next() {
            log_join(result);
        }
    }

    while let Some(result) = running.join_next().await {
        log_join(result);
    }
}

fn panicked(operation: &str, payload: &(dyn Any + Send)) -> HandlerFailure {
    let message = payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    error!(operation, panic = %message, "operation handler panicked");
    HandlerFailure::new(
        format!("Operation {operation} failed unexpectedly"),
        AdapterError::handler_panicked(operation, &message),
    )
}

fn log_join(result: Result<(), JoinError>) {
    if let Err(err) = result {
        error!(error = %err, "operation task failed");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
