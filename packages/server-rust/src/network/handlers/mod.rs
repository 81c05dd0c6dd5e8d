//! HTTP handler definitions for the adapter.
//!
//! This module defines `AppState` (the shared state carried through axum
//! extractors) and re-exports all handler functions for building the router.

pub mod events;
pub mod health;
pub mod operations;

pub use events::events_handler;
pub use health::{health_handler, liveness_handler, readiness_handler};
pub use operations::{list_operations_handler, submit_operation_handler};

use std::sync::Arc;
use std::time::Instant;

use crate::service::Dispatcher;
use crate::shutdown::ShutdownController;
use crate::sink::BroadcastEventSink;

/// Shared application state passed to all axum handlers via `State` extraction.
///
/// Holds `Arc` references to shared resources so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Entry point for operation requests.
    pub dispatcher: Arc<Dispatcher>,
    /// Sink the dispatcher reports to; `/events` subscribes here.
    pub events: Arc<BroadcastEventSink>,
    /// Health state and in-flight tracking.
    pub shutdown: Arc<ShutdownController>,
    /// Process start time, used for uptime calculation.
    pub start_time: Instant,
}
