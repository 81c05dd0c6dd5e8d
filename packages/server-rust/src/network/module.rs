//! Network module with deferred startup lifecycle.
//!
//! `new()` allocates resources, `start()` binds the TCP listener, and
//! `serve()` accepts connections until shutdown. Between `start()` and
//! `serve()` the caller can report the bound port.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context as _;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::config::NetworkConfig;
use super::handlers::{
    events_handler, health_handler, list_operations_handler, liveness_handler, readiness_handler,
    submit_operation_handler, AppState,
};
use super::middleware::build_http_layers;
use crate::service::Dispatcher;
use crate::shutdown::ShutdownController;
use crate::sink::BroadcastEventSink;

/// Manages the HTTP server lifecycle.
pub struct NetworkModule {
    config: NetworkConfig,
    listener: Option<TcpListener>,
    shutdown: Arc<ShutdownController>,
}

impl NetworkModule {
    /// Creates the module without binding any port.
    #[must_use]
    pub fn new(config: NetworkConfig, shutdown: Arc<ShutdownController>) -> Self {
        Self {
            config,
            listener: None,
            shutdown,
        }
    }

    /// Assembles the axum router with all routes and middleware.
    ///
    /// Routes:
    /// - `POST /operations` -- dispatch an operation
    /// - `GET /operations` -- list the operations table
    /// - `GET /events` -- SSE stream of operation events
    /// - `GET /health` -- detailed health JSON
    /// - `GET /health/live` -- liveness probe
    /// - `GET /health/ready` -- readiness probe
    pub fn build_router(
        &self,
        dispatcher: Arc<Dispatcher>,
        events: Arc<BroadcastEventSink>,
    ) -> Router {
        let state = AppState {
            dispatcher,
            events,
            shutdown: Arc::clone(&self.shutdown),
            start_time: Instant::now(),
        };

        Router::new()
            .route(
                "/operations",
                get(list_operations_handler).post(submit_operation_handler),
            )
            .route("/events", get(events_handler))
            .route("/health", get(health_handler))
            .route("/health/live", get(liveness_handler))
            .route("/health/ready", get(readiness_handler))
            .layer(build_http_layers(&self.config))
            .with_state(state)
    }

    /// Binds the TCP listener and returns the bound port.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound (e.g., port in use).
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        let port = listener.local_addr()?.port();

        info!(host = %self.config.host, port, "TCP listener bound");

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves requests until `signal` resolves, then shuts down in order:
    ///
    /// 1. Health moves to Draining and the dispatcher stops accepting work
    /// 2. Accepted operations finish and report, up to `drain_timeout`
    /// 3. Health moves to Stopped, which ends the open event streams
    /// 4. The HTTP server finishes its remaining connections
    ///
    /// # Errors
    ///
    /// Returns an error if `start()` was not called or the server hits a
    /// fatal I/O error.
    pub async fn serve(
        mut self,
        dispatcher: Arc<Dispatcher>,
        events: Arc<BroadcastEventSink>,
        signal: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let listener = self
            .listener
            .take()
            .context("start() must be called before serve()")?;
        let router = self.build_router(Arc::clone(&dispatcher), events);

        let shutdown_ctrl = Arc::clone(&self.shutdown);
        let drain_timeout = self.config.drain_timeout;
        let graceful = async move {
            signal.await;
            info!("shutdown signal received");
            shutdown_ctrl.trigger_shutdown();

            if tokio::time::timeout(drain_timeout, dispatcher.shutdown())
                .await
                .is_ok()
            {
                info!("all accepted operations reported");
            } else {
                warn!(
                    in_flight = shutdown_ctrl.in_flight_count(),
                    "drain timeout expired with operations still running"
                );
            }
            shutdown_ctrl.set_stopped();
        };

        self.shutdown.set_ready();
        info!("serving HTTP connections");

        axum::serve(listener, router)
            .with_graceful_shutdown(graceful)
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }
}
