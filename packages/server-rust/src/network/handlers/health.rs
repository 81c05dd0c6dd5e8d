//! Health, liveness, and readiness endpoint handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;

use super::AppState;
use crate::shutdown::HealthState;

/// Returns detailed health information as JSON.
///
/// Always returns 200; the `state` field says whether the adapter is
/// accepting operations.
pub async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let health = state.shutdown.health_state();

    Json(json!({
        "state": health.as_str(),
        "accepting_operations": state.dispatcher.is_accepting(),
        "in_flight": state.shutdown.in_flight_count(),
        "event_subscribers": state.events.subscriber_count(),
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}

/// Liveness probe: always 200 while the process responds.
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe: 200 when ready, 503 while starting or shutting down.
pub async fn readiness_handler(State(state): State<AppState>) -> StatusCode {
    if state.shutdown.health_state() == HealthState::Ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
