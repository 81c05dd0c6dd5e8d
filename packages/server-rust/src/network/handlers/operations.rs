//! Operation submission and catalogue listing.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use nsm_adapter_core::OperationRequest;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use super::AppState;

/// `POST /operations`: dispatches one operation request.
///
/// Answers `202` with the operation id once the request is queued or
/// rejected; the outcome itself is delivered on `/events`. Answers `500` when
/// the operations table cannot be read.
pub async fn submit_operation_handler(
    State(state): State<AppState>,
    Json(mut request): Json<OperationRequest>,
) -> Response {
    if request.operation_id.is_empty() {
        request.operation_id = Uuid::new_v4().to_string();
    }
    let operation_id = request.operation_id.clone();

    match state.dispatcher.apply_operation(request).await {
        Ok(()) => (
            StatusCode::ACCEPTED,
            Json(json!({ "operation_id": operation_id })),
        )
            .into_response(),
        Err(err) => {
            error!(operation_id = %operation_id, error = %err, "dispatch failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response()
        }
    }
}

/// `GET /operations`: the operations table the adapter serves.
pub async fn list_operations_handler(State(state): State<AppState>) -> Response {
    match state.dispatcher.operations() {
        Ok(operations) => Json(operations).into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
    }
}
