//! Route handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{Instrument, error, info_span, warn};
use uuid::Uuid;

use super::AppState;
use crate::error::{PipelineError, VerificationError};
use crate::pipeline::types::SubmitPayload;

/// GET /
pub(super) async fn health() -> &'static str {
    "OK"
}

/// POST /api/submit
///
/// The pipeline runs in its own task: once started, verification and
/// delivery finish even if the client hangs up.
pub(super) async fn submit(
    State(state): State<AppState>,
    payload: Result<Json<SubmitPayload>, JsonRejection>,
) -> Response {
    let request_id = Uuid::new_v4();
    let span = info_span!("submission", %request_id);

    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            span.in_scope(|| warn!(status = %rejection.status(), "Malformed request body"));
            return error_response(StatusCode::BAD_REQUEST, "Invalid request body");
        }
    };

    let (request, token) = payload.into_parts();
    let pipeline = Arc::clone(&state.pipeline);
    let task = tokio::spawn(
        async move { pipeline.process(request, token).await }.instrument(span.clone()),
    );

    match task.await {
        Ok(Ok(_receipt)) => (
            StatusCode::OK,
            Json(json!({ "ok": true, "id": request_id })),
        )
            .into_response(),
        Ok(Err(e)) => {
            span.in_scope(|| pipeline_error_response(&e, state.expose_verification_details))
        }
        Err(e) => {
            span.in_scope(|| error!(error = %e, "Submission task failed"));
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

/// Log the full error, answer with the terse one.
fn pipeline_error_response(e: &PipelineError, expose_details: bool) -> Response {
    let status = e.status();
    if status.is_server_error() {
        error!(kind = e.kind(), status = status.as_u16(), error = %e, "Submission failed");
    } else {
        warn!(kind = e.kind(), status = status.as_u16(), error = %e, "Submission rejected");
    }

    if expose_details
        && let PipelineError::Verification(VerificationError::BotCheckFailed {
            score, action, ..
        }) = e
    {
        return (
            status,
            Json(json!({
                "error": e.public_message(),
                "score": score,
                "action": action,
            })),
        )
            .into_response();
    }

    error_response(status, &e.public_message())
}

/// `{"error": message}` with the given status.
pub(crate) fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
