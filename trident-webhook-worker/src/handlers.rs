use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use trident_types::AuthRequest;
use trident_worker::WorkerClient;

use crate::auth::RequireAccessToken;
use crate::state::WorkerState;

pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

pub async fn handle_event(
    _auth: RequireAccessToken,
    State(state): State<WorkerState>,
    Json(req): Json<AuthRequest>,
) -> Result<impl IntoResponse, EventError> {
    let resp = state.worker.submit(req).await.map_err(|e| EventError(e.to_string()))?;
    Ok(Json(resp))
}

/// A single attempt failed in a way that has nothing to do with the
/// credential being tried (nozzle couldn't open, transport down, bad
/// decode) — surfaced as a 500 so the caller retries rather than
/// mistaking it for a definitive auth result.
pub struct EventError(String);

impl IntoResponse for EventError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": self.0 }))).into_response()
    }
}
