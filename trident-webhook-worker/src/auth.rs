use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use subtle::ConstantTimeEq;

use crate::state::WorkerState;

/// Extractor that rejects a request unless its `X-Access-Token` header
/// matches the configured token, compared in constant time so response
/// latency can't be used to recover the token byte by byte.
pub struct RequireAccessToken;

impl FromRequestParts<WorkerState> for RequireAccessToken {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &WorkerState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get("x-access-token")
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::Forbidden)?;

        if token.as_bytes().ct_eq(state.access_token.as_bytes()).into() {
            Ok(RequireAccessToken)
        } else {
            Err(AuthError::Forbidden)
        }
    }
}

pub enum AuthError {
    Forbidden,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (StatusCode::FORBIDDEN, Json(json!({ "error": "Forbidden" }))).into_response()
    }
}
