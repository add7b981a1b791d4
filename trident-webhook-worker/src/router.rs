use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{handle_event, healthz};
use crate::state::WorkerState;

pub fn build_router(state: WorkerState) -> Router {
    Router::new()
        .route("/", post(handle_event))
        .route("/healthz", get(healthz))
        .with_state(state)
}
