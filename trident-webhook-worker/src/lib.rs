//! HTTP front door onto the in-process nozzle registry: a single
//! `POST /` endpoint that runs one [`trident_types::AuthRequest`] through
//! [`trident_worker::InProcessWorkerClient`] and returns the
//! [`trident_types::AuthResponse`], guarded by a shared-secret
//! `X-Access-Token` header. `GET /healthz` is unauthenticated and always
//! returns 200.

mod auth;
mod handlers;
mod router;
mod state;

pub use router::build_router;
pub use state::WorkerState;
