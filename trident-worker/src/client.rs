use async_trait::async_trait;
use trident_types::{AuthRequest, AuthResponse};

use crate::error::WorkerError;

/// Submits a single [`AuthRequest`] to exactly one authentication attempt
/// and returns the resulting [`AuthResponse`].
///
/// Every implementation must enrich the response with the request's
/// `campaign_id`/`username`/`password`, a `timestamp` taken the instant
/// the attempt completed, and the worker's own egress `ip`.
#[async_trait]
pub trait WorkerClient: Send + Sync {
    async fn submit(&self, req: AuthRequest) -> Result<AuthResponse, WorkerError>;
}
