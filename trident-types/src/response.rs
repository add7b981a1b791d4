use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The response to a single authentication attempt (spec §6's result-bus
/// message, before persistence).
///
/// Invariant: at most one of `valid`/`rate_limited` should be true;
/// `locked` and `mfa` are independent flags and may both be set alongside
/// either.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub campaign_id: Uuid,
    pub username: String,
    pub password: String,
    pub timestamp: DateTime<Utc>,
    pub ip: String,
    pub valid: bool,
    pub locked: bool,
    pub mfa: bool,
    pub rate_limited: bool,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl AuthResponse {
    /// `valid` and `rate_limited` should never both be set; nozzles that
    /// cannot disambiguate a response must return an error instead of
    /// producing a response that violates this.
    pub fn is_well_formed(&self) -> bool {
        !(self.valid && self.rate_limited)
    }
}
