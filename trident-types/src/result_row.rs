use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::response::AuthResponse;

/// A persisted attempt result: an [`AuthResponse`] plus a surrogate id and
/// insertion timestamp (spec §3's `Result`).
///
/// `(campaign_id, username, password)` may appear multiple times across
/// rows (retries on failure); downstream consumers treat the highest
/// `timestamp` per key as authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRow {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub campaign_id: Uuid,
    pub ip: String,
    pub timestamp: DateTime<Utc>,
    pub username: String,
    pub password: String,
    pub valid: bool,
    pub locked: bool,
    pub mfa: bool,
    pub rate_limited: bool,
    pub metadata: serde_json::Value,
}

impl From<AuthResponse> for ResultRow {
    fn from(r: AuthResponse) -> Self {
        ResultRow {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            campaign_id: r.campaign_id,
            ip: r.ip,
            timestamp: r.timestamp,
            username: r.username,
            password: r.password,
            valid: r.valid,
            locked: r.locked,
            mfa: r.mfa,
            rate_limited: r.rate_limited,
            metadata: r.metadata,
        }
    }
}

/// Given multiple rows for the same `(campaign_id, username, password)`,
/// pick the one with the highest `timestamp` as authoritative (spec §3).
pub fn authoritative(rows: &[ResultRow]) -> Option<&ResultRow> {
    rows.iter().max_by_key(|r| r.timestamp)
}
