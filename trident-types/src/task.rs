use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single scheduled (user, password) attempt within a campaign.
///
/// Tasks have no standalone persistent identity — identity is
/// `(campaign_id, username, password)` (see [`Task::key`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub campaign_id: Uuid,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub username: String,
    pub password: String,
    pub provider: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Identity of a task: `(campaign_id, username, password)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskKey {
    pub campaign_id: Uuid,
    pub username: String,
    pub password: String,
}

impl Task {
    pub fn key(&self) -> TaskKey {
        TaskKey {
            campaign_id: self.campaign_id,
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }

    /// A task is expired once `now` passes its campaign's drop deadline.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.not_after
    }
}

/// Serialized [`Task`] sent on the task bus (spec §6's task-bus message).
///
/// Structurally identical to `Task` — kept as a distinct name because the
/// spec treats `AuthRequest` as the wire contract and `Task` as the
/// schedule-store's in-memory element, even though today they carry the
/// same fields.
pub type AuthRequest = Task;
