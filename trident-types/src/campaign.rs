use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum length, in bytes, of a single username or password in a campaign.
pub const MAX_CREDENTIAL_LEN: usize = 255;

/// Lifecycle status of a [`Campaign`].
///
/// Transitions form a DAG: `Active <-> Paused`, `Active|Paused -> Cancelled`,
/// `Active -> Completed`. No transitions are possible out of a terminal
/// state (`Cancelled`, `Completed`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Active,
    Paused,
    Cancelled,
    Completed,
}

impl CampaignStatus {
    /// Whether this status may transition to `to`.
    pub fn can_transition_to(self, to: CampaignStatus) -> bool {
        use CampaignStatus::*;
        matches!(
            (self, to),
            (Active, Paused)
                | (Paused, Active)
                | (Active, Cancelled)
                | (Paused, Cancelled)
                | (Active, Completed)
        )
    }

    /// Terminal statuses never produce new tasks.
    pub fn is_terminal(self) -> bool {
        matches!(self, CampaignStatus::Cancelled | CampaignStatus::Completed)
    }
}

/// An operator-declared cross product of users x passwords against one
/// identity provider, bounded in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub created_by: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    #[serde(with = "duration_ns")]
    pub schedule_interval: Duration,
    pub users: Vec<String>,
    pub passwords: Vec<String>,
    pub provider: String,
    pub provider_metadata: HashMap<String, String>,
    pub status: CampaignStatus,
}

/// Errors returned by [`Campaign::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CampaignValidationError {
    WindowInverted,
    ZeroInterval,
    NoUsers,
    NoPasswords,
    CredentialTooLong { value: String },
}

impl std::fmt::Display for CampaignValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CampaignValidationError::WindowInverted => {
                write!(f, "not_before must be strictly before not_after")
            }
            CampaignValidationError::ZeroInterval => {
                write!(f, "schedule_interval must be greater than zero")
            }
            CampaignValidationError::NoUsers => write!(f, "users must be non-empty"),
            CampaignValidationError::NoPasswords => write!(f, "passwords must be non-empty"),
            CampaignValidationError::CredentialTooLong { value } => write!(
                f,
                "credential exceeds {MAX_CREDENTIAL_LEN} chars: {value:.32}..."
            ),
        }
    }
}

impl std::error::Error for CampaignValidationError {}

impl Campaign {
    /// Validate the invariants from the campaign data model: `not_before <
    /// not_after`, `schedule_interval > 0`, non-empty users/passwords, each
    /// credential at most [`MAX_CREDENTIAL_LEN`] characters.
    pub fn validate(&self) -> Result<(), CampaignValidationError> {
        if self.not_before >= self.not_after {
            return Err(CampaignValidationError::WindowInverted);
        }
        if self.schedule_interval.is_zero() {
            return Err(CampaignValidationError::ZeroInterval);
        }
        if self.users.is_empty() {
            return Err(CampaignValidationError::NoUsers);
        }
        if self.passwords.is_empty() {
            return Err(CampaignValidationError::NoPasswords);
        }
        for value in self.users.iter().chain(self.passwords.iter()) {
            if value.chars().count() > MAX_CREDENTIAL_LEN {
                return Err(CampaignValidationError::CredentialTooLong {
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Serializes a [`Duration`] as integer nanoseconds, matching the
/// schedule-store wire format's `schedule_interval_ns` column (spec §6).
mod duration_ns {
    use super::Duration;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        (d.as_nanos() as u64).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let nanos = u64::deserialize(d)?;
        Ok(Duration::from_nanos(nanos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_campaign() -> Campaign {
        let now = Utc::now();
        Campaign {
            id: Uuid::new_v4(),
            created_by: "operator".into(),
            not_before: now,
            not_after: now + chrono::Duration::seconds(10),
            schedule_interval: Duration::from_secs(1),
            users: vec!["a".into()],
            passwords: vec!["p1".into(), "p2".into()],
            provider: "okta".into(),
            provider_metadata: HashMap::new(),
            status: CampaignStatus::Active,
        }
    }

    #[test]
    fn valid_campaign_passes() {
        assert!(base_campaign().validate().is_ok());
    }

    #[test]
    fn inverted_window_rejected() {
        let mut c = base_campaign();
        c.not_after = c.not_before;
        assert_eq!(c.validate(), Err(CampaignValidationError::WindowInverted));
    }

    #[test]
    fn zero_interval_rejected() {
        let mut c = base_campaign();
        c.schedule_interval = Duration::ZERO;
        assert_eq!(c.validate(), Err(CampaignValidationError::ZeroInterval));
    }

    #[test]
    fn empty_users_rejected() {
        let mut c = base_campaign();
        c.users.clear();
        assert_eq!(c.validate(), Err(CampaignValidationError::NoUsers));
    }

    #[test]
    fn empty_passwords_rejected() {
        let mut c = base_campaign();
        c.passwords.clear();
        assert_eq!(c.validate(), Err(CampaignValidationError::NoPasswords));
    }

    #[test]
    fn overlong_credential_rejected() {
        let mut c = base_campaign();
        c.users.push("x".repeat(256));
        assert!(matches!(
            c.validate(),
            Err(CampaignValidationError::CredentialTooLong { .. })
        ));
    }

    #[test]
    fn status_transitions() {
        use CampaignStatus::*;
        assert!(Active.can_transition_to(Paused));
        assert!(Paused.can_transition_to(Active));
        assert!(Active.can_transition_to(Cancelled));
        assert!(Paused.can_transition_to(Cancelled));
        assert!(Active.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Active));
        assert!(!Cancelled.can_transition_to(Active));
        assert!(!Paused.can_transition_to(Completed));
    }

    #[test]
    fn terminal_statuses() {
        assert!(CampaignStatus::Cancelled.is_terminal());
        assert!(CampaignStatus::Completed.is_terminal());
        assert!(!CampaignStatus::Active.is_terminal());
        assert!(!CampaignStatus::Paused.is_terminal());
    }
}
