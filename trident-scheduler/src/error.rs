use trident_data::DataError;
use trident_types::{CampaignStatus, CampaignValidationError};
use uuid::Uuid;

/// Errors surfaced by the scheduler's campaign-lifecycle operations.
#[derive(Debug)]
pub enum SchedulerError {
    InvalidCampaign(CampaignValidationError),
    Data(DataError),
    CampaignNotFound(Uuid),
    InvalidTransition { from: CampaignStatus, to: CampaignStatus },
}

impl std::fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulerError::InvalidCampaign(e) => write!(f, "invalid campaign: {e}"),
            SchedulerError::Data(e) => write!(f, "datastore error: {e}"),
            SchedulerError::CampaignNotFound(id) => write!(f, "campaign not found: {id}"),
            SchedulerError::InvalidTransition { from, to } => {
                write!(f, "cannot transition campaign from {from:?} to {to:?}")
            }
        }
    }
}

impl std::error::Error for SchedulerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SchedulerError::InvalidCampaign(e) => Some(e),
            SchedulerError::Data(e) => Some(e),
            _ => None,
        }
    }
}
