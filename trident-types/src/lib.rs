//! Shared data model for the Trident campaign scheduler + dispatch pipeline.
//!
//! This crate is intentionally free of I/O — it defines the wire and
//! persistence shapes (`Campaign`, `Task`/`AuthRequest`, `AuthResponse`,
//! `ResultRow`) shared by every other crate in the workspace.

mod campaign;
mod response;
mod result_row;
mod task;

pub use campaign::{Campaign, CampaignStatus, CampaignValidationError, MAX_CREDENTIAL_LEN};
pub use response::AuthResponse;
pub use result_row::{authoritative, ResultRow};
pub use task::{AuthRequest, Task, TaskKey};

pub mod prelude {
    pub use crate::{
        authoritative, AuthRequest, AuthResponse, Campaign, CampaignStatus,
        CampaignValidationError, ResultRow, Task, TaskKey,
    };
}
