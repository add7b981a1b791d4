use async_trait::async_trait;
use uuid::Uuid;

use trident_types::{Campaign, CampaignStatus, ResultRow};

use crate::error::DataError;

/// Durable storage for campaign metadata and attempt results.
///
/// Backend-agnostic: a concrete implementation (e.g. `trident-data-sqlx`)
/// owns the connection pool and SQL dialect. Writes go through either
/// [`Datastore::insert_result`] (single row, used for the synchronous
/// `valid == true` path) or [`Datastore::insert_results_batch`] (bulk
/// commit, used by the scheduler's batched result writer).
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Insert a newly-accepted campaign. Fails if a campaign with the same
    /// id already exists.
    async fn insert_campaign(&self, campaign: &Campaign) -> Result<(), DataError>;

    /// Look up a single campaign by id.
    async fn campaign(&self, id: Uuid) -> Result<Option<Campaign>, DataError>;

    /// All campaigns not in a terminal status, for re-expansion into the
    /// schedule store on orchestrator startup.
    async fn active_campaigns(&self) -> Result<Vec<Campaign>, DataError>;

    /// Transition a campaign's status. Callers are responsible for
    /// checking `CampaignStatus::can_transition_to` first; this call does
    /// not re-validate the transition.
    async fn set_campaign_status(&self, id: Uuid, status: CampaignStatus) -> Result<(), DataError>;

    /// Persist a single result row, synchronously. Used on the `valid ==
    /// true` path, where a result must never be lost to a batcher crash.
    async fn insert_result(&self, row: &ResultRow) -> Result<(), DataError>;

    /// Persist a batch of result rows in one transaction. Used by the
    /// batched writer for `valid == false` rows. A row whose individual
    /// insert fails does not abort the rest of the batch — it is returned
    /// in the `Ok` vector so the caller can re-queue it for the next
    /// batch. `Err` means the transaction itself (e.g. the final commit)
    /// failed, which callers treat as fatal.
    async fn insert_results_batch(&self, rows: &[ResultRow]) -> Result<Vec<ResultRow>, DataError>;
}
