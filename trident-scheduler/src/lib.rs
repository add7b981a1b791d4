//! Campaign scheduler: owns campaign expansion into tasks, the producer
//! loop that releases ready tasks onto the task bus, the consumer loop
//! that drains results into the datastore, and the batched result writer
//! those results funnel through.

mod batch_writer;
mod consumer;
mod error;
mod expand;
mod producer;

pub use batch_writer::{BATCH_MAX_ROWS, BATCH_MAX_WAIT};
pub use consumer::Consumer;
pub use error::SchedulerError;
pub use expand::expand_campaign;
pub use producer::Producer;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use trident_data::Datastore;
use trident_events::Bus;
use trident_schedule_store::ScheduleStore;
use trident_types::{AuthRequest, AuthResponse, Campaign};

/// Handle to a running [`Scheduler`]: cloneable, lets any caller observe
/// or trigger shutdown without holding the scheduler itself.
#[derive(Clone)]
pub struct SchedulerHandle {
    cancel: CancellationToken,
}

impl SchedulerHandle {
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    /// Cancel the scheduler's producer, consumer, and batched writer.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Owns campaign expansion, the producer/consumer loops, and the batched
/// writer. One instance per orchestrator process.
pub struct Scheduler {
    store: ScheduleStore,
    task_bus: Arc<dyn Bus<AuthRequest>>,
    result_bus: Arc<dyn Bus<AuthResponse>>,
    datastore: Arc<dyn Datastore>,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new(
        store: ScheduleStore,
        task_bus: Arc<dyn Bus<AuthRequest>>,
        result_bus: Arc<dyn Bus<AuthResponse>>,
        datastore: Arc<dyn Datastore>,
    ) -> Self {
        Self {
            store,
            task_bus,
            result_bus,
            datastore,
            cancel: CancellationToken::new(),
        }
    }

    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle::new(self.cancel.clone())
    }

    /// Re-expands every non-terminal campaign from the datastore into the
    /// schedule store. Call once at startup, before `run`, so an
    /// orchestrator restart picks up exactly where the in-memory queue
    /// left off.
    pub async fn restore(&self) -> Result<(), SchedulerError> {
        let campaigns = self.datastore.active_campaigns().await.map_err(SchedulerError::Data)?;
        for campaign in &campaigns {
            for task in expand_campaign(campaign) {
                self.store.push(campaign.id, task);
            }
        }
        tracing::info!(count = campaigns.len(), "restored campaigns into schedule store");
        Ok(())
    }

    /// Accepts a newly-submitted campaign: validates it, persists it, and
    /// expands it into the schedule store.
    pub async fn submit_campaign(&self, campaign: &Campaign) -> Result<(), SchedulerError> {
        campaign.validate().map_err(SchedulerError::InvalidCampaign)?;
        self.datastore.insert_campaign(campaign).await.map_err(SchedulerError::Data)?;
        for task in expand_campaign(campaign) {
            self.store.push(campaign.id, task);
        }
        Ok(())
    }

    /// Pause an active campaign: the producer re-pushes any task it pops
    /// for this campaign rather than publishing it.
    pub async fn pause_campaign(&self, id: Uuid) -> Result<(), SchedulerError> {
        self.transition(id, trident_types::CampaignStatus::Paused).await
    }

    /// Resume a paused campaign. Tasks whose release time passed during
    /// the pause release immediately, in whatever order the queue
    /// naturally yields — no catch-up compression.
    pub async fn resume_campaign(&self, id: Uuid) -> Result<(), SchedulerError> {
        self.transition(id, trident_types::CampaignStatus::Active).await
    }

    /// Cancel a campaign. Its queue drains lazily: the producer drops
    /// each of its tasks as they come up for release rather than being
    /// swept eagerly. In-flight tasks already on the bus complete
    /// normally and their results are still persisted.
    pub async fn cancel_campaign(&self, id: Uuid) -> Result<(), SchedulerError> {
        self.transition(id, trident_types::CampaignStatus::Cancelled).await
    }

    async fn transition(&self, id: Uuid, to: trident_types::CampaignStatus) -> Result<(), SchedulerError> {
        let campaign = self
            .datastore
            .campaign(id)
            .await
            .map_err(SchedulerError::Data)?
            .ok_or(SchedulerError::CampaignNotFound(id))?;

        if !campaign.status.can_transition_to(to) {
            return Err(SchedulerError::InvalidTransition { from: campaign.status, to });
        }

        self.datastore.set_campaign_status(id, to).await.map_err(SchedulerError::Data)
    }

    /// Runs the producer loop, consumer loop, and batched writer
    /// concurrently until cancelled.
    pub async fn run(&self) {
        let (batch_tx, batch_handle) = batch_writer::spawn(self.datastore.clone(), self.cancel.clone());

        let producer = Producer {
            store: self.store.clone(),
            task_bus: self.task_bus.clone(),
            datastore: self.datastore.clone(),
            cancel: self.cancel.clone(),
        };
        let consumer = Consumer {
            result_bus: self.result_bus.clone(),
            datastore: self.datastore.clone(),
            batch_tx,
            cancel: self.cancel.clone(),
        };

        tokio::join!(producer.run(), consumer.run());

        self.cancel.cancel();
        if let Err(e) = batch_handle.await {
            tracing::error!(error = %e, "batched writer task panicked");
        }
    }
}
