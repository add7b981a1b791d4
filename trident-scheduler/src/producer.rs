//! Producer loop: releases ready tasks onto the task bus at roughly their
//! scheduled instant, fairly across campaigns.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use trident_data::Datastore;
use trident_events::Bus;
use trident_schedule_store::{PopOutcome, ScheduleStore};
use trident_types::{AuthRequest, CampaignStatus, Task};

/// How many campaign ids the producer inspects per `list_campaigns` call.
const LIST_CHUNK: usize = 10;
/// `pop_min_blocking`'s timeout — expected to elapse normally when a
/// campaign's queue is momentarily empty.
const POP_TIMEOUT: Duration = Duration::from_secs(5);
/// A task is "ready" once its `not_before` is within this window of now.
/// Compensates for bus + dispatcher latency between release and execution.
const EARLY_RELEASE_WINDOW: Duration = Duration::from_secs(5);
/// Backoff applied after re-pushing a task that wasn't ready yet.
const NOT_READY_BACKOFF: Duration = Duration::from_secs(1);
/// Backoff applied when no campaign currently has a queued task.
const IDLE_BACKOFF: Duration = Duration::from_millis(200);

pub struct Producer {
    pub store: ScheduleStore,
    pub task_bus: Arc<dyn Bus<AuthRequest>>,
    pub datastore: Arc<dyn Datastore>,
    pub cancel: CancellationToken,
}

impl Producer {
    /// Runs until cancelled.
    pub async fn run(&self) {
        let mut cursor = 0usize;
        loop {
            if self.cancel.is_cancelled() {
                return;
            }

            let (campaign_ids, next_cursor) = self.store.list_campaigns(cursor, LIST_CHUNK);
            cursor = next_cursor;

            let Some(chosen) = self.pick_smallest(&campaign_ids) else {
                if sleep_or_cancelled(&self.cancel, IDLE_BACKOFF).await {
                    return;
                }
                continue;
            };

            match self.store.pop_min_blocking(chosen, POP_TIMEOUT).await {
                PopOutcome::Timeout => continue,
                PopOutcome::Task(_, task) => self.handle_popped(chosen, task).await,
            }
        }
    }

    /// Among the listed campaigns, the one whose current minimum score is
    /// smallest — fair scheduling across campaigns, ties broken
    /// arbitrarily.
    fn pick_smallest(&self, campaign_ids: &[Uuid]) -> Option<Uuid> {
        campaign_ids
            .iter()
            .copied()
            .filter_map(|cid| self.store.peek_min(cid).map(|(score, _)| (cid, score)))
            .min_by_key(|(_, score)| *score)
            .map(|(cid, _)| cid)
    }

    async fn handle_popped(&self, campaign_id: Uuid, task: Task) {
        match self.datastore.campaign(campaign_id).await {
            Ok(Some(campaign)) => match campaign.status {
                CampaignStatus::Cancelled | CampaignStatus::Completed => {
                    tracing::debug!(campaign_id = %campaign_id, status = ?campaign.status, "campaign in a terminal state, dropping task");
                    return;
                }
                CampaignStatus::Paused => {
                    self.store.push(campaign_id, task);
                    sleep_or_cancelled(&self.cancel, NOT_READY_BACKOFF).await;
                    return;
                }
                CampaignStatus::Active => {}
            },
            Ok(None) => {
                tracing::warn!(campaign_id = %campaign_id, "campaign missing from datastore, dropping task");
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, campaign_id = %campaign_id, "failed to check campaign status, re-pushing task");
                self.store.push(campaign_id, task);
                return;
            }
        }

        let now = Utc::now();
        let early_release_cutoff = now + chrono::Duration::from_std(EARLY_RELEASE_WINDOW).unwrap();
        if early_release_cutoff < task.not_before {
            self.store.push(campaign_id, task);
            sleep_or_cancelled(&self.cancel, NOT_READY_BACKOFF).await;
            return;
        }

        if let Err(e) = self.task_bus.publish(task.clone()).await {
            tracing::warn!(error = %e, campaign_id = %campaign_id, "publish failed, re-pushing task");
            self.store.push(campaign_id, task);
        }
    }
}

/// Sleeps for `dur` unless cancelled first; returns whether cancellation
/// won the race.
async fn sleep_or_cancelled(cancel: &CancellationToken, dur: Duration) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => true,
        _ = tokio::time::sleep(dur) => false,
    }
}
