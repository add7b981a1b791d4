//! The dispatcher: a long-lived loop bound to a single task-bus
//! subscription. Each received task is submitted to a worker and the
//! resulting response is published to the result bus.
//!
//! State machine per message: received -> submitted -> published -> acked
//! (a transient failure at any step nacks instead, kicking the message
//! back to bus redelivery). A task already past its deadline when it's
//! received is acked and dropped without ever reaching the worker —
//! that's `received -> acked` directly.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use trident_events::{Bus, BusError, Delivery};
use trident_types::{AuthRequest, AuthResponse};
use trident_worker::WorkerClient;

/// Default bound on concurrent in-flight task handlers per dispatcher —
/// a fairness knob so one slow nozzle can't starve the others sharing
/// this process, not a performance ceiling.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 10;

pub struct Dispatcher {
    worker: Arc<dyn WorkerClient>,
    task_bus: Arc<dyn Bus<AuthRequest>>,
    result_bus: Arc<dyn Bus<AuthResponse>>,
    max_in_flight: usize,
    cancel: CancellationToken,
}

impl Dispatcher {
    pub fn new(
        worker: Arc<dyn WorkerClient>,
        task_bus: Arc<dyn Bus<AuthRequest>>,
        result_bus: Arc<dyn Bus<AuthResponse>>,
        cancel: CancellationToken,
    ) -> Self {
        Dispatcher {
            worker,
            task_bus,
            result_bus,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            cancel,
        }
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    /// Runs until cancelled or the task bus closes.
    pub async fn run(&self) {
        let semaphore = Arc::new(Semaphore::new(self.max_in_flight));

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("dispatcher shutting down");
                    return;
                }
                received = self.task_bus.receive() => {
                    match received {
                        Ok(delivery) => {
                            let permit = semaphore.clone().acquire_owned().await.expect("semaphore never closed");
                            let worker = self.worker.clone();
                            let result_bus = self.result_bus.clone();
                            tokio::spawn(async move {
                                handle_one(delivery, worker, result_bus).await;
                                drop(permit);
                            });
                        }
                        Err(BusError::Closed) => {
                            tracing::info!("task bus closed, dispatcher stopping");
                            return;
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "task bus receive failed");
                        }
                    }
                }
            }
        }
    }
}

async fn handle_one(delivery: Delivery<AuthRequest>, worker: Arc<dyn WorkerClient>, result_bus: Arc<dyn Bus<AuthResponse>>) {
    if delivery.payload().is_expired(Utc::now()) {
        tracing::debug!(campaign_id = %delivery.payload().campaign_id, "task expired in-flight, dropping");
        delivery.ack().await;
        return;
    }

    let req = delivery.payload().clone();
    match worker.submit(req).await {
        Ok(resp) => match result_bus.publish(resp).await {
            Ok(()) => delivery.ack().await,
            Err(e) => {
                tracing::warn!(error = %e, "failed to publish result, nacking task for redelivery");
                delivery.nack().await;
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "worker submit failed, nacking for redelivery");
            delivery.nack().await;
        }
    }
}
