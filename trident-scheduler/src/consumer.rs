//! Consumer loop: drains the result bus, persisting `valid == true` rows
//! synchronously and handing everything else to the batched writer.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use trident_data::Datastore;
use trident_events::{Bus, BusError, Delivery};
use trident_types::{AuthResponse, ResultRow};

pub struct Consumer {
    pub result_bus: Arc<dyn Bus<AuthResponse>>,
    pub datastore: Arc<dyn Datastore>,
    pub batch_tx: mpsc::Sender<ResultRow>,
    pub cancel: CancellationToken,
}

impl Consumer {
    /// Runs until cancelled or the result bus closes.
    pub async fn run(&self) {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("consumer shutting down");
                    return;
                }
                received = self.result_bus.receive() => {
                    match received {
                        Ok(delivery) => self.handle_one(delivery).await,
                        Err(BusError::Closed) => {
                            tracing::info!("result bus closed, consumer stopping");
                            return;
                        }
                        Err(e) => tracing::error!(error = %e, "result bus receive failed"),
                    }
                }
            }
        }
    }

    async fn handle_one(&self, delivery: Delivery<AuthResponse>) {
        let row: ResultRow = delivery.payload().clone().into();

        if row.valid {
            match self.datastore.insert_result(&row).await {
                Ok(()) => {
                    delivery.ack().await;
                    return;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "synchronous insert of valid result failed, forwarding to batch writer");
                }
            }
        }

        if self.try_forward(row) {
            delivery.ack().await;
        } else {
            delivery.nack().await;
        }
    }

    /// Non-blocking handoff to the batched writer's bounded channel.
    fn try_forward(&self, row: ResultRow) -> bool {
        match self.batch_tx.try_send(row) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("batch writer channel full, nacking result for redelivery");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::error!("batch writer channel closed, nacking result for redelivery");
                false
            }
        }
    }
}
