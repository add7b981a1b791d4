//! A durable [`Bus`] backend over RabbitMQ (AMQP 0-9-1).
//!
//! One queue per bus instance, manual ack, persistent delivery mode —
//! messages survive a broker restart and a consumer crash redelivers
//! whatever it hadn't ack'd.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicPublishOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, Consumer};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;

use trident_events::{Bus, BusError, Delivery, Settle};

/// A [`Bus`] backed by a single durable RabbitMQ queue.
pub struct RabbitMqBus<M> {
    channel: Channel,
    queue: String,
    consumer: Mutex<Consumer>,
    _marker: PhantomData<fn() -> M>,
}

impl<M: Send + Sync + 'static> RabbitMqBus<M> {
    /// Connect to `amqp_uri`, declaring `queue` durable if it doesn't
    /// already exist, and open one consumer on it.
    pub async fn connect(amqp_uri: &str, queue: &str) -> Result<Arc<Self>, BusError> {
        let connection = Connection::connect(
            amqp_uri,
            ConnectionProperties::default()
                .with_executor(tokio_executor_trait::Tokio::current())
                .with_reactor(tokio_reactor_trait::Tokio),
        )
        .await
        .map_err(transport)?;

        let channel = connection.create_channel().await.map_err(transport)?;

        channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(transport)?;

        let consumer = channel
            .basic_consume(queue, "", BasicConsumeOptions::default(), FieldTable::default())
            .await
            .map_err(transport)?;

        Ok(Arc::new(Self {
            channel,
            queue: queue.to_string(),
            consumer: Mutex::new(consumer),
            _marker: PhantomData,
        }))
    }
}

fn transport(e: impl std::error::Error + Send + Sync + 'static) -> BusError {
    BusError::Transport(Box::new(e))
}

struct AmqpSettle {
    channel: Channel,
    delivery_tag: u64,
}

#[async_trait]
impl<M: Send + 'static> Settle<M> for AmqpSettle {
    async fn ack(&self, _payload: M) {
        if let Err(e) = self.channel.basic_ack(self.delivery_tag, BasicAckOptions::default()).await {
            tracing::warn!(error = %e, delivery_tag = self.delivery_tag, "failed to ack amqp delivery");
        }
    }

    async fn nack(&self, _payload: M) {
        let opts = BasicNackOptions {
            requeue: true,
            ..Default::default()
        };
        if let Err(e) = self.channel.basic_nack(self.delivery_tag, opts).await {
            tracing::warn!(error = %e, delivery_tag = self.delivery_tag, "failed to nack amqp delivery");
        }
    }
}

#[async_trait]
impl<M: Serialize + DeserializeOwned + Send + Sync + 'static> Bus<M> for RabbitMqBus<M> {
    async fn publish(&self, msg: M) -> Result<(), BusError> {
        let body = serde_json::to_vec(&msg).map_err(transport)?;
        self.channel
            .basic_publish(
                "",
                &self.queue,
                BasicPublishOptions::default(),
                &body,
                BasicProperties::default().with_delivery_mode(2),
            )
            .await
            .map_err(transport)?
            .await
            .map_err(transport)?;
        Ok(())
    }

    async fn receive(&self) -> Result<Delivery<M>, BusError> {
        let mut consumer = self.consumer.lock().await;
        loop {
            let delivery = consumer.next().await.ok_or(BusError::Closed)?.map_err(transport)?;

            match serde_json::from_slice::<M>(&delivery.data) {
                Ok(payload) => {
                    let settler = Arc::new(AmqpSettle {
                        channel: self.channel.clone(),
                        delivery_tag: delivery.delivery_tag,
                    });
                    return Ok(Delivery::new(payload, settler));
                }
                Err(e) => {
                    // Poison message: it will never decode no matter how
                    // many times it's redelivered, so ack it away here
                    // rather than handing callers something they can't
                    // even construct a Delivery<M> for.
                    tracing::warn!(error = %e, "dropping undecodable message");
                    if let Err(ack_err) = self.channel.basic_ack(delivery.delivery_tag, BasicAckOptions::default()).await {
                        tracing::warn!(error = %ack_err, "failed to ack undecodable message");
                    }
                }
            }
        }
    }
}

#[cfg(all(test, feature = "integration"))]
mod integration_tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Ping {
        id: u32,
    }

    async fn bus() -> Arc<RabbitMqBus<Ping>> {
        let uri = std::env::var("TRIDENT_AMQP_URL").expect("TRIDENT_AMQP_URL must be set for integration tests");
        let queue = format!("trident-test-{}", uuid::Uuid::new_v4());
        RabbitMqBus::connect(&uri, &queue).await.unwrap()
    }

    #[tokio::test]
    async fn publish_then_receive_round_trips() {
        let bus = bus().await;
        bus.publish(Ping { id: 1 }).await.unwrap();
        let delivery = bus.receive().await.unwrap();
        assert_eq!(delivery.payload(), &Ping { id: 1 });
        delivery.ack().await;
    }
}
