//! In-process, competing-consumer bus backend.
//!
//! Backed by an unbounded MPSC channel shared behind a mutex so that many
//! concurrent `receive` callers (e.g. a dispatcher's in-flight handler
//! pool) compete for the same stream of messages, rather than each
//! getting their own copy — this is a work queue, not a broadcast.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use crate::{Bus, BusError, Delivery, Settle};

struct LocalSettle<M> {
    redeliver: mpsc::UnboundedSender<M>,
}

#[async_trait]
impl<M: Send + 'static> Settle<M> for LocalSettle<M> {
    async fn ack(&self, _payload: M) {}

    async fn nack(&self, payload: M) {
        let _ = self.redeliver.send(payload);
    }
}

/// An in-memory [`Bus`]. The default backend for tests and for running the
/// whole pipeline on a single process without an external broker.
pub struct InMemoryBus<M> {
    sender: mpsc::UnboundedSender<M>,
    receiver: Mutex<mpsc::UnboundedReceiver<M>>,
}

impl<M: Send + 'static> InMemoryBus<M> {
    pub fn new() -> Arc<Self> {
        let (sender, receiver) = mpsc::unbounded_channel();
        Arc::new(Self {
            sender,
            receiver: Mutex::new(receiver),
        })
    }
}

#[async_trait]
impl<M: Send + 'static> Bus<M> for InMemoryBus<M> {
    async fn publish(&self, msg: M) -> Result<(), BusError> {
        self.sender.send(msg).map_err(|_| BusError::Closed)
    }

    async fn receive(&self) -> Result<Delivery<M>, BusError> {
        let mut receiver = self.receiver.lock().await;
        let msg = receiver.recv().await.ok_or(BusError::Closed)?;
        let settler = Arc::new(LocalSettle {
            redeliver: self.sender.clone(),
        });
        Ok(Delivery::new(msg, settler))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn publish_then_receive() {
        let bus = InMemoryBus::<u32>::new();
        bus.publish(42).await.unwrap();
        let delivery = bus.receive().await.unwrap();
        assert_eq!(*delivery.payload(), 42);
        delivery.ack().await;
    }

    #[tokio::test]
    async fn nacked_message_is_redelivered() {
        let bus = InMemoryBus::<u32>::new();
        bus.publish(42).await.unwrap();

        let first = bus.receive().await.unwrap();
        assert_eq!(*first.payload(), 42);
        first.nack().await;

        let second = bus.receive().await.unwrap();
        assert_eq!(*second.payload(), 42);
        second.ack().await;
    }

    #[tokio::test]
    async fn dropped_delivery_is_redelivered() {
        let bus = InMemoryBus::<u32>::new();
        bus.publish(42).await.unwrap();

        {
            let _first = bus.receive().await.unwrap();
            // dropped mid-flight, e.g. a panicking or cancelled handler
        }

        let second = tokio::time::timeout(Duration::from_millis(200), bus.receive())
            .await
            .expect("message should have been redelivered")
            .unwrap();
        assert_eq!(*second.payload(), 42);
        second.ack().await;
    }

    #[tokio::test]
    async fn many_consumers_compete_for_one_stream() {
        let bus = InMemoryBus::<u32>::new();
        for i in 0..4u32 {
            bus.publish(i).await.unwrap();
        }

        let mut seen = Vec::new();
        for _ in 0..4 {
            let delivery = bus.receive().await.unwrap();
            seen.push(*delivery.payload());
            delivery.ack().await;
        }
        seen.sort();
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }
}
