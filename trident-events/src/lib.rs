//! At-least-once message bus abstraction shared by the task bus and the
//! result bus.
//!
//! A [`Bus<M>`] is a typed publish/subscribe channel where every received
//! message comes wrapped in a [`Delivery`] that must be acknowledged:
//! `ack` on success, `nack` to request redelivery after a transient
//! failure. A `Delivery` dropped without either is treated as an implicit
//! `nack` — a handler that panics or is cancelled mid-flight never silently
//! loses a message.
//!
//! [`local`] provides an in-process backend; durable backends (e.g. the
//! RabbitMQ-backed crate) implement the same [`Bus`]/[`Settle`] traits so
//! the scheduler and dispatcher are oblivious to transport.

pub mod local;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

pub use local::InMemoryBus;

/// Errors a [`Bus`] implementation can report.
#[derive(Debug)]
pub enum BusError {
    /// The bus has been closed (all publishers or all subscribers gone).
    Closed,
    /// The underlying transport failed (network, broker, serialization).
    Transport(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusError::Closed => write!(f, "bus: closed"),
            BusError::Transport(e) => write!(f, "bus: transport error: {e}"),
        }
    }
}

impl std::error::Error for BusError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BusError::Transport(e) => Some(e.as_ref()),
            BusError::Closed => None,
        }
    }
}

/// Backend-specific acknowledgement mechanics for a [`Delivery`].
///
/// Implemented once per [`Bus`] backend: the in-process bus requeues onto
/// its channel, a broker-backed bus calls the broker's ack/nack for the
/// delivery tag.
#[async_trait]
pub trait Settle<M: Send + 'static>: Send + Sync {
    async fn ack(&self, payload: M);
    async fn nack(&self, payload: M);
}

/// A received message, not yet acknowledged.
///
/// Exactly one of [`ack`](Delivery::ack)/[`nack`](Delivery::nack) should be
/// called. If a `Delivery` is dropped before either runs (handler panic,
/// task cancellation), it is nacked on the caller's behalf — this is what
/// makes the bus at-least-once rather than best-effort.
pub struct Delivery<M: Send + 'static> {
    payload: Option<M>,
    settler: Arc<dyn Settle<M>>,
    settled: bool,
}

impl<M: Send + 'static> Delivery<M> {
    /// Construct a delivery. Used by [`Bus`] implementations, not
    /// application code.
    pub fn new(payload: M, settler: Arc<dyn Settle<M>>) -> Self {
        Delivery {
            payload: Some(payload),
            settler,
            settled: false,
        }
    }

    pub fn payload(&self) -> &M {
        self.payload.as_ref().expect("payload taken from a settled Delivery")
    }

    /// Acknowledge successful processing. The message will not be redelivered.
    pub async fn ack(mut self) {
        self.settled = true;
        if let Some(payload) = self.payload.take() {
            self.settler.ack(payload).await;
        }
    }

    /// Request redelivery after a transient failure.
    pub async fn nack(mut self) {
        self.settled = true;
        if let Some(payload) = self.payload.take() {
            self.settler.nack(payload).await;
        }
    }
}

impl<M: Send + 'static> Drop for Delivery<M> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        if let Some(payload) = self.payload.take() {
            let settler = self.settler.clone();
            tokio::spawn(async move {
                settler.nack(payload).await;
            });
        }
    }
}

/// A typed, at-least-once publish/subscribe bus.
///
/// `M` is the wire message type (e.g. `AuthRequest`, `AuthResponse`).
/// Implementations must be safe to `publish`/`receive` concurrently from
/// many tasks.
#[async_trait]
pub trait Bus<M: Send + 'static>: Send + Sync {
    /// Publish a message. Returns once the bus has durably accepted it
    /// (for the in-memory backend: once it's queued; for a broker-backed
    /// one: once the broker has ack'd the publish).
    async fn publish(&self, msg: M) -> Result<(), BusError>;

    /// Receive the next message. Blocks until one is available or the bus
    /// is closed.
    async fn receive(&self) -> Result<Delivery<M>, BusError>;
}
