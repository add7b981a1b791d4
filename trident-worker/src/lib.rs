//! Worker client contract: submits a single `AuthRequest` to exactly one
//! nozzle attempt and returns an `AuthResponse`. Two transports are
//! provided: [`InProcessWorkerClient`] calls the nozzle registry directly;
//! [`HttpWorkerClient`] submits to a remote webhook worker.

mod client;
mod egress;
mod error;
mod in_process;
mod webhook;

pub use client::WorkerClient;
pub use egress::EgressIp;
pub use error::WorkerError;
pub use in_process::InProcessWorkerClient;
pub use webhook::{HttpWorkerClient, DEFAULT_TOKEN_HEADER};
