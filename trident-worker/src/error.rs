use std::fmt;

/// Errors from a [`crate::WorkerClient::submit`] call.
///
/// Every variant here is treated as transient by the dispatcher (nack,
/// retry via bus redelivery) — a worker has no notion of a "fatal" single
/// attempt; only the nozzle registry's `UnknownDriver` during setup is
/// fatal, and that surfaces before a worker is ever constructed.
#[derive(Debug)]
pub enum WorkerError {
    /// The in-process path failed to open or run the named nozzle.
    Nozzle(String),
    /// The HTTP path couldn't reach the remote worker, or it returned a
    /// non-2xx response.
    Transport(String),
    /// The remote worker's response body didn't decode as `AuthResponse`.
    Decode(String),
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerError::Nozzle(msg) => write!(f, "worker: nozzle error: {msg}"),
            WorkerError::Transport(msg) => write!(f, "worker: transport error: {msg}"),
            WorkerError::Decode(msg) => write!(f, "worker: response decode error: {msg}"),
        }
    }
}

impl std::error::Error for WorkerError {}
