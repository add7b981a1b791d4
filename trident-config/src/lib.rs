//! Environment-variable configuration loading for the Trident binaries.
//!
//! Each binary gets its own config struct and a `load()` that reads `.env`
//! (if present, via `dotenvy`) then the process environment. A missing
//! required variable is a [`ConfigError::Missing`] — a configuration
//! failure at startup is fatal, and the binary should log and exit
//! rather than run with a guessed default.

mod dispatcher;
mod env;
mod error;
mod logging;
mod orchestrator;
mod webhook_worker;

pub use dispatcher::DispatcherConfig;
pub use error::ConfigError;
pub use logging::init_tracing;
pub use orchestrator::OrchestratorConfig;
pub use webhook_worker::WebhookWorkerConfig;
