use std::collections::HashMap;

use crate::env::{optional, require};
use crate::error::ConfigError;

/// Configuration for the `trident-dispatcher` binary: which worker driver
/// to open (`"webhook"` for [`trident_worker::HttpWorkerClient`]-style
/// remote dispatch, any nozzle provider name for an in-process worker)
/// and that driver's opaque options.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub log_level: String,
    pub amqp_url: String,
    pub project_id: String,
    pub result_topic_id: String,
    pub subscription_id: String,
    pub worker_name: String,
    pub worker_config: HashMap<String, String>,
}

impl DispatcherConfig {
    /// Loads from the environment (and `.env`, if present). `worker_config`
    /// is read as a JSON object, matching the system this was modeled on
    /// encoding its options map the same way over the wire.
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let worker_config_raw = require("DISPATCHER_WORKER_CONFIG")?;
        let worker_config: HashMap<String, String> =
            serde_json::from_str(&worker_config_raw).map_err(|e| ConfigError::Invalid {
                var: "DISPATCHER_WORKER_CONFIG".to_string(),
                reason: e.to_string(),
            })?;

        Ok(DispatcherConfig {
            log_level: optional("DISPATCHER_LOG_LEVEL", "info"),
            amqp_url: require("DISPATCHER_AMQP_URL")?,
            project_id: require("DISPATCHER_PROJECT_ID")?,
            result_topic_id: require("DISPATCHER_RESULT_TOPIC_ID")?,
            subscription_id: require("DISPATCHER_SUBSCRIPTION_ID")?,
            worker_name: require("DISPATCHER_WORKER_NAME")?,
            worker_config,
        })
    }
}
