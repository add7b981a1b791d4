use crate::env::{optional, optional_parsed, require};
use crate::error::ConfigError;

/// Configuration for the `trident-webhook-worker` binary: listen port and
/// the shared-secret token compared against incoming `X-Access-Token`
/// headers.
#[derive(Debug, Clone)]
pub struct WebhookWorkerConfig {
    pub log_level: String,
    pub port: u16,
    pub access_token: String,
}

impl WebhookWorkerConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        Ok(WebhookWorkerConfig {
            log_level: optional("WORKER_LOG_LEVEL", "info"),
            port: optional_parsed("WORKER_PORT", 8080)?,
            access_token: require("WORKER_ACCESS_TOKEN")?,
        })
    }
}
