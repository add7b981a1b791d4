use crate::env::{optional, require};
use crate::error::ConfigError;

/// Configuration for the `trident-orchestrator` binary: database DSN,
/// task-bus/result-bus identifiers, and the schedule-store endpoint.
/// Every field is required at startup; absence is fatal.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub log_level: String,
    pub db_connection_string: String,
    pub amqp_url: String,
    pub project_id: String,
    pub topic_id: String,
    pub subscription_id: String,
    pub schedule_store_addr: String,
    pub schedule_store_password: String,
}

impl OrchestratorConfig {
    /// Loads from the environment (and `.env`, if present). Mirrors the
    /// `ORCHESTRATOR_`-prefixed variable names of the system this was
    /// modeled on, plus `AMQP_URL`: the original addressed its task/result
    /// bus purely by `ProjectID` against GCP Pub/Sub's ambient credentials,
    /// which has no equivalent against a self-hosted broker, so the broker
    /// address is its own required variable here.
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        Ok(OrchestratorConfig {
            log_level: optional("ORCHESTRATOR_LOG_LEVEL", "info"),
            db_connection_string: require("ORCHESTRATOR_DB_CONNECTION_STRING")?,
            amqp_url: require("ORCHESTRATOR_AMQP_URL")?,
            project_id: require("ORCHESTRATOR_PROJECT_ID")?,
            topic_id: require("ORCHESTRATOR_TOPIC_ID")?,
            subscription_id: require("ORCHESTRATOR_SUBSCRIPTION_ID")?,
            schedule_store_addr: require("ORCHESTRATOR_SCHEDULE_STORE_ADDR")?,
            schedule_store_password: optional("ORCHESTRATOR_SCHEDULE_STORE_PASSWORD", ""),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear() {
        for var in [
            "ORCHESTRATOR_LOG_LEVEL",
            "ORCHESTRATOR_DB_CONNECTION_STRING",
            "ORCHESTRATOR_AMQP_URL",
            "ORCHESTRATOR_PROJECT_ID",
            "ORCHESTRATOR_TOPIC_ID",
            "ORCHESTRATOR_SUBSCRIPTION_ID",
            "ORCHESTRATOR_SCHEDULE_STORE_ADDR",
            "ORCHESTRATOR_SCHEDULE_STORE_PASSWORD",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial(env)]
    fn missing_required_var_is_an_error() {
        clear();
        assert!(matches!(OrchestratorConfig::load(), Err(ConfigError::Missing(_))));
    }

    #[test]
    #[serial(env)]
    fn loads_with_defaults_applied() {
        clear();
        std::env::set_var("ORCHESTRATOR_DB_CONNECTION_STRING", "postgres://localhost/trident");
        std::env::set_var("ORCHESTRATOR_AMQP_URL", "amqp://localhost:5672/%2f");
        std::env::set_var("ORCHESTRATOR_PROJECT_ID", "trident-prod");
        std::env::set_var("ORCHESTRATOR_TOPIC_ID", "tasks");
        std::env::set_var("ORCHESTRATOR_SUBSCRIPTION_ID", "results");
        std::env::set_var("ORCHESTRATOR_SCHEDULE_STORE_ADDR", "localhost:6379");

        let cfg = OrchestratorConfig::load().unwrap();
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.schedule_store_password, "");
        clear();
    }
}
