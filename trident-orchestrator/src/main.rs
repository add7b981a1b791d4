//! Orchestrator binary: owns campaign expansion, the producer loop that
//! releases ready tasks onto the task bus, the consumer loop that drains
//! results, and the batched writer those results funnel through.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use trident_config::OrchestratorConfig;
use trident_data_sqlx::PostgresDatastore;
use trident_events_rabbitmq::RabbitMqBus;
use trident_schedule_store::ScheduleStore;
use trident_scheduler::Scheduler;
use trident_types::{AuthRequest, AuthResponse};

#[tokio::main]
async fn main() {
    let config = OrchestratorConfig::load().unwrap_or_else(|e| {
        eprintln!("fatal: {e}");
        std::process::exit(1);
    });

    trident_config::init_tracing(&config.log_level);

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.db_connection_string)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to connect to the database");
            std::process::exit(1);
        });
    let datastore = Arc::new(PostgresDatastore::new(pool));

    let task_bus = RabbitMqBus::<AuthRequest>::connect(&config.amqp_url, &config.topic_id)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to connect the task bus");
            std::process::exit(1);
        });
    let result_bus = RabbitMqBus::<AuthResponse>::connect(&config.amqp_url, &config.subscription_id)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to connect the result bus");
            std::process::exit(1);
        });

    let store = ScheduleStore::new();
    let scheduler = Scheduler::new(store, task_bus, result_bus, datastore);

    if let Err(e) = scheduler.restore().await {
        tracing::error!(error = %e, "failed to restore active campaigns into the schedule store");
        std::process::exit(1);
    }

    let handle = scheduler.handle();
    let run = tokio::spawn(async move { scheduler.run().await });

    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("received shutdown signal");
    handle.cancel();
    if let Err(e) = run.await {
        tracing::error!(error = %e, "scheduler task panicked");
    }
}
