//! Dispatcher binary: one receive loop per process, submitting each
//! released task to a worker and publishing the result.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use trident_config::DispatcherConfig;
use trident_dispatch::Dispatcher;
use trident_events_rabbitmq::RabbitMqBus;
use trident_types::{AuthRequest, AuthResponse};
use trident_worker::{HttpWorkerClient, InProcessWorkerClient, WorkerClient};

const WEBHOOK_DRIVER: &str = "webhook";

fn build_worker(config: &DispatcherConfig) -> Arc<dyn WorkerClient> {
    if config.worker_name == WEBHOOK_DRIVER {
        let url = config.worker_config.get("url").unwrap_or_else(|| {
            eprintln!("fatal: webhook worker driver requires a 'url' entry in DISPATCHER_WORKER_CONFIG");
            std::process::exit(1);
        });
        let token = config.worker_config.get("token").unwrap_or_else(|| {
            eprintln!("fatal: webhook worker driver requires a 'token' entry in DISPATCHER_WORKER_CONFIG");
            std::process::exit(1);
        });
        let mut client = HttpWorkerClient::new(url.clone(), token.clone());
        if let Some(header) = config.worker_config.get("header") {
            client = client.with_header_name(header.clone());
        }
        Arc::new(client)
    } else {
        trident_nozzle::register_builtin_nozzles();
        let mut provider_options = std::collections::HashMap::new();
        provider_options.insert(config.worker_name.clone(), config.worker_config.clone());
        Arc::new(InProcessWorkerClient::new(provider_options))
    }
}

#[tokio::main]
async fn main() {
    let config = DispatcherConfig::load().unwrap_or_else(|e| {
        eprintln!("fatal: {e}");
        std::process::exit(1);
    });

    trident_config::init_tracing(&config.log_level);

    let worker = build_worker(&config);

    let task_bus = RabbitMqBus::<AuthRequest>::connect(&config.amqp_url, &config.subscription_id)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to connect the task bus");
            std::process::exit(1);
        });
    let result_bus = RabbitMqBus::<AuthResponse>::connect(&config.amqp_url, &config.result_topic_id)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to connect the result bus");
            std::process::exit(1);
        });

    let cancel = CancellationToken::new();
    let dispatcher = Dispatcher::new(worker, task_bus, result_bus, cancel.clone());

    let run = tokio::spawn(async move { dispatcher.run().await });

    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("received shutdown signal");
    cancel.cancel();
    if let Err(e) = run.await {
        tracing::error!(error = %e, "dispatcher task panicked");
    }
}
