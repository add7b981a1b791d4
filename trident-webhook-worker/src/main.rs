//! Webhook worker binary: an HTTP front door onto the in-process nozzle
//! registry, standing in for a worker driven over the wire rather than
//! linked directly into a dispatcher process.

use std::sync::Arc;

use trident_config::WebhookWorkerConfig;
use trident_webhook_worker::{build_router, WorkerState};
use trident_worker::InProcessWorkerClient;

#[tokio::main]
async fn main() {
    let config = WebhookWorkerConfig::load().unwrap_or_else(|e| {
        eprintln!("fatal: {e}");
        std::process::exit(1);
    });

    trident_config::init_tracing(&config.log_level);

    trident_nozzle::register_builtin_nozzles();

    let state = WorkerState {
        worker: Arc::new(InProcessWorkerClient::new(Default::default())),
        access_token: Arc::from(config.access_token.as_str()),
    };

    let router = build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, addr = %addr, "failed to bind listener");
        std::process::exit(1);
    });

    tracing::info!(addr = %addr, "starting webhook worker");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("received shutdown signal");
        })
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "server error");
            std::process::exit(1);
        });
}
