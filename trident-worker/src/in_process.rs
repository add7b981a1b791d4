use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use trident_types::{AuthRequest, AuthResponse};

use crate::client::WorkerClient;
use crate::egress::EgressIp;
use crate::error::WorkerError;

/// Calls the nozzle registry directly, in the same process.
///
/// `provider_options` supplies each nozzle's default `open` options, keyed
/// by provider name (e.g. `"okta" -> {"domain": "acme"}`). A task's own
/// `metadata` is layered on top and wins on key collision, so a single
/// long-lived process can still serve requests aimed at different tenants
/// of the same provider.
pub struct InProcessWorkerClient {
    provider_options: HashMap<String, HashMap<String, String>>,
    http_client: reqwest::Client,
    egress_ip: EgressIp,
}

impl InProcessWorkerClient {
    pub fn new(provider_options: HashMap<String, HashMap<String, String>>) -> Self {
        InProcessWorkerClient {
            provider_options,
            http_client: reqwest::Client::new(),
            egress_ip: EgressIp::new(),
        }
    }
}

#[async_trait]
impl WorkerClient for InProcessWorkerClient {
    async fn submit(&self, req: AuthRequest) -> Result<AuthResponse, WorkerError> {
        // Per-task metadata overrides the dispatcher-wide defaults for the
        // same provider, so a single process can still serve requests that
        // need to aim at a per-campaign tenant/domain.
        let mut opts = self.provider_options.get(&req.provider).cloned().unwrap_or_default();
        opts.extend(req.metadata.clone());

        let nozzle = trident_nozzle::open(&req.provider, &opts).map_err(|e| WorkerError::Nozzle(e.to_string()))?;

        let result = nozzle
            .login(&req.username, &req.password)
            .await
            .map_err(|e| WorkerError::Nozzle(e.to_string()))?;

        let ip = self.egress_ip.get(&self.http_client).await;

        Ok(AuthResponse {
            campaign_id: req.campaign_id,
            username: req.username,
            password: req.password,
            timestamp: Utc::now(),
            ip,
            valid: result.valid,
            locked: result.locked,
            mfa: result.mfa,
            rate_limited: result.rate_limited,
            metadata: result.metadata,
        })
    }
}
