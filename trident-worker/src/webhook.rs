use async_trait::async_trait;
use trident_types::{AuthRequest, AuthResponse};

use crate::client::WorkerClient;
use crate::error::WorkerError;

/// Default header carrying the shared secret, matching the webhook-worker
/// binary's expectation unless overridden on both sides.
pub const DEFAULT_TOKEN_HEADER: &str = "X-Access-Token";

/// Submits requests to a remote worker over HTTP.
///
/// The remote side is itself an in-process worker behind a webhook; this
/// client is the caller half of that contract, not the receiver.
pub struct HttpWorkerClient {
    url: String,
    token: String,
    header_name: String,
    client: reqwest::Client,
}

impl HttpWorkerClient {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        HttpWorkerClient {
            url: url.into(),
            token: token.into(),
            header_name: DEFAULT_TOKEN_HEADER.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_header_name(mut self, header_name: impl Into<String>) -> Self {
        self.header_name = header_name.into();
        self
    }
}

#[async_trait]
impl WorkerClient for HttpWorkerClient {
    async fn submit(&self, req: AuthRequest) -> Result<AuthResponse, WorkerError> {
        let resp = self
            .client
            .post(&self.url)
            .header(self.header_name.as_str(), self.token.as_str())
            .json(&req)
            .send()
            .await
            .map_err(|e| WorkerError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(WorkerError::Transport(format!(
                "webhook worker returned status {}",
                resp.status()
            )));
        }

        resp.json::<AuthResponse>().await.map_err(|e| WorkerError::Decode(e.to_string()))
    }
}
