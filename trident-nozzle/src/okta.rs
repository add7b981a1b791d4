//! Reference nozzle for Okta's `/api/v1/authn` primary-authentication
//! endpoint, grounded on the provider's documented status/response shape.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::NozzleError;
use crate::nozzle::{Nozzle, NozzleFactory, NozzleResult, DEFAULT_HTTP_TIMEOUT, USER_AGENT};
use trident_rate_limit::RateLimiter;

pub struct OktaFactory;

impl NozzleFactory for OktaFactory {
    fn new(&self, opts: &HashMap<String, String>) -> Result<Box<dyn Nozzle>, NozzleError> {
        let domain = opts
            .get("domain")
            .ok_or_else(|| NozzleError::BadConfig("okta nozzle requires a 'domain' option".into()))?
            .clone();

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(NozzleError::Http)?;

        Ok(Box::new(OktaNozzle {
            domain,
            client,
            limiter: RateLimiter::nozzle_default(),
        }))
    }
}

/// Probes an Okta org's primary-authentication endpoint with a single
/// username/password pair.
pub struct OktaNozzle {
    domain: String,
    client: reqwest::Client,
    limiter: RateLimiter<()>,
}

#[derive(Deserialize)]
struct OktaAuthnResponse {
    status: String,
    #[serde(rename = "_embedded", default)]
    embedded: Value,
}

#[async_trait]
impl Nozzle for OktaNozzle {
    async fn login(&self, username: &str, password: &str) -> Result<NozzleResult, NozzleError> {
        self.limiter.acquire(&()).await;

        let url = format!("https://{}.okta.com/api/v1/authn", self.domain);
        let resp = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await
            .map_err(NozzleError::Http)?;

        match resp.status().as_u16() {
            200 => {
                let body: OktaAuthnResponse = resp.json().await.map_err(NozzleError::Decode)?;
                Ok(NozzleResult {
                    valid: body.status != "LOCKED_OUT",
                    locked: body.status == "LOCKED_OUT",
                    mfa: body.status == "MFA_REQUIRED",
                    rate_limited: false,
                    metadata: body.embedded,
                })
            }
            401 => Ok(NozzleResult::invalid()),
            429 => Ok(NozzleResult::rate_limited()),
            other => Err(NozzleError::UnhandledStatus(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_rejects_missing_domain() {
        let err = OktaFactory.new(&HashMap::new()).unwrap_err();
        assert!(matches!(err, NozzleError::BadConfig(_)));
    }

    #[test]
    fn factory_accepts_domain() {
        let mut opts = HashMap::new();
        opts.insert("domain".to_string(), "acme".to_string());
        assert!(OktaFactory.new(&opts).is_ok());
    }
}
