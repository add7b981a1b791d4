use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::NozzleError;

/// A frozen, non-identifying user agent sent on every outbound nozzle
/// request. Never derive this from the campaign or provider at runtime.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Default per-call HTTP timeout for a nozzle's outbound request.
pub const DEFAULT_HTTP_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// The outcome of a single authentication probe, before it's enriched with
/// request identity (`campaign_id`, `username`, `password`), `timestamp`,
/// and `ip` by the worker client.
///
/// Invariant: at most one of `valid`/`rate_limited` should be true.
#[derive(Debug, Clone, PartialEq)]
pub struct NozzleResult {
    pub valid: bool,
    pub locked: bool,
    pub mfa: bool,
    pub rate_limited: bool,
    pub metadata: Value,
}

impl NozzleResult {
    pub fn valid() -> Self {
        NozzleResult {
            valid: true,
            locked: false,
            mfa: false,
            rate_limited: false,
            metadata: Value::Null,
        }
    }

    pub fn invalid() -> Self {
        NozzleResult {
            valid: false,
            locked: false,
            mfa: false,
            rate_limited: false,
            metadata: Value::Null,
        }
    }

    pub fn rate_limited() -> Self {
        NozzleResult {
            valid: false,
            locked: false,
            mfa: false,
            rate_limited: true,
            metadata: Value::Null,
        }
    }
}

/// A provider-specific client that performs exactly one authentication
/// probe and reports a structured result.
///
/// Implementations own their rate limiting: `login` must block on the
/// nozzle's internal token bucket rather than returning immediately, and
/// must never invent `valid: true` for a response it can't disambiguate.
#[async_trait]
pub trait Nozzle: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> Result<NozzleResult, NozzleError>;
}

/// Constructs a configured [`Nozzle`] from driver-specific string options.
///
/// Registered once per driver name at process startup; `new` validates
/// `opts` and is free to fail with [`NozzleError::BadConfig`].
pub trait NozzleFactory: Send + Sync {
    fn new(&self, opts: &HashMap<String, String>) -> Result<Box<dyn Nozzle>, NozzleError>;
}

impl<F> NozzleFactory for F
where
    F: Fn(&HashMap<String, String>) -> Result<Box<dyn Nozzle>, NozzleError> + Send + Sync,
{
    fn new(&self, opts: &HashMap<String, String>) -> Result<Box<dyn Nozzle>, NozzleError> {
        (self)(opts)
    }
}
