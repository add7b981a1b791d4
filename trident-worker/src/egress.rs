//! One-time egress IP detection, cached for the life of a worker.

use tokio::sync::OnceCell;

const IPIFY_URL: &str = "https://api.ipify.org";
const UNKNOWN_IP: &str = "0.0.0.0";

/// Looks up the caller's public IP via an external echo service, falling
/// back to `0.0.0.0` if the lookup fails for any reason — a worker must
/// still be able to attach *an* `ip` to every response.
pub struct EgressIp {
    cell: OnceCell<String>,
}

impl EgressIp {
    pub fn new() -> Self {
        EgressIp { cell: OnceCell::new() }
    }

    pub async fn get(&self, client: &reqwest::Client) -> String {
        self.cell
            .get_or_init(|| async {
                match client.get(IPIFY_URL).send().await {
                    Ok(resp) => resp.text().await.unwrap_or_else(|_| UNKNOWN_IP.to_string()),
                    Err(_) => UNKNOWN_IP.to_string(),
                }
            })
            .await
            .clone()
    }
}

impl Default for EgressIp {
    fn default() -> Self {
        Self::new()
    }
}
