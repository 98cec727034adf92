//! reqwest-backed adapters for the collaborator traits

mod bank;
mod distribution;
#[cfg(feature = "ethereum")]
mod eth;
mod node;
mod staking;

pub use bank::BankRestClient;
pub use distribution::DistributionRestClient;
#[cfg(feature = "ethereum")]
pub use eth::EthRpcClient;
pub use node::TendermintRpcClient;
pub use staking::StakingRestClient;

use crate::error::{Result, StatsError};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Header selecting the height of a Cosmos REST query
pub const BLOCK_HEIGHT_HEADER: &str = "x-cosmos-block-height";

/// Shared HTTP client with the configured per-request timeout
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("cudos-stats/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(StatsError::from)
}

/// Base URL plus client, the common part of every adapter
#[derive(Clone, Debug)]
pub(crate) struct Endpoint {
    base: String,
    client: reqwest::Client,
}

impl Endpoint {
    pub(crate) fn new(base: &str, client: reqwest::Client) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub(crate) fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Send a request and decode a JSON body, rejecting non-success statuses
    pub(crate) async fn json<T: DeserializeOwned>(
        &self,
        source_name: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StatsError::MalformedResponse {
                source_name,
                reason: format!("status {}", status),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| StatsError::MalformedResponse {
            source_name,
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url() {
        let client = http_client(Duration::from_secs(1)).unwrap();
        let endpoint = Endpoint::new("http://node:1317/", client);
        assert_eq!(endpoint.url("/bank/total"), "http://node:1317/bank/total");
    }
}
