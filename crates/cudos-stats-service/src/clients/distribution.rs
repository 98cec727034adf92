//! Distribution parameters over the legacy REST API

use super::Endpoint;
use crate::error::Result;
use crate::query::{DistributionParams, DistributionParamsQuery};
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Clone, Debug)]
pub struct DistributionRestClient {
    endpoint: Endpoint,
}

#[derive(Deserialize)]
struct ParametersResult {
    result: DistributionParams,
}

impl DistributionRestClient {
    pub fn new(rest_address: &str, client: reqwest::Client) -> Self {
        Self {
            endpoint: Endpoint::new(rest_address, client),
        }
    }
}

#[async_trait]
impl DistributionParamsQuery for DistributionRestClient {
    async fn params(&self) -> Result<DistributionParams> {
        let request = self.endpoint.client().get(self.endpoint.url("/distribution/parameters"));
        let response: ParametersResult = self.endpoint.json("distribution parameters", request).await?;
        Ok(response.result)
    }
}
