//! Staking pool over the Cosmos REST API

use super::{Endpoint, BLOCK_HEIGHT_HEADER};
use crate::error::Result;
use crate::query::{StakingPool, StakingPoolQuery};
use async_trait::async_trait;
use cudos_stats_economics::Dec;
use serde::Deserialize;

/// `GET /cosmos/staking/v1beta1/pool` pinned to a height
#[derive(Clone, Debug)]
pub struct StakingRestClient {
    endpoint: Endpoint,
}

#[derive(Deserialize)]
struct PoolResponse {
    pool: PoolBody,
}

#[derive(Deserialize)]
struct PoolBody {
    bonded_tokens: Dec,
}

impl StakingRestClient {
    pub fn new(rest_address: &str, client: reqwest::Client) -> Self {
        Self {
            endpoint: Endpoint::new(rest_address, client),
        }
    }
}

#[async_trait]
impl StakingPoolQuery for StakingRestClient {
    async fn pool(&self, height: i64) -> Result<StakingPool> {
        let request = self
            .endpoint
            .client()
            .get(self.endpoint.url("/cosmos/staking/v1beta1/pool"))
            .header(BLOCK_HEIGHT_HEADER, height.to_string());
        let response: PoolResponse = self.endpoint.json("staking pool", request).await?;

        Ok(StakingPool {
            bonded_tokens: response.pool.bonded_tokens,
        })
    }
}
