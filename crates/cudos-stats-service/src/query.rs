//! Collaborator interfaces consumed by the refresh pipelines
//!
//! Each trait covers one external query. The reqwest adapters live in
//! [`crate::clients`]; tests substitute stubs or mocks.

use crate::error::{Result, StatsError};
use async_trait::async_trait;
use cudos_stats_economics::{parse_int, Dec};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Amount of one denomination, as reported by the bank module
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: String,
}

impl Coin {
    pub fn new(denom: &str, amount: impl ToString) -> Self {
        Self {
            denom: denom.to_string(),
            amount: amount.to_string(),
        }
    }

    /// Amount as an integer
    pub fn amount(&self) -> Result<BigInt> {
        Ok(parse_int(&self.amount)?)
    }
}

/// Pagination block of a Cosmos listing
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<String>,
}

/// Bank total supply at a height
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalSupply {
    #[serde(default)]
    pub supply: Vec<Coin>,
    #[serde(default)]
    pub pagination: PageResponse,
}

impl TotalSupply {
    pub fn is_empty(&self) -> bool {
        self.supply.is_empty()
    }

    pub fn find(&self, denom: &str) -> Option<&Coin> {
        self.supply.iter().find(|coin| coin.denom == denom)
    }
}

/// Staking pool totals
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StakingPool {
    pub bonded_tokens: Dec,
}

/// Distribution module parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionParams {
    /// Kept as text; parsed where it is used
    pub community_tax: String,
}

/// Latest committed block height
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NodeHeight: Send + Sync {
    async fn latest_height(&self) -> Result<i64>;
}

/// Staking pool at a height
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StakingPoolQuery: Send + Sync {
    async fn pool(&self, height: i64) -> Result<StakingPool>;
}

/// Current distribution parameters
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DistributionParamsQuery: Send + Sync {
    async fn params(&self) -> Result<DistributionParams>;
}

/// Bank module queries
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BankQuery: Send + Sync {
    async fn total_supply(&self, height: i64) -> Result<TotalSupply>;

    /// Balance of `denom` held by `address`; zero when the account holds nothing
    async fn balance(&self, height: i64, address: &str, denom: &str) -> Result<BigInt>;
}

/// ERC-20 balance queries on the Ethereum side
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Erc20BalanceQuery: Send + Sync {
    async fn latest_block(&self) -> Result<u64>;

    async fn balance_of(&self, account: &str, block: u64) -> Result<BigInt>;
}

/// Run one collaborator round trip with an upper time bound
pub async fn bounded<T, F>(what: &'static str, limit: Duration, request: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, request).await {
        Ok(result) => result,
        Err(_) => Err(StatsError::Timeout { what, after: limit }),
    }
}
