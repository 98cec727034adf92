//! # Circulating Supply Resolution
//!
//! ```text
//! total_supply(h) empty? ──▶ h+1, h+2, … (at most max_scan_blocks heights)
//!        │
//!        ▼
//! network_total = amount of mint_denom
//!        │
//!        ├── escrow policy:       − balance(escrow) at the first height ≥ scan height where it is non-zero
//!        └── fixed-offset policy: − configured offset
//!        │
//!        ▼
//! circulating (+ ERC-20 circulating when the Ethereum leg is attached)
//! ```

use crate::error::{Result, StatsError};
use crate::query::{bounded, BankQuery, Erc20BalanceQuery, TotalSupply};
use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use std::sync::Arc;
use std::time::Duration;

/// How the non-circulating amount is determined
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SupplyPolicy {
    /// Subtract the balance held by the bridge escrow account
    Escrow { address: String },
    /// Subtract a fixed amount of base units
    FixedOffset { amount: BigInt },
}

/// Resolver parameters
#[derive(Clone, Debug)]
pub struct ResolverSettings {
    pub mint_denom: String,
    pub policy: SupplyPolicy,
    pub max_scan_blocks: u64,
    pub query_timeout: Duration,
}

/// Outcome of a supply resolution
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SupplyResolution {
    /// Circulating supply in base units
    pub circulating: BigInt,
    /// Mint-denom total reported by the bank module
    pub network_total: BigInt,
    /// Amount subtracted by the supply policy
    pub non_circulating: BigInt,
    /// Ethereum-side circulating supply, when that leg is attached
    pub eth_circulating: Option<BigInt>,
    /// Full bank listing at `supply_height`
    pub total_supply: TotalSupply,
    /// Height the caller asked for
    pub requested_height: i64,
    /// First height at or after `requested_height` with a non-empty listing
    pub supply_height: i64,
}

impl SupplyResolution {
    /// Bank listing with the mint-denom amount replaced by the circulating supply
    pub fn all_tokens_supply(&self, mint_denom: &str) -> TotalSupply {
        let mut listing = self.total_supply.clone();
        for coin in listing.supply.iter_mut().filter(|coin| coin.denom == mint_denom) {
            coin.amount = self.circulating.to_string();
        }
        listing
    }
}

/// ERC-20 circulating supply: max supply minus treasury balances
pub struct EthereumSupply {
    query: Arc<dyn Erc20BalanceQuery>,
    accounts: Vec<String>,
    max_supply: BigInt,
}

impl EthereumSupply {
    pub fn new(query: Arc<dyn Erc20BalanceQuery>, accounts: Vec<String>, max_supply: BigInt) -> Self {
        Self {
            query,
            accounts,
            max_supply,
        }
    }

    /// Circulating amount at the latest Ethereum block
    pub async fn circulating(&self, timeout: Duration) -> Result<BigInt> {
        let block = bounded("eth latest block", timeout, self.query.latest_block()).await?;

        let balances = futures::future::try_join_all(
            self.accounts
                .iter()
                .map(|account| bounded("eth balanceOf", timeout, self.query.balance_of(account, block))),
        )
        .await?;
        let held: BigInt = balances.into_iter().sum();

        tracing::debug!(block, held = %held, accounts = self.accounts.len(), "resolved ERC-20 treasury balances");
        Ok(&self.max_supply - held)
    }
}

/// Reconciles bank queries into a circulating supply figure
pub struct SupplyResolver {
    bank: Arc<dyn BankQuery>,
    settings: ResolverSettings,
    ethereum: Option<EthereumSupply>,
}

impl SupplyResolver {
    pub fn new(bank: Arc<dyn BankQuery>, settings: ResolverSettings) -> Self {
        Self {
            bank,
            settings,
            ethereum: None,
        }
    }

    /// Add the ERC-20 circulating supply to every resolution
    pub fn with_ethereum(mut self, ethereum: EthereumSupply) -> Self {
        self.ethereum = Some(ethereum);
        self
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    pub fn has_ethereum(&self) -> bool {
        self.ethereum.is_some()
    }

    /// Resolve the circulating supply at `height`
    pub async fn circulating_supply_at(&self, height: i64) -> Result<SupplyResolution> {
        let (supply_height, total_supply) = self.scan_total_supply(height).await?;

        let denom = &self.settings.mint_denom;
        let network_total = total_supply
            .find(denom)
            .ok_or_else(|| StatsError::DenomNotFound {
                denom: denom.clone(),
                context: format!("total supply at height {}", supply_height),
            })?
            .amount()?;

        let non_circulating = match &self.settings.policy {
            SupplyPolicy::Escrow { address } => self.scan_escrow_balance(supply_height, address).await?.1,
            SupplyPolicy::FixedOffset { amount } => amount.clone(),
        };

        let mut circulating = &network_total - &non_circulating;
        if circulating.is_negative() {
            return Err(StatsError::NegativeSupply(format!(
                "network total {} is below non-circulating {}",
                network_total, non_circulating
            )));
        }

        let eth_circulating = match &self.ethereum {
            Some(ethereum) => {
                let amount = ethereum.circulating(self.settings.query_timeout).await?;
                circulating += &amount;
                Some(amount)
            }
            None => None,
        };

        Ok(SupplyResolution {
            circulating,
            network_total,
            non_circulating,
            eth_circulating,
            total_supply,
            requested_height: height,
            supply_height,
        })
    }

    /// First height at or after `height` whose supply listing is non-empty
    async fn scan_total_supply(&self, height: i64) -> Result<(i64, TotalSupply)> {
        for offset in 0..self.settings.max_scan_blocks {
            let probe = height.saturating_add(offset as i64);
            let supply = bounded(
                "bank total supply",
                self.settings.query_timeout,
                self.bank.total_supply(probe),
            )
            .await?;

            if !supply.is_empty() {
                return Ok((probe, supply));
            }
            tracing::debug!(height = probe, "empty supply listing, trying next height");
        }

        Err(StatsError::ScanExhausted {
            what: "non-empty supply",
            blocks: self.settings.max_scan_blocks,
            height,
        })
    }

    /// First height at or after `height` where the escrow holds a non-zero balance
    async fn scan_escrow_balance(&self, height: i64, address: &str) -> Result<(i64, BigInt)> {
        let denom = &self.settings.mint_denom;
        for offset in 0..self.settings.max_scan_blocks {
            let probe = height.saturating_add(offset as i64);
            let balance = bounded(
                "bank balance",
                self.settings.query_timeout,
                self.bank.balance(probe, address, denom),
            )
            .await?;

            if !balance.is_zero() {
                return Ok((probe, balance));
            }
            tracing::debug!(height = probe, address, "zero escrow balance, trying next height");
        }

        Err(StatsError::ScanExhausted {
            what: "non-zero escrow balance",
            blocks: self.settings.max_scan_blocks,
            height,
        })
    }
}
