//! Supply and inflation pipeline

use super::{Pipeline, PipelineRun};
use crate::cache::{keys, CacheBatch};
use crate::error::Result;
use crate::query::{bounded, NodeHeight};
use crate::resolver::SupplyResolver;
use async_trait::async_trait;
use cudos_stats_economics::{annualized_inflation, Dec, MintGenesisState, MintedSupplyCalculator};
use std::sync::Arc;

/// Where the `inflation` value comes from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InflationSource {
    /// Minting over `period_days`, annualized against the circulating supply
    Minted { period_days: Dec },
    /// A configured rate
    Fixed(Dec),
}

/// Writes `supply`, `inflation`, `allTokensSupply` and `cudosNetworkTotalSupply`
pub struct InflationPipeline {
    node: Arc<dyn NodeHeight>,
    resolver: SupplyResolver,
    minted: MintedSupplyCalculator,
    genesis: MintGenesisState,
    initial_height: i64,
    source: InflationSource,
}

impl InflationPipeline {
    pub fn new(
        node: Arc<dyn NodeHeight>,
        resolver: SupplyResolver,
        minted: MintedSupplyCalculator,
        genesis: MintGenesisState,
        initial_height: i64,
        source: InflationSource,
    ) -> Self {
        Self {
            node,
            resolver,
            minted,
            genesis,
            initial_height,
            source,
        }
    }
}

#[async_trait]
impl Pipeline for InflationPipeline {
    fn name(&self) -> &'static str {
        "inflation"
    }

    async fn run(&self) -> Result<PipelineRun> {
        let timeout = self.resolver.settings().query_timeout;
        let height = bounded("latest height", timeout, self.node.latest_height()).await?;
        let resolution = self.resolver.circulating_supply_at(height).await?;

        let inflation = match &self.source {
            InflationSource::Fixed(rate) => rate.clone(),
            InflationSource::Minted { period_days } => {
                let (minted, genesis, window) = (self.minted.clone(), self.genesis.clone(), period_days.clone());
                let initial_height = self.initial_height;
                let minted = tokio::task::spawn_blocking(move || {
                    minted.minted_tokens_since(&genesis, initial_height, height, &window)
                })
                .await?;
                annualized_inflation(&minted, period_days, &resolution.circulating)?
            }
        };

        let mint_denom = &self.resolver.settings().mint_denom;
        let all_tokens = serde_json::to_string(&resolution.all_tokens_supply(mint_denom))?;

        tracing::info!(
            height,
            supply_height = resolution.supply_height,
            circulating = %resolution.circulating,
            inflation = %inflation,
            "Resolved supply and inflation"
        );

        let batch = CacheBatch::new()
            .metric(keys::SUPPLY, &resolution.circulating, height)
            .metric(keys::INFLATION, &inflation, height)
            .value(keys::ALL_TOKENS_SUPPLY, all_tokens)
            .value(keys::CUDOS_NETWORK_TOTAL_SUPPLY, &resolution.network_total);

        Ok(PipelineRun::Commit { height, batch })
    }
}
