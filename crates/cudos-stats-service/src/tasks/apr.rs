//! Staking APR pipeline

use super::{Pipeline, PipelineRun};
use crate::cache::{keys, CacheBatch};
use crate::error::Result;
use crate::query::{bounded, DistributionParamsQuery, NodeHeight, StakingPoolQuery};
use async_trait::async_trait;
use cudos_stats_economics::{AprCalculator, MintGenesisState};
use std::sync::Arc;
use std::time::Duration;

/// Writes `apr` and `annualProvisions`
pub struct AprPipeline {
    node: Arc<dyn NodeHeight>,
    staking: Arc<dyn StakingPoolQuery>,
    distribution: Arc<dyn DistributionParamsQuery>,
    calculator: AprCalculator,
    genesis: MintGenesisState,
    initial_height: i64,
    query_timeout: Duration,
}

impl AprPipeline {
    pub fn new(
        node: Arc<dyn NodeHeight>,
        staking: Arc<dyn StakingPoolQuery>,
        distribution: Arc<dyn DistributionParamsQuery>,
        calculator: AprCalculator,
        genesis: MintGenesisState,
        initial_height: i64,
        query_timeout: Duration,
    ) -> Self {
        Self {
            node,
            staking,
            distribution,
            calculator,
            genesis,
            initial_height,
            query_timeout,
        }
    }
}

#[async_trait]
impl Pipeline for AprPipeline {
    fn name(&self) -> &'static str {
        "apr"
    }

    async fn run(&self) -> Result<PipelineRun> {
        if self.calculator.minted().is_exhausted(&self.genesis) {
            return Ok(PipelineRun::Skip(format!(
                "norm time passed {} is beyond the minting curve",
                self.genesis.norm_time_passed
            )));
        }

        let height = bounded("latest height", self.query_timeout, self.node.latest_height()).await?;
        let pool = bounded("staking pool", self.query_timeout, self.staking.pool(height)).await?;
        let params = bounded("distribution params", self.query_timeout, self.distribution.params()).await?;

        let (calculator, genesis) = (self.calculator.clone(), self.genesis.clone());
        let initial_height = self.initial_height;
        let outcome = tokio::task::spawn_blocking(move || {
            calculator.compute_apr(
                &genesis,
                initial_height,
                height,
                &pool.bonded_tokens,
                &params.community_tax,
            )
        })
        .await??;

        tracing::info!(
            height,
            apr = %outcome.apr,
            annual_provisions = %outcome.annual_provisions,
            "Computed staking APR"
        );

        let batch = CacheBatch::new()
            .metric(keys::APR, &outcome.apr, height)
            .value(keys::ANNUAL_PROVISIONS, &outcome.annual_provisions);

        Ok(PipelineRun::Commit { height, batch })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StatsError;
    use crate::query::{
        DistributionParams, MockDistributionParamsQuery, MockNodeHeight, MockStakingPoolQuery, StakingPool,
    };
    use cudos_stats_economics::{Dec, MintedSupplyCalculator};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn pipeline(
        norm_time_passed: i64,
        node: MockNodeHeight,
        staking: MockStakingPoolQuery,
        distribution: MockDistributionParamsQuery,
    ) -> AprPipeline {
        AprPipeline::new(
            Arc::new(node),
            Arc::new(staking),
            Arc::new(distribution),
            // one day of minting keeps the integration short
            AprCalculator::new(MintedSupplyCalculator::default(), Dec::one()),
            MintGenesisState::new(Dec::from_int(norm_time_passed), 17280).unwrap(),
            1,
            Duration::from_secs(1),
        )
    }

    fn community_tax(tax: &'static str) -> MockDistributionParamsQuery {
        let mut distribution = MockDistributionParamsQuery::new();
        distribution.expect_params().returning(move || {
            Ok(DistributionParams {
                community_tax: tax.to_string(),
            })
        });
        distribution
    }

    #[tokio::test]
    async fn test_exhausted_curve_is_skipped() {
        let mut node = MockNodeHeight::new();
        node.expect_latest_height().never();
        let run = pipeline(11, node, MockStakingPoolQuery::new(), MockDistributionParamsQuery::new())
            .run()
            .await
            .unwrap();
        assert!(matches!(run, PipelineRun::Skip(_)));
    }

    #[tokio::test]
    async fn test_commits_apr_at_latest_height() {
        let mut node = MockNodeHeight::new();
        node.expect_latest_height().returning(|| Ok(1_000));
        let mut staking = MockStakingPoolQuery::new();
        staking
            .expect_pool()
            .with(mockall::predicate::eq(1_000))
            .returning(|_| {
                Ok(StakingPool {
                    bonded_tokens: Dec::from_int(1_000_000_000).mul_int64(1_000_000_000_000_000_000),
                })
            });

        let run = pipeline(1, node, staking, community_tax("0.02")).run().await.unwrap();
        let PipelineRun::Commit { height, batch } = run else {
            panic!("expected a commit");
        };
        assert_eq!(height, 1_000);
        assert_eq!(
            batch.keys().collect::<Vec<_>>(),
            vec![keys::APR, keys::APR_HEIGHT, keys::ANNUAL_PROVISIONS]
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_integration_runs_off_the_runtime() {
        let mut node = MockNodeHeight::new();
        node.expect_latest_height().returning(|| Ok(500));
        let mut staking = MockStakingPoolQuery::new();
        staking.expect_pool().returning(|_| {
            Ok(StakingPool {
                bonded_tokens: Dec::from_int(1_000_000),
            })
        });

        let ticks = Arc::new(AtomicUsize::new(0));
        let ticker = {
            let ticks = ticks.clone();
            tokio::spawn(async move {
                loop {
                    ticks.fetch_add(1, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                }
            })
        };

        let run = pipeline(1, node, staking, community_tax("0.02")).run().await.unwrap();
        assert!(matches!(run, PipelineRun::Commit { height: 500, .. }));
        assert!(ticks.load(Ordering::SeqCst) > 0);
        ticker.abort();
    }

    #[tokio::test]
    async fn test_zero_bonded_tokens_fails() {
        let mut node = MockNodeHeight::new();
        node.expect_latest_height().returning(|| Ok(10));
        let mut staking = MockStakingPoolQuery::new();
        staking.expect_pool().returning(|_| {
            Ok(StakingPool {
                bonded_tokens: Dec::zero(),
            })
        });

        let err = pipeline(1, node, staking, community_tax("0.02")).run().await.unwrap_err();
        assert!(matches!(err, StatsError::Economics(_)));
    }

    #[tokio::test]
    async fn test_malformed_community_tax_fails() {
        let mut node = MockNodeHeight::new();
        node.expect_latest_height().returning(|| Ok(10));
        let mut staking = MockStakingPoolQuery::new();
        staking.expect_pool().returning(|_| {
            Ok(StakingPool {
                bonded_tokens: Dec::from_int(5),
            })
        });

        assert!(pipeline(1, node, staking, community_tax("2%")).run().await.is_err());
    }
}
