//! Service assembly: adapters, pipelines, schedule and HTTP server

use crate::api::{self, ApiState, MintParams};
use crate::cache::MetricsCache;
use crate::clients::{self, BankRestClient, DistributionRestClient, StakingRestClient, TendermintRpcClient};
use crate::config::{InflationMode, StatsConfig};
use crate::error::{Result, StatsError};
use crate::metrics::StatsMetrics;
use crate::query::NodeHeight;
use crate::resolver::{ResolverSettings, SupplyResolver};
use crate::tasks::{AprPipeline, CycleReport, DailySchedule, InflationPipeline, InflationSource, RefreshOrchestrator};
use cudos_stats_economics::{AprCalculator, MintedSupplyCalculator};
use std::net::SocketAddr;
use std::sync::Arc;

/// A fully wired stats service
pub struct StatsService {
    config: StatsConfig,
    cache: Arc<MetricsCache>,
    orchestrator: Arc<RefreshOrchestrator>,
    metrics: Option<Arc<StatsMetrics>>,
    schedule: DailySchedule,
}

impl StatsService {
    /// Validate `config` and build every component from it
    pub fn from_config(config: StatsConfig) -> Result<Self> {
        config.validate()?;

        let timeout = config.query_timeout();
        let http = clients::http_client(timeout)?;

        let node: Arc<dyn NodeHeight> = Arc::new(TendermintRpcClient::new(&config.node.rpc_address, http.clone()));
        let bank = Arc::new(BankRestClient::new(&config.node.rest_address, http.clone()));
        let staking = Arc::new(StakingRestClient::new(&config.node.rest_address, http.clone()));
        let distribution = Arc::new(DistributionRestClient::new(&config.node.rest_address, http.clone()));

        let resolver = SupplyResolver::new(
            bank,
            ResolverSettings {
                mint_denom: config.calculation.mint_denom.clone(),
                policy: config.supply_policy()?,
                max_scan_blocks: config.calculation.max_scan_blocks,
                query_timeout: timeout,
            },
        );
        let resolver = attach_ethereum(resolver, &config, &http)?;

        let source = match config.calculation.inflation_mode {
            InflationMode::Minted => InflationSource::Minted {
                period_days: config.period_days()?,
            },
            InflationMode::Fixed => InflationSource::Fixed(config.fixed_inflation()?),
        };

        let inflation = InflationPipeline::new(
            Arc::clone(&node),
            resolver,
            MintedSupplyCalculator::default(),
            config.inflation_genesis_state()?,
            config.inflation_genesis.initial_height,
            source,
        );
        let apr = AprPipeline::new(
            node,
            staking,
            distribution,
            AprCalculator::default(),
            config.apr_genesis_state()?,
            config.apr_genesis.initial_height,
            timeout,
        );

        let cache = Arc::new(MetricsCache::new());
        let metrics = if config.metrics.enabled {
            Some(Arc::new(StatsMetrics::new()?))
        } else {
            None
        };

        let mut orchestrator = RefreshOrchestrator::new(Arc::new(inflation), Arc::new(apr), Arc::clone(&cache));
        if let Some(metrics) = &metrics {
            orchestrator = orchestrator.with_metrics(Arc::clone(metrics));
        }

        let schedule = DailySchedule::new(config.daily_at()?);

        tracing::info!(
            rpc = %config.node.rpc_address,
            rest = %config.node.rest_address,
            mode = ?config.calculation.inflation_mode,
            policy = ?config.calculation.supply_policy,
            daily_at = %schedule.at(),
            "Stats service configured"
        );

        Ok(Self {
            config,
            cache,
            orchestrator: Arc::new(orchestrator),
            metrics,
            schedule,
        })
    }

    pub fn cache(&self) -> &Arc<MetricsCache> {
        &self.cache
    }

    /// Run a single refresh cycle
    pub async fn run_once(&self) -> CycleReport {
        self.orchestrator.run_once().await
    }

    /// Router over this service's cache
    pub fn router(&self) -> axum::Router {
        api::router(Arc::new(ApiState {
            cache: Arc::clone(&self.cache),
            mint_params: MintParams {
                mint_denom: self.config.calculation.mint_denom.clone(),
                blocks_per_year: self.config.inflation_genesis.blocks_per_day.clone(),
            },
            metrics: self.metrics.clone(),
        }))
    }

    /// Refresh on startup, start the daily schedule and serve until the listener fails
    pub async fn serve(self) -> Result<()> {
        if self.config.refresh.on_startup {
            let report = self.run_once().await;
            if !report.is_success() {
                tracing::warn!("Startup refresh failed, serving 400 until the next successful cycle");
            }
        }

        tokio::spawn(self.schedule.run(Arc::clone(&self.orchestrator)));

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(%addr, "HTTP server listening");

        axum::serve(listener, self.router())
            .await
            .map_err(StatsError::from)
    }
}

#[cfg(feature = "ethereum")]
fn attach_ethereum(resolver: SupplyResolver, config: &StatsConfig, http: &reqwest::Client) -> Result<SupplyResolver> {
    use crate::clients::EthRpcClient;
    use crate::resolver::EthereumSupply;

    let Some(eth) = &config.eth else {
        return Ok(resolver);
    };

    let client = EthRpcClient::new(&eth.node, &eth.token_address, http.clone())?;
    tracing::info!(node = %eth.node, accounts = eth.accounts.len(), "Ethereum supply leg enabled");
    Ok(resolver.with_ethereum(EthereumSupply::new(
        Arc::new(client),
        eth.accounts.clone(),
        eth.max_supply()?,
    )))
}

#[cfg(not(feature = "ethereum"))]
fn attach_ethereum(resolver: SupplyResolver, config: &StatsConfig, _http: &reqwest::Client) -> Result<SupplyResolver> {
    if config.eth.is_some() {
        tracing::warn!("eth section ignored: built without the ethereum feature");
    }
    Ok(resolver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SupplyPolicyKind;

    fn config() -> StatsConfig {
        let mut config = StatsConfig::default();
        config.calculation.supply_policy = SupplyPolicyKind::FixedOffset;
        config
    }

    #[test]
    fn test_from_config() {
        let service = StatsService::from_config(config()).unwrap();
        assert!(service.cache().is_empty());
        assert!(service.metrics.is_some());
        assert_eq!(service.schedule, DailySchedule::default());
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let mut bad = config();
        bad.calculation.period_days = "thirty".to_string();
        assert!(StatsService::from_config(bad).is_err());
    }

    #[test]
    fn test_metrics_can_be_disabled() {
        let mut config = config();
        config.metrics.enabled = false;
        let service = StatsService::from_config(config).unwrap();
        assert!(service.metrics.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_node_fails_cycle() {
        let mut config = config();
        // nothing listens on the discard port
        config.node.rpc_address = "http://127.0.0.1:9".to_string();
        config.node.rest_address = "http://127.0.0.1:9".to_string();
        config.node.query_timeout_secs = 1;

        let service = StatsService::from_config(config).unwrap();
        let report = service.run_once().await;
        assert!(report.inflation.is_failure());
        assert!(report.apr.is_failure());
        assert!(service.cache().is_empty());
    }
}
