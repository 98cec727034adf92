//! Service configuration types
//!
//! Loaded from a YAML file and overridden by `CUDOS_STATS_*` environment
//! variables, with `__` separating nested keys
//! (`CUDOS_STATS_NODE__REST_ADDRESS=http://10.0.0.5:1317`).

use crate::error::{Result, StatsError};
use crate::resolver::SupplyPolicy;
use chrono::NaiveTime;
use cudos_stats_economics::constants::{
    DEFAULT_BLOCKS_PER_DAY, DEFAULT_FIXED_INFLATION, ETH_MAX_SUPPLY, FIXED_SUPPLY_OFFSET_TOKENS, ONE_TOKEN,
};
use cudos_stats_economics::{parse_int, Dec, MintGenesisState};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "CUDOS_STATS";

/// Complete service configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatsConfig {
    /// HTTP listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Chain endpoints
    #[serde(default)]
    pub node: NodeSettings,

    /// Curve position used for the inflation pipeline
    #[serde(default)]
    pub inflation_genesis: GenesisSettings,

    /// Curve position used for the APR pipeline
    #[serde(default)]
    pub apr_genesis: GenesisSettings,

    /// Supply and inflation calculation settings
    #[serde(default)]
    pub calculation: CalculationSettings,

    /// Refresh schedule
    #[serde(default)]
    pub refresh: RefreshSettings,

    /// Ethereum supply leg, disabled when absent
    #[serde(default)]
    pub eth: Option<EthSettings>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

fn default_port() -> u16 {
    3000
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            node: NodeSettings::default(),
            inflation_genesis: GenesisSettings::default(),
            apr_genesis: GenesisSettings::default(),
            calculation: CalculationSettings::default(),
            refresh: RefreshSettings::default(),
            eth: None,
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl StatsConfig {
    /// Load from a YAML file, then apply environment overrides
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = ::config::File::from(path.as_ref())
            .format(::config::FileFormat::Yaml)
            .required(true);
        Self::build(source)
    }

    /// Parse YAML text, then apply environment overrides
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Self::build(::config::File::from_str(yaml, ::config::FileFormat::Yaml))
    }

    fn build<S>(source: S) -> Result<Self>
    where
        S: ::config::Source + Send + Sync + 'static,
    {
        let settings = ::config::Config::builder()
            .add_source(source)
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Parse every textual parameter so that bad input fails at startup
    pub fn validate(&self) -> Result<()> {
        self.inflation_genesis_state()?;
        self.apr_genesis_state()?;
        self.period_days()?;
        self.fixed_inflation()?;
        self.supply_policy()?;
        self.daily_at()?;

        for (name, height) in [
            ("inflation_genesis.initial_height", self.inflation_genesis.initial_height),
            ("apr_genesis.initial_height", self.apr_genesis.initial_height),
        ] {
            if height < 0 {
                return Err(invalid(name, format!("must not be negative, got {}", height)));
            }
        }
        if self.calculation.mint_denom.is_empty() {
            return Err(invalid("calculation.mint_denom", "must not be empty"));
        }
        if self.calculation.max_scan_blocks == 0 {
            return Err(invalid("calculation.max_scan_blocks", "must be at least 1"));
        }
        if self.node.query_timeout_secs == 0 {
            return Err(invalid("node.query_timeout_secs", "must be at least 1"));
        }
        if let Some(eth) = &self.eth {
            eth.max_supply()?;
            if eth.accounts.is_empty() {
                return Err(invalid("eth.accounts", "at least one account is required"));
            }
        }

        Ok(())
    }

    pub fn inflation_genesis_state(&self) -> Result<MintGenesisState> {
        self.inflation_genesis.to_state("inflation_genesis")
    }

    pub fn apr_genesis_state(&self) -> Result<MintGenesisState> {
        self.apr_genesis.to_state("apr_genesis")
    }

    /// Days of minting sampled for inflation
    pub fn period_days(&self) -> Result<Dec> {
        parse_dec("calculation.period_days", &self.calculation.period_days)
    }

    pub fn fixed_inflation(&self) -> Result<Dec> {
        parse_dec("calculation.fixed_inflation", &self.calculation.fixed_inflation)
    }

    /// Non-circulating supply policy
    pub fn supply_policy(&self) -> Result<SupplyPolicy> {
        let calc = &self.calculation;
        match calc.supply_policy {
            SupplyPolicyKind::Escrow => {
                if calc.escrow_account_address.trim().is_empty() {
                    return Err(invalid(
                        "calculation.escrow_account_address",
                        "required by the escrow supply policy",
                    ));
                }
                Ok(SupplyPolicy::Escrow {
                    address: calc.escrow_account_address.clone(),
                })
            }
            SupplyPolicyKind::FixedOffset => {
                let amount = parse_int(&calc.fixed_supply_offset)
                    .map_err(|e| invalid("calculation.fixed_supply_offset", e))?;
                Ok(SupplyPolicy::FixedOffset { amount })
            }
        }
    }

    /// Wall-clock time (UTC) of the daily refresh
    pub fn daily_at(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(&self.refresh.daily_at, "%H:%M")
            .map_err(|e| invalid("refresh.daily_at", format!("{} ({})", self.refresh.daily_at, e)))
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.node.query_timeout_secs)
    }
}

fn invalid(name: &'static str, reason: impl ToString) -> StatsError {
    StatsError::InvalidParameter {
        name,
        reason: reason.to_string(),
    }
}

fn parse_dec(name: &'static str, value: &str) -> Result<Dec> {
    value.parse().map_err(|e| invalid(name, e))
}

/// Chain endpoints
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeSettings {
    /// Tendermint RPC address
    #[serde(default = "default_rpc_address")]
    pub rpc_address: String,

    /// Cosmos REST (LCD) address
    #[serde(default = "default_rest_address")]
    pub rest_address: String,

    /// Upper bound for a single round trip
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,
}

fn default_rpc_address() -> String {
    "http://localhost:26657".to_string()
}

fn default_rest_address() -> String {
    "http://localhost:1317".to_string()
}

fn default_query_timeout_secs() -> u64 {
    10
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            rpc_address: default_rpc_address(),
            rest_address: default_rest_address(),
            query_timeout_secs: default_query_timeout_secs(),
        }
    }
}

/// Where the chain sat on the minting curve at a known height
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenesisSettings {
    /// Height at which `norm_time_passed` was observed
    #[serde(default = "default_initial_height")]
    pub initial_height: i64,

    #[serde(default = "default_norm_time_passed")]
    pub norm_time_passed: String,

    #[serde(default = "default_blocks_per_day")]
    pub blocks_per_day: String,
}

fn default_initial_height() -> i64 {
    1
}

fn default_norm_time_passed() -> String {
    "0".to_string()
}

fn default_blocks_per_day() -> String {
    DEFAULT_BLOCKS_PER_DAY.to_string()
}

impl Default for GenesisSettings {
    fn default() -> Self {
        Self {
            initial_height: default_initial_height(),
            norm_time_passed: default_norm_time_passed(),
            blocks_per_day: default_blocks_per_day(),
        }
    }
}

impl GenesisSettings {
    fn to_state(&self, name: &'static str) -> Result<MintGenesisState> {
        MintGenesisState::parse(&self.norm_time_passed, &self.blocks_per_day).map_err(|e| invalid(name, e))
    }
}

/// How the non-circulating amount is determined
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SupplyPolicyKind {
    /// Subtract the live balance of the bridge escrow account
    #[default]
    Escrow,
    /// Subtract a fixed historical amount
    FixedOffset,
}

/// How the `inflation` metric is produced
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum InflationMode {
    /// Annualized minting over the circulating supply
    #[default]
    Minted,
    /// The configured `fixed_inflation` rate
    Fixed,
}

/// Supply and inflation calculation settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CalculationSettings {
    /// Denomination minted by the chain
    #[serde(default = "default_mint_denom")]
    pub mint_denom: String,

    #[serde(default)]
    pub supply_policy: SupplyPolicyKind,

    /// Bridge escrow account, used by the escrow policy
    #[serde(default)]
    pub escrow_account_address: String,

    /// Base units subtracted by the fixed-offset policy
    #[serde(default = "default_fixed_supply_offset")]
    pub fixed_supply_offset: String,

    /// Maximum heights probed while looking for usable supply data
    #[serde(default = "default_max_scan_blocks")]
    pub max_scan_blocks: u64,

    #[serde(default)]
    pub inflation_mode: InflationMode,

    #[serde(default = "default_fixed_inflation")]
    pub fixed_inflation: String,

    /// Minting window sampled for inflation, in days
    #[serde(default = "default_period_days")]
    pub period_days: String,
}

fn default_mint_denom() -> String {
    cudos_stats_economics::constants::BASE_DENOM.to_string()
}

fn default_fixed_supply_offset() -> String {
    (BigInt::from(FIXED_SUPPLY_OFFSET_TOKENS) * BigInt::from(ONE_TOKEN)).to_string()
}

fn default_max_scan_blocks() -> u64 {
    1000
}

fn default_fixed_inflation() -> String {
    DEFAULT_FIXED_INFLATION.to_string()
}

fn default_period_days() -> String {
    "30.43".to_string()
}

impl Default for CalculationSettings {
    fn default() -> Self {
        Self {
            mint_denom: default_mint_denom(),
            supply_policy: SupplyPolicyKind::default(),
            escrow_account_address: String::new(),
            fixed_supply_offset: default_fixed_supply_offset(),
            max_scan_blocks: default_max_scan_blocks(),
            inflation_mode: InflationMode::default(),
            fixed_inflation: default_fixed_inflation(),
            period_days: default_period_days(),
        }
    }
}

/// Refresh schedule
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RefreshSettings {
    /// Daily trigger as `HH:MM` in UTC
    #[serde(default = "default_daily_at")]
    pub daily_at: String,

    /// Refresh once before serving
    #[serde(default = "default_true")]
    pub on_startup: bool,
}

fn default_daily_at() -> String {
    "00:00".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            daily_at: default_daily_at(),
            on_startup: true,
        }
    }
}

/// Ethereum supply leg
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EthSettings {
    /// JSON-RPC endpoint
    pub node: String,

    /// ERC-20 token contract
    pub token_address: String,

    /// Treasury accounts whose balances are not circulating
    #[serde(default)]
    pub accounts: Vec<String>,

    /// Token max supply in base units
    #[serde(default = "default_eth_max_supply")]
    pub max_supply: String,
}

fn default_eth_max_supply() -> String {
    ETH_MAX_SUPPLY.to_string()
}

impl EthSettings {
    pub fn max_supply(&self) -> Result<BigInt> {
        parse_int(&self.max_supply).map_err(|e| invalid("eth.max_supply", e))
    }
}

/// Log output format
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directive
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Metrics configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Serve `/metrics`
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}
