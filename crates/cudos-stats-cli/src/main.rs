//! Cudos Stats CLI
//!
//! Runs the statistics service, a single refresh, or the offline minting calculator.

use clap::{Parser, Subcommand};
use cudos_stats_economics::{format_supply, Dec, MintGenesisState, MintedSupplyCalculator};
use cudos_stats_service::config::{LogFormat, LoggingConfig};
use cudos_stats_service::{StatsConfig, StatsService};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "cudos-stats")]
#[command(author, version)]
#[command(about = "Supply, inflation and staking APR statistics for the Cudos network", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "config.yaml", env = "CUDOS_STATS_CONFIG")]
    config: PathBuf,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh daily and serve the HTTP API (default)
    Run,

    /// Run one refresh cycle and print the cache as JSON
    Once,

    /// Compute minted tokens between two heights without a node
    Minted {
        /// Position on the minting curve at `from`
        #[arg(long, default_value = "0")]
        norm_time_passed: String,

        #[arg(long, default_value = "17280")]
        blocks_per_day: String,

        /// Height at which `norm_time_passed` was observed
        #[arg(long, default_value_t = 1)]
        from: i64,

        /// Height to integrate from
        #[arg(long)]
        to: i64,

        /// Days of minting to sum
        #[arg(long, default_value = "30.43")]
        period_days: String,
    },

    /// Version information
    Version,
}

fn init_logging(logging: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (text, json) = match logging.format {
        LogFormat::Text => (Some(tracing_subscriber::fmt::layer().with_target(true)), None),
        LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(text)
        .with(json)
        .init();
}

fn load_config(path: &Path, verbose: bool) -> anyhow::Result<StatsConfig> {
    let config = StatsConfig::load(path)?;
    init_logging(&config.logging, verbose);
    tracing::info!(config = ?path, "Configuration loaded");
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let config = load_config(&cli.config, cli.verbose)?;
            let service = StatsService::from_config(config)?;
            service.serve().await?;
        }

        Commands::Once => {
            let config = load_config(&cli.config, cli.verbose)?;
            let service = StatsService::from_config(config)?;
            let report = service.run_once().await;

            let output = serde_json::json!({
                "report": &report,
                "cache": service.cache().snapshot(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);

            if !report.is_success() {
                anyhow::bail!("refresh cycle finished with failures");
            }
        }

        Commands::Minted {
            norm_time_passed,
            blocks_per_day,
            from,
            to,
            period_days,
        } => {
            init_logging(&LoggingConfig::default(), cli.verbose);

            let genesis = MintGenesisState::parse(&norm_time_passed, &blocks_per_day)?;
            let period_days: Dec = period_days.parse()?;
            let minted = MintedSupplyCalculator::default().minted_tokens_since(&genesis, from, to, &period_days);

            println!("Minted:  {} acudos", minted);
            println!("Tokens:  {} CUDOS", format_supply(&minted.to_string())?);
        }

        Commands::Version => {
            println!("cudos-stats v{}", env!("CARGO_PKG_VERSION"));
            if cfg!(feature = "ethereum") {
                println!("Features: ethereum");
            }
        }
    }

    Ok(())
}
