//! # Cudos Stats Service
//!
//! Refreshes supply, inflation and staking APR from a Cudos node once a day
//! and serves the cached figures over read-only HTTP endpoints.
//!
//! ```text
//!   node / REST ──▶ InflationPipeline ──┐
//!                                       ├──▶ MetricsCache ──▶ axum handlers
//!   node / REST ──▶ AprPipeline ────────┘
//! ```

pub mod api;
pub mod cache;
pub mod clients;
pub mod config;
pub mod error;
pub mod metrics;
pub mod query;
pub mod resolver;
pub mod service;
pub mod tasks;

pub use cache::{keys, CacheBatch, MetricEntry, MetricsCache};
pub use config::StatsConfig;
pub use error::{Result, StatsError};
pub use metrics::StatsMetrics;
pub use resolver::{EthereumSupply, ResolverSettings, SupplyPolicy, SupplyResolution, SupplyResolver};
pub use service::StatsService;
pub use tasks::{CycleReport, DailySchedule, Pipeline, PipelineOutcome, PipelineRun, RefreshOrchestrator};
