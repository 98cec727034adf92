//! Refresh pipelines and their orchestration
//!
//! A cycle runs the inflation and APR pipelines as separate tokio tasks. A
//! pipeline computes everything first and returns one [`CacheBatch`]; the
//! orchestrator commits it in a single write, so a failure or panic leaves
//! that pipeline's previous values in place and never touches the other.

mod apr;
mod inflation;
mod scheduler;

pub use apr::AprPipeline;
pub use inflation::{InflationPipeline, InflationSource};
pub use scheduler::DailySchedule;

use crate::cache::{CacheBatch, MetricsCache};
use crate::error::Result;
use crate::metrics::StatsMetrics;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// What a pipeline wants done with the cache
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PipelineRun {
    /// Write `batch`; `height` is the chain height the values describe
    Commit { height: i64, batch: CacheBatch },
    /// Nothing to write
    Skip(String),
}

/// One unit of refresh work
#[async_trait]
pub trait Pipeline: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self) -> Result<PipelineRun>;
}

/// Result of one pipeline within a cycle
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PipelineOutcome {
    Succeeded { height: i64, keys: Vec<String> },
    Skipped { reason: String },
    Failed { error: String },
}

impl PipelineOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            PipelineOutcome::Succeeded { .. } => "success",
            PipelineOutcome::Skipped { .. } => "skipped",
            PipelineOutcome::Failed { .. } => "failure",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, PipelineOutcome::Failed { .. })
    }
}

/// Structured result of a refresh cycle
#[derive(Clone, Debug, Serialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub inflation: PipelineOutcome,
    pub apr: PipelineOutcome,
}

impl CycleReport {
    pub fn is_success(&self) -> bool {
        !self.inflation.is_failure() && !self.apr.is_failure()
    }

    /// `(pipeline, outcome)` pairs in a fixed order
    pub fn outcomes(&self) -> [(&'static str, &PipelineOutcome); 2] {
        [("inflation", &self.inflation), ("apr", &self.apr)]
    }
}

/// Runs both pipelines and commits their results to the cache
pub struct RefreshOrchestrator {
    inflation: Arc<dyn Pipeline>,
    apr: Arc<dyn Pipeline>,
    cache: Arc<MetricsCache>,
    metrics: Option<Arc<StatsMetrics>>,
}

impl RefreshOrchestrator {
    pub fn new(inflation: Arc<dyn Pipeline>, apr: Arc<dyn Pipeline>, cache: Arc<MetricsCache>) -> Self {
        Self {
            inflation,
            apr,
            cache,
            metrics: None,
        }
    }

    /// Record cycle outcomes into Prometheus
    pub fn with_metrics(mut self, metrics: Arc<StatsMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn cache(&self) -> &Arc<MetricsCache> {
        &self.cache
    }

    /// Run one refresh cycle
    pub async fn run_once(&self) -> CycleReport {
        let started_at = Utc::now();
        let clock = Instant::now();
        tracing::info!("Starting refresh cycle");

        let inflation = self.spawn(Arc::clone(&self.inflation));
        let apr = self.spawn(Arc::clone(&self.apr));
        let (inflation, apr) = tokio::join!(inflation, apr);

        let report = CycleReport {
            started_at,
            duration_ms: clock.elapsed().as_millis() as u64,
            inflation,
            apr,
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_cycle(&report);
        }
        tracing::info!(
            success = report.is_success(),
            inflation = report.inflation.label(),
            apr = report.apr.label(),
            duration_ms = report.duration_ms,
            "Refresh cycle finished"
        );

        report
    }

    async fn spawn(&self, pipeline: Arc<dyn Pipeline>) -> PipelineOutcome {
        let name = pipeline.name();
        let handle = tokio::spawn(async move { pipeline.run().await });

        match handle.await {
            Ok(Ok(PipelineRun::Commit { height, batch })) => {
                let keys: Vec<String> = batch.keys().map(str::to_string).collect();
                self.cache.commit(batch);
                tracing::info!(pipeline = name, height, keys = keys.len(), "Pipeline committed");
                PipelineOutcome::Succeeded { height, keys }
            }
            Ok(Ok(PipelineRun::Skip(reason))) => {
                tracing::warn!(pipeline = name, %reason, "Pipeline skipped");
                PipelineOutcome::Skipped { reason }
            }
            Ok(Err(e)) => {
                tracing::error!(pipeline = name, error = %e, "Pipeline failed");
                PipelineOutcome::Failed { error: e.to_string() }
            }
            Err(join_error) => {
                tracing::error!(pipeline = name, error = %join_error, "Pipeline task aborted");
                PipelineOutcome::Failed {
                    error: format!("task aborted: {}", join_error),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::keys;
    use crate::error::StatsError;

    struct Fixed(Option<PipelineRun>, &'static str);

    #[async_trait]
    impl Pipeline for Fixed {
        fn name(&self) -> &'static str {
            self.1
        }

        async fn run(&self) -> Result<PipelineRun> {
            match &self.0 {
                Some(run) => Ok(run.clone()),
                None => Err(StatsError::Http("unreachable node".to_string())),
            }
        }
    }

    struct Panics;

    #[async_trait]
    impl Pipeline for Panics {
        fn name(&self) -> &'static str {
            "apr"
        }

        async fn run(&self) -> Result<PipelineRun> {
            panic!("pipeline bug")
        }
    }

    fn commit(key: &str, value: &str, height: i64) -> Option<PipelineRun> {
        Some(PipelineRun::Commit {
            height,
            batch: CacheBatch::new().metric(key, value, height),
        })
    }

    #[tokio::test]
    async fn test_both_pipelines_commit() {
        let cache = Arc::new(MetricsCache::new());
        let orchestrator = RefreshOrchestrator::new(
            Arc::new(Fixed(commit(keys::INFLATION, "0.1", 5), "inflation")),
            Arc::new(Fixed(commit(keys::APR, "0.2", 6), "apr")),
            Arc::clone(&cache),
        );

        let report = orchestrator.run_once().await;
        assert!(report.is_success());
        assert_eq!(cache.get(keys::INFLATION).unwrap(), "0.1");
        assert_eq!(cache.get_int(keys::APR_HEIGHT).unwrap(), 6);
        assert_eq!(
            report.apr,
            PipelineOutcome::Succeeded {
                height: 6,
                keys: vec![keys::APR.to_string(), keys::APR_HEIGHT.to_string()],
            }
        );
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_values() {
        let cache = Arc::new(MetricsCache::new());
        cache.commit(CacheBatch::new().metric(keys::INFLATION, "old", 1));

        let orchestrator = RefreshOrchestrator::new(
            Arc::new(Fixed(None, "inflation")),
            Arc::new(Fixed(commit(keys::APR, "0.2", 6), "apr")),
            Arc::clone(&cache),
        );
        let report = orchestrator.run_once().await;

        assert!(!report.is_success());
        assert!(report.inflation.is_failure());
        assert_eq!(report.apr.label(), "success");
        assert_eq!(cache.get(keys::INFLATION).unwrap(), "old");
        assert_eq!(cache.get_int(keys::INFLATION_HEIGHT).unwrap(), 1);
        assert_eq!(cache.get(keys::APR).unwrap(), "0.2");
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let cache = Arc::new(MetricsCache::new());
        let orchestrator = RefreshOrchestrator::new(
            Arc::new(Fixed(commit(keys::INFLATION, "0.1", 5), "inflation")),
            Arc::new(Panics),
            Arc::clone(&cache),
        );
        let report = orchestrator.run_once().await;

        assert!(matches!(report.apr, PipelineOutcome::Failed { .. }));
        assert_eq!(cache.get(keys::INFLATION).unwrap(), "0.1");
        assert!(cache.get(keys::APR).is_err());
    }

    #[tokio::test]
    async fn test_skip_leaves_cache_untouched() {
        let cache = Arc::new(MetricsCache::new());
        let orchestrator = RefreshOrchestrator::new(
            Arc::new(Fixed(Some(PipelineRun::Skip("curve exhausted".into())), "inflation")),
            Arc::new(Fixed(Some(PipelineRun::Skip("curve exhausted".into())), "apr")),
            Arc::clone(&cache),
        );
        let report = orchestrator.run_once().await;

        assert!(report.is_success());
        assert_eq!(report.inflation.label(), "skipped");
        assert!(cache.is_empty());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["apr"]["outcome"], "skipped");
    }
}
