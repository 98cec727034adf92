//! Prometheus metrics

use crate::error::Result;
use crate::tasks::{CycleReport, PipelineOutcome};
use prometheus::{Encoder, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};

/// Refresh counters and metric heights
pub struct StatsMetrics {
    registry: Registry,
    refresh_total: IntCounterVec,
    metric_height: IntGaugeVec,
}

impl StatsMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let refresh_total = IntCounterVec::new(
            Opts::new("cudos_stats_refresh_total", "Refresh pipeline runs by outcome"),
            &["pipeline", "outcome"],
        )?;
        let metric_height = IntGaugeVec::new(
            Opts::new("cudos_stats_metric_height", "Chain height of the cached metric"),
            &["metric"],
        )?;

        registry.register(Box::new(refresh_total.clone()))?;
        registry.register(Box::new(metric_height.clone()))?;

        Ok(Self {
            registry,
            refresh_total,
            metric_height,
        })
    }

    /// Count each pipeline outcome and track committed heights
    pub fn record_cycle(&self, report: &CycleReport) {
        for (pipeline, outcome) in report.outcomes() {
            self.refresh_total
                .with_label_values(&[pipeline, outcome.label()])
                .inc();
            if let PipelineOutcome::Succeeded { height, .. } = outcome {
                self.metric_height.with_label_values(&[pipeline]).set(*height);
            }
        }
    }

    /// Text exposition format
    pub fn encode(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
