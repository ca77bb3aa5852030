//! Metrics for the cleaning pipeline
//!
//! Recording goes through the `metrics` facade, so every call is a no-op
//! until a recorder is installed with [`init`]. The Prometheus recorder is
//! only rendered to text on demand; there is no listener.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::fmt;
use std::sync::OnceLock;
use tracing::info;

/// Enum representing all metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Ingestion
    IngestionRecordsLoaded,
    IngestionDuration,

    // Header normalization
    NormalizeRecordsProcessed,
    NormalizeHeaderCollisions,

    // Quality gate
    QualityGateRecordsAccepted,
    QualityGateRecordsRejected,
    QualityGateDefaultsApplied,
    QualityGateBatchSize,

    // Whole run
    PipelineRuns,
    PipelineDuration,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::IngestionRecordsLoaded => "sales_ingestion_records_loaded_total",
            MetricName::IngestionDuration => "sales_ingestion_duration_seconds",
            MetricName::NormalizeRecordsProcessed => "sales_normalize_records_processed_total",
            MetricName::NormalizeHeaderCollisions => "sales_normalize_header_collisions_total",
            MetricName::QualityGateRecordsAccepted => "sales_quality_gate_records_accepted_total",
            MetricName::QualityGateRecordsRejected => "sales_quality_gate_records_rejected_total",
            MetricName::QualityGateDefaultsApplied => "sales_quality_gate_defaults_applied_total",
            MetricName::QualityGateBatchSize => "sales_quality_gate_batch_size",
            MetricName::PipelineRuns => "sales_pipeline_runs_total",
            MetricName::PipelineDuration => "sales_pipeline_duration_seconds",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the in-process Prometheus recorder. Safe to call more than once.
pub fn init() -> Result<(), String> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))?;
    METRICS_HANDLE.set(handle).ok();
    info!("Metrics recorder installed");
    Ok(())
}

/// Prometheus text exposition of everything recorded so far, if a recorder is installed
pub fn render() -> Option<String> {
    METRICS_HANDLE.get().map(|handle| handle.render())
}

// ============================================================================
// Ingestion Metrics
// ============================================================================

pub mod ingestion {
    use super::MetricName;

    pub fn records_loaded(source: &str, format: &str, count: usize) {
        ::metrics::counter!(MetricName::IngestionRecordsLoaded.as_str(),
            "source" => source.to_string(),
            "format" => format.to_string()
        )
        .increment(count as u64);
    }

    pub fn duration(source: &str, secs: f64) {
        ::metrics::histogram!(MetricName::IngestionDuration.as_str(), "source" => source.to_string())
            .record(secs);
    }
}

// ============================================================================
// Normalize Metrics
// ============================================================================

pub mod normalize {
    use super::MetricName;

    pub fn records_processed(source: &str, count: usize) {
        ::metrics::counter!(MetricName::NormalizeRecordsProcessed.as_str(), "source" => source.to_string())
            .increment(count as u64);
    }

    /// Two columns of one record mapped onto the same canonical key
    pub fn header_collision(canonical: &'static str) {
        ::metrics::counter!(MetricName::NormalizeHeaderCollisions.as_str(), "field" => canonical)
            .increment(1);
    }
}

// ============================================================================
// Quality Gate Metrics
// ============================================================================

pub mod quality_gate {
    use super::MetricName;

    pub fn record_accepted(source: &str) {
        ::metrics::counter!(MetricName::QualityGateRecordsAccepted.as_str(), "source" => source.to_string())
            .increment(1);
    }

    pub fn record_rejected(source: &str, reason: &'static str) {
        ::metrics::counter!(MetricName::QualityGateRecordsRejected.as_str(),
            "source" => source.to_string(),
            "reason" => reason
        )
        .increment(1);
    }

    pub fn default_applied(field: &'static str) {
        ::metrics::counter!(MetricName::QualityGateDefaultsApplied.as_str(), "field" => field)
            .increment(1);
    }

    pub fn batch_processed(total_records: usize) {
        ::metrics::histogram!(MetricName::QualityGateBatchSize.as_str()).record(total_records as f64);
    }
}

// ============================================================================
// Pipeline Metrics
// ============================================================================

pub mod pipeline {
    use super::MetricName;

    pub fn run_completed(secs: f64) {
        ::metrics::counter!(MetricName::PipelineRuns.as_str()).increment(1);
        ::metrics::histogram!(MetricName::PipelineDuration.as_str()).record(secs);
    }
}
