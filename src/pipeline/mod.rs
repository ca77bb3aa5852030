// Data cleaning pipeline: ingestion, processing, and run results

pub mod ingestion;
pub mod processing;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::app::normalize_use_case::NormalizeUseCase;
use crate::app::ports::RejectionOutputPort;
use crate::app::quality_gate_use_case::{QualityGateBatchStats, QualityGateUseCase};
use crate::config::Config;
use crate::error::Result;
use crate::observability::metrics;
use crate::types::{CleanRecord, RawRecord, SourceBatch, StagedRecord};
use self::processing::analytics::SalesAnalytics;
use self::processing::normalize::AliasTable;
use self::processing::quality_gate::RejectedRecord;

/// Runs load → normalize → validate over the configured sources
pub struct Pipeline {
    config: Config,
    alias_table: AliasTable,
}

/// Per-source counts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceStats {
    pub source: String,
    pub raw_records: usize,
    pub accepted: usize,
    pub rejected: usize,
}

/// Headline numbers of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineStats {
    pub raw_records: usize,
    pub cleaned_records: usize,
    pub removed_records: usize,
    pub sources: Vec<SourceStats>,
    pub quality: QualityGateBatchStats,
    pub duration_ms: u64,
}

/// The result of one pass over all sources.
///
/// `staged` holds every record after header normalization (rejected ones
/// included) since the product catalog is built from it; `dataset` holds
/// the accepted records in source order.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub staged: Vec<SourceBatch<StagedRecord>>,
    pub dataset: Vec<CleanRecord>,
    pub rejected: Vec<RejectedRecord>,
    pub stats: PipelineStats,
}

/// Serializable summary written by the JSON report output
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub stats: PipelineStats,
    pub analytics: SalesAnalytics,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let alias_table = AliasTable::with_overrides(config.alias_overrides()?)?;
        Ok(Self { config, alias_table })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn alias_table(&self) -> &AliasTable {
        &self.alias_table
    }

    /// Load every configured source and process it
    #[instrument(skip_all)]
    pub fn run(&self, rejected_output: Option<Box<dyn RejectionOutputPort>>) -> Result<PipelineRun> {
        let raw = ingestion::load_all(&self.config.sources)?;
        self.process(raw, rejected_output)
    }

    /// Normalize and validate already-loaded batches, concatenating accepted
    /// records in batch order
    pub fn process(
        &self,
        raw: Vec<SourceBatch<RawRecord>>,
        rejected_output: Option<Box<dyn RejectionOutputPort>>,
    ) -> Result<PipelineRun> {
        let timer = Instant::now();
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(%run_id, sources = raw.len(), "Starting pipeline run");

        let normalize = NormalizeUseCase::with_alias_table(self.alias_table.clone());
        let mut quality_gate = QualityGateUseCase::with_default_quality_gate(rejected_output);

        let mut staged = Vec::with_capacity(raw.len());
        let mut dataset = Vec::new();
        let mut rejected = Vec::new();
        let mut stats = PipelineStats::default();

        for batch in &raw {
            let staged_batch = normalize.normalize_batch(batch);
            let outcome = quality_gate.assess_batch(&staged_batch)?;

            stats.sources.push(SourceStats {
                source: batch.source.clone(),
                raw_records: batch.records.len(),
                accepted: outcome.accepted.len(),
                rejected: outcome.rejected.len(),
            });
            stats.quality.merge(&outcome.stats);

            dataset.extend(outcome.accepted);
            rejected.extend(outcome.rejected);
            staged.push(staged_batch);
        }

        stats.raw_records = raw.iter().map(|b| b.records.len()).sum();
        stats.cleaned_records = dataset.len();
        stats.removed_records = stats.raw_records - stats.cleaned_records;

        let elapsed = timer.elapsed();
        stats.duration_ms = elapsed.as_millis() as u64;
        metrics::pipeline::run_completed(elapsed.as_secs_f64());

        if stats.raw_records > 0 && stats.cleaned_records == 0 {
            warn!("Every record was rejected");
        }
        info!(
            %run_id,
            raw = stats.raw_records,
            cleaned = stats.cleaned_records,
            removed = stats.removed_records,
            "Pipeline run finished"
        );

        Ok(PipelineRun {
            run_id,
            started_at,
            staged,
            dataset,
            rejected,
            stats,
        })
    }
}

impl PipelineRun {
    pub fn analytics(&self, top_customers: usize) -> SalesAnalytics {
        SalesAnalytics::compute(&self.staged, &self.dataset, top_customers)
    }

    pub fn report(&self, top_customers: usize) -> RunReport {
        RunReport {
            run_id: self.run_id,
            generated_at: Utc::now(),
            stats: self.stats.clone(),
            analytics: self.analytics(top_customers),
        }
    }

    /// The first `n` cleaned records
    pub fn preview(&self, n: usize) -> &[CleanRecord] {
        &self.dataset[..n.min(self.dataset.len())]
    }
}
