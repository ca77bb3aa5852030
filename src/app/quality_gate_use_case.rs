use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::app::ports::RejectionOutputPort;
use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::processing::quality_gate::{
    DefaultQualityGate, DefaultedField, GateDecision, QualityGate, RejectedRecord,
};
use crate::types::{CleanRecord, SourceBatch, StagedRecord};

/// Use case for validating staged records through the quality gate
pub struct QualityGateUseCase {
    quality_gate: Box<dyn QualityGate>,
    rejected_output: Option<Box<dyn RejectionOutputPort>>,
}

/// Everything one batch produced
#[derive(Debug, Default)]
pub struct QualityGateOutcome {
    pub accepted: Vec<CleanRecord>,
    pub rejected: Vec<RejectedRecord>,
    pub stats: QualityGateBatchStats,
}

impl QualityGateUseCase {
    pub fn new(
        quality_gate: Box<dyn QualityGate>,
        rejected_output: Option<Box<dyn RejectionOutputPort>>,
    ) -> Self {
        Self {
            quality_gate,
            rejected_output,
        }
    }

    /// Create a use case with the default quality gate
    pub fn with_default_quality_gate(rejected_output: Option<Box<dyn RejectionOutputPort>>) -> Self {
        Self::new(Box::new(DefaultQualityGate::new()), rejected_output)
    }

    /// Assess every record of one source, in order
    pub fn assess_batch(&mut self, batch: &SourceBatch<StagedRecord>) -> Result<QualityGateOutcome> {
        let mut outcome = QualityGateOutcome::default();

        for (row, record) in batch.records.iter().enumerate() {
            outcome.stats.total_records += 1;

            match self.quality_gate.assess(&batch.source, record) {
                GateDecision::Accept { record, defaulted } => {
                    metrics::quality_gate::record_accepted(&batch.source);
                    for field in &defaulted {
                        metrics::quality_gate::default_applied(field.as_str());
                        outcome.stats.count_default(*field);
                    }
                    outcome.stats.accepted_count += 1;
                    outcome.accepted.push(record);
                }
                GateDecision::Reject(reason) => {
                    debug!(source = %batch.source, row, reason = %reason, "Rejected record");
                    metrics::quality_gate::record_rejected(&batch.source, reason.code());
                    outcome.stats.rejected_count += 1;
                    *outcome
                        .stats
                        .rejected_by_reason
                        .entry(reason.code().to_string())
                        .or_default() += 1;

                    let rejected = RejectedRecord {
                        source: batch.source.clone(),
                        row,
                        reason,
                        fields: record.clone(),
                    };
                    if let Some(output) = self.rejected_output.as_mut() {
                        output.write_rejection(&rejected)?;
                    }
                    outcome.rejected.push(rejected);
                }
            }
        }

        if let Some(output) = self.rejected_output.as_mut() {
            output.flush()?;
        }

        metrics::quality_gate::batch_processed(outcome.stats.total_records);
        info!(
            source = %batch.source,
            accepted = outcome.stats.accepted_count,
            rejected = outcome.stats.rejected_count,
            "Quality gate finished"
        );

        Ok(outcome)
    }
}

/// Statistics for a batch of quality gate assessments
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QualityGateBatchStats {
    pub total_records: usize,
    pub accepted_count: usize,
    pub rejected_count: usize,
    pub rejected_by_reason: BTreeMap<String, usize>,
    pub customer_defaulted: usize,
    pub quantity_defaulted: usize,
    pub date_missing: usize,
}

impl QualityGateBatchStats {
    fn count_default(&mut self, field: DefaultedField) {
        match field {
            DefaultedField::CustomerName => self.customer_defaulted += 1,
            DefaultedField::Quantity => self.quantity_defaulted += 1,
            DefaultedField::OrderDate => self.date_missing += 1,
        }
    }

    /// Fold another batch's numbers into this one
    pub fn merge(&mut self, other: &QualityGateBatchStats) {
        self.total_records += other.total_records;
        self.accepted_count += other.accepted_count;
        self.rejected_count += other.rejected_count;
        for (reason, count) in &other.rejected_by_reason {
            *self.rejected_by_reason.entry(reason.clone()).or_default() += count;
        }
        self.customer_defaulted += other.customer_defaulted;
        self.quantity_defaulted += other.quantity_defaulted;
        self.date_missing += other.date_missing;
    }

    /// Calculate acceptance rate as percentage
    pub fn acceptance_rate(&self) -> f64 {
        if self.total_records == 0 {
            return 0.0;
        }
        self.accepted_count as f64 / self.total_records as f64 * 100.0
    }

    /// Calculate rejection rate as percentage
    pub fn rejection_rate(&self) -> f64 {
        if self.total_records == 0 {
            return 0.0;
        }
        self.rejected_count as f64 / self.total_records as f64 * 100.0
    }
}
