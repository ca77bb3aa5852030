use tracing::{debug, info};

use crate::observability::metrics;
use crate::pipeline::processing::normalize::{AliasNormalizer, AliasTable, Normalizer};
use crate::types::{RawRecord, SourceBatch, StagedRecord};

/// Use case for mapping source headers onto the canonical schema
pub struct NormalizeUseCase {
    normalizer: Box<dyn Normalizer>,
}

impl NormalizeUseCase {
    pub fn new(normalizer: Box<dyn Normalizer>) -> Self {
        Self { normalizer }
    }

    /// Create a use case around an alias table
    pub fn with_alias_table(table: AliasTable) -> Self {
        Self {
            normalizer: Box::new(AliasNormalizer::new(table)),
        }
    }

    pub fn normalize_record(&self, record: &RawRecord) -> StagedRecord {
        self.normalizer.normalize(record)
    }

    /// Normalize one source's records, preserving order
    pub fn normalize_batch(&self, batch: &SourceBatch<RawRecord>) -> SourceBatch<StagedRecord> {
        let staged: Vec<StagedRecord> = batch
            .records
            .iter()
            .map(|record| self.normalize_record(record))
            .collect();

        if let Some(first) = staged.first() {
            debug!(source = %batch.source, fields = ?first.keys().collect::<Vec<_>>(), "Normalized headers");
        }
        metrics::normalize::records_processed(&batch.source, staged.len());
        info!(source = %batch.source, records = staged.len(), "Normalized source");

        SourceBatch::new(batch.source.clone(), staged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawValue;

    #[test]
    fn test_normalize_batch_keeps_source_and_order() {
        let use_case = NormalizeUseCase::with_alias_table(AliasTable::defaults().unwrap());
        let batch = SourceBatch::new(
            "q2",
            vec![
                RawRecord::from_fields(vec![("Order_ID".to_string(), RawValue::Int(2001))]),
                RawRecord::from_fields(vec![("Order_ID".to_string(), RawValue::Int(2002))]),
            ],
        );

        let staged = use_case.normalize_batch(&batch);
        assert_eq!(staged.source, "q2");
        assert_eq!(staged.records.len(), 2);
        assert_eq!(staged.records[1].get("order_id"), Some(&RawValue::Int(2002)));
    }

    struct UppercaseNormalizer;

    impl Normalizer for UppercaseNormalizer {
        fn normalize(&self, record: &RawRecord) -> StagedRecord {
            StagedRecord::from_fields(
                record
                    .iter()
                    .map(|(k, v)| (k.to_uppercase(), v.clone()))
                    .collect(),
            )
        }
    }

    #[test]
    fn test_custom_normalizer_is_used() {
        let use_case = NormalizeUseCase::new(Box::new(UppercaseNormalizer));
        let record = RawRecord::from_fields(vec![("qty".to_string(), RawValue::text("2"))]);
        let staged = use_case.normalize_record(&record);
        assert_eq!(staged.get("QTY"), Some(&RawValue::text("2")));
    }
}
