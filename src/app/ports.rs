use crate::error::Result;
use crate::pipeline::processing::quality_gate::RejectedRecord;
use crate::pipeline::RunReport;
use crate::types::CleanRecord;

/// Destination for the cleaned, combined dataset
pub trait CleanedDatasetOutputPort {
    fn write_dataset(&mut self, records: &[CleanRecord]) -> Result<()>;
}

/// Destination for records the quality gate dropped
pub trait RejectionOutputPort {
    fn write_rejection(&mut self, rejected: &RejectedRecord) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Destination for the analytics report of a run
pub trait ReportOutputPort {
    fn write_report(&mut self, report: &RunReport) -> Result<()>;
}
