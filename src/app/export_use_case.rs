use tracing::info;

use crate::app::ports::{CleanedDatasetOutputPort, ReportOutputPort};
use crate::error::Result;
use crate::pipeline::{PipelineRun, RunReport};

/// Use case for persisting the results of a pipeline run
pub struct ExportUseCase {
    dataset_output: Option<Box<dyn CleanedDatasetOutputPort>>,
    report_output: Option<Box<dyn ReportOutputPort>>,
}

impl ExportUseCase {
    pub fn new(
        dataset_output: Option<Box<dyn CleanedDatasetOutputPort>>,
        report_output: Option<Box<dyn ReportOutputPort>>,
    ) -> Self {
        Self {
            dataset_output,
            report_output,
        }
    }

    /// Write the cleaned dataset and, when configured, the analytics report
    pub fn export(&mut self, run: &PipelineRun, top_customers: usize) -> Result<Option<RunReport>> {
        if let Some(output) = self.dataset_output.as_mut() {
            output.write_dataset(&run.dataset)?;
            info!(records = run.dataset.len(), "Exported cleaned dataset");
        }

        match self.report_output.as_mut() {
            Some(output) => {
                let report = run.report(top_customers);
                output.write_report(&report)?;
                info!(run_id = %report.run_id, "Exported analytics report");
                Ok(Some(report))
            }
            None => Ok(None),
        }
    }
}
