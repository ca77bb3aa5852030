pub mod cleaned_dataset_output_adapter;
pub mod quality_gate_output_adapter;
pub mod report_output_adapter;

pub use cleaned_dataset_output_adapter::CsvDatasetOutputAdapter;
pub use quality_gate_output_adapter::FileRejectionOutputAdapter;
pub use report_output_adapter::JsonReportOutputAdapter;
