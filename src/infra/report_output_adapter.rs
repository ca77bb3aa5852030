use crate::app::ports::ReportOutputPort;
use crate::error::Result;
use crate::pipeline::RunReport;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Writes the run report as pretty-printed JSON
pub struct JsonReportOutputAdapter {
    file_path: PathBuf,
}

impl JsonReportOutputAdapter {
    pub fn new(file_path: &Path) -> Self {
        Self {
            file_path: file_path.to_path_buf(),
        }
    }
}

impl ReportOutputPort for JsonReportOutputAdapter {
    fn write_report(&mut self, report: &RunReport) -> Result<()> {
        if let Some(dir) = self.file_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let mut writer = BufWriter::new(fs::File::create(&self.file_path)?);
        serde_json::to_writer_pretty(&mut writer, report)?;
        writeln!(writer)?;
        writer.flush()?;

        info!("Wrote report to {}", self.file_path.display());
        Ok(())
    }
}
