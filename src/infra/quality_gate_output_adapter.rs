use crate::app::ports::RejectionOutputPort;
use crate::error::Result;
use crate::pipeline::processing::quality_gate::RejectedRecord;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// File-based implementation of RejectionOutputPort
/// Writes rejected records to an NDJSON file, one record per line
pub struct FileRejectionOutputAdapter {
    file_writer: BufWriter<fs::File>,
    file_path: PathBuf,
}

impl FileRejectionOutputAdapter {
    pub fn new(file_path: &Path) -> Result<Self> {
        if let Some(dir) = file_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        info!("Creating rejection log: {}", file_path.display());

        let file_writer = BufWriter::new(
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(file_path)?,
        );

        Ok(Self {
            file_writer,
            file_path: file_path.to_path_buf(),
        })
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

impl RejectionOutputPort for FileRejectionOutputAdapter {
    fn write_rejection(&mut self, rejected: &RejectedRecord) -> Result<()> {
        let json_line = serde_json::to_string(rejected)?;
        writeln!(self.file_writer, "{}", json_line)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.file_writer.flush()?;
        Ok(())
    }
}
