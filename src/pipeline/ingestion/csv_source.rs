use super::{dedupe_headers, SourceFormat, SourceLoader};
use crate::error::Result;
use crate::types::{RawRecord, RawValue};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::warn;

/// Comma-separated files with a header row
pub struct CsvSource;

impl CsvSource {
    /// Read records from any CSV reader. Cells are trimmed and blank cells become `Empty`.
    pub fn read_records<R: Read>(reader: R) -> Result<Vec<RawRecord>> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // ragged rows are padded with Empty below
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = dedupe_headers(
            rdr.headers()?
                .iter()
                .map(|h| h.trim_start_matches('\u{feff}').to_string())
                .collect(),
        );

        let mut records = Vec::new();
        for (idx, result) in rdr.records().enumerate() {
            let row = result?;
            if row.len() > headers.len() {
                warn!(
                    row = idx,
                    extra_cells = row.len() - headers.len(),
                    "Row has more cells than headers; extra cells ignored"
                );
            }

            let mut record = RawRecord::new();
            for (i, name) in headers.iter().enumerate() {
                let cell = row.get(i).unwrap_or("");
                record.push(name.clone(), RawValue::text(cell));
            }
            records.push(record);
        }

        Ok(records)
    }
}

impl SourceLoader for CsvSource {
    fn format(&self) -> SourceFormat {
        SourceFormat::Csv
    }

    fn load(&self, path: &Path) -> Result<Vec<RawRecord>> {
        let file = File::open(path)?;
        Self::read_records(file)
    }
}
