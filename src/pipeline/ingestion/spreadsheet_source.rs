use super::{dedupe_headers, SourceFormat, SourceLoader};
use crate::error::{Result, SalesError};
use crate::types::{RawRecord, RawValue};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;
use tracing::debug;

/// Excel and OpenDocument workbooks; one worksheet per source
pub struct SpreadsheetSource {
    sheet: Option<String>,
}

impl SpreadsheetSource {
    pub fn new(sheet: Option<String>) -> Self {
        Self { sheet }
    }

    /// Convert worksheet rows (header first) into records, skipping fully blank rows
    pub fn rows_to_records<'a, I>(rows: I) -> Vec<RawRecord>
    where
        I: IntoIterator<Item = &'a [Data]>,
    {
        let mut rows = rows.into_iter();
        let headers = match rows.next() {
            Some(header_row) => dedupe_headers(
                header_row
                    .iter()
                    .map(|cell| cell_to_raw(cell).to_string())
                    .collect(),
            ),
            None => return Vec::new(),
        };

        rows.filter_map(|row| {
            let values: Vec<RawValue> = headers
                .iter()
                .enumerate()
                .map(|(i, _)| row.get(i).map(cell_to_raw).unwrap_or(RawValue::Empty))
                .collect();
            if values.iter().all(RawValue::is_empty) {
                return None;
            }

            let mut record = RawRecord::new();
            for (name, value) in headers.iter().zip(values) {
                record.push(name.clone(), value);
            }
            Some(record)
        })
        .collect()
    }
}

impl SourceLoader for SpreadsheetSource {
    fn format(&self) -> SourceFormat {
        SourceFormat::Spreadsheet
    }

    fn load(&self, path: &Path) -> Result<Vec<RawRecord>> {
        let mut workbook = open_workbook_auto(path)?;

        let sheet_name = match &self.sheet {
            Some(name) => name.clone(),
            None => workbook.sheet_names().first().cloned().ok_or_else(|| {
                SalesError::Spreadsheet(format!("'{}' has no worksheets", path.display()))
            })?,
        };
        debug!(sheet = %sheet_name, "Reading worksheet");

        let range = workbook.worksheet_range(&sheet_name)?;
        Ok(Self::rows_to_records(range.rows()))
    }
}

fn cell_to_raw(cell: &Data) -> RawValue {
    match cell {
        Data::Empty | Data::Error(_) => RawValue::Empty,
        Data::String(s) => RawValue::text(s.trim()),
        Data::Int(i) => RawValue::Int(*i),
        // Excel stores every number as a float; whole values come back as integers
        Data::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e18 => {
            RawValue::Int(*f as i64)
        }
        Data::Float(f) => RawValue::Float(*f),
        Data::Bool(true) => RawValue::text("True"),
        Data::Bool(false) => RawValue::text("False"),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| RawValue::Text(d.format("%Y-%m-%d %H:%M:%S").to_string()))
            .unwrap_or(RawValue::Empty),
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawValue::text(s.trim()),
    }
}
