// Pipeline ingestion: turning source files into ordered raw records

pub mod csv_source;
pub mod json_source;
pub mod spreadsheet_source;

use crate::config::SourceConfig;
use crate::error::{Result, SalesError};
use crate::observability::metrics;
use crate::types::{RawRecord, SourceBatch};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;
use tracing::{info, instrument, warn};

pub use csv_source::CsvSource;
pub use json_source::JsonSource;
pub use spreadsheet_source::SpreadsheetSource;

/// Supported input file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Csv,
    Json,
    Spreadsheet,
}

impl SourceFormat {
    /// Infer the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => Ok(SourceFormat::Csv),
            "json" => Ok(SourceFormat::Json),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(SourceFormat::Spreadsheet),
            _ => Err(SalesError::UnsupportedFormat(format!(
                "cannot infer format of '{}'; set `format` explicitly",
                path.display()
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::Csv => "csv",
            SourceFormat::Json => "json",
            SourceFormat::Spreadsheet => "spreadsheet",
        }
    }
}

/// Core trait every source reader implements.
///
/// Loaders must emit one record per data row with every column present;
/// blank or missing cells become `RawValue::Empty`.
pub trait SourceLoader {
    fn format(&self) -> SourceFormat;

    fn load(&self, path: &Path) -> Result<Vec<RawRecord>>;
}

pub fn create_loader(format: SourceFormat, sheet: Option<&str>) -> Box<dyn SourceLoader> {
    match format {
        SourceFormat::Csv => Box::new(CsvSource),
        SourceFormat::Json => Box::new(JsonSource),
        SourceFormat::Spreadsheet => Box::new(SpreadsheetSource::new(sheet.map(str::to_string))),
    }
}

/// Load a single configured source
#[instrument(skip(source), fields(source = %source.name, path = %source.path.display()))]
pub fn load_source(source: &SourceConfig) -> Result<SourceBatch<RawRecord>> {
    let format = match source.format {
        Some(format) => format,
        None => SourceFormat::from_path(&source.path)?,
    };
    let loader = create_loader(format, source.sheet.as_deref());

    let started = Instant::now();
    let records = loader.load(&source.path)?;
    metrics::ingestion::duration(&source.name, started.elapsed().as_secs_f64());
    metrics::ingestion::records_loaded(&source.name, format.as_str(), records.len());

    if records.is_empty() {
        warn!("Source contained no data rows");
    }
    info!(format = format.as_str(), records = records.len(), "Loaded source");

    Ok(SourceBatch::new(source.name.clone(), records))
}

/// Load every configured source, preserving configuration order
pub fn load_all(sources: &[SourceConfig]) -> Result<Vec<SourceBatch<RawRecord>>> {
    sources.iter().map(load_source).collect()
}

/// Give every column a usable, unique name.
///
/// Blank headers become `Unnamed: <index>` and repeated headers get a
/// `.1`, `.2`, ... suffix, so a repeated column never silently replaces
/// an earlier one before header normalization sees it.
pub(crate) fn dedupe_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut headers = Vec::with_capacity(raw.len());

    for (i, name) in raw.into_iter().enumerate() {
        let base = if name.is_empty() {
            format!("Unnamed: {}", i)
        } else {
            name
        };

        let mut candidate = base.clone();
        let mut n = 1;
        while !seen.insert(candidate.clone()) {
            candidate = format!("{}.{}", base, n);
            n += 1;
        }
        headers.push(candidate);
    }

    headers
}
