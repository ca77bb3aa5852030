use crate::app::ports::CleanedDatasetOutputPort;
use crate::error::Result;
use crate::types::{CanonicalKey, CleanRecord, RawValue};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Writes the combined dataset as CSV: the six canonical columns in
/// canonical order, optionally followed by every extra field seen.
pub struct CsvDatasetOutputAdapter {
    file_path: PathBuf,
    include_extra_fields: bool,
}

impl CsvDatasetOutputAdapter {
    pub fn new(file_path: &Path, include_extra_fields: bool) -> Self {
        Self {
            file_path: file_path.to_path_buf(),
            include_extra_fields,
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Serialize records to any writer
    pub fn write_to<W: Write>(&self, writer: W, records: &[CleanRecord]) -> Result<()> {
        let extra_columns = if self.include_extra_fields {
            extra_columns(records)
        } else {
            Vec::new()
        };

        let mut csv_writer = csv::Writer::from_writer(writer);

        let header = CanonicalKey::ALL
            .iter()
            .map(|k| k.as_str())
            .chain(extra_columns.iter().map(String::as_str));
        csv_writer.write_record(header)?;

        for record in records {
            let mut row = vec![
                record.order_id.to_string(),
                record.customer_name.clone(),
                record.product.clone(),
                record.quantity.to_string(),
                // float cell rendering keeps whole prices as "10.0"
                RawValue::Float(record.unit_price).to_string(),
                record.order_date.to_string(),
            ];
            row.extend(extra_columns.iter().map(|name| {
                record
                    .extra
                    .get(name)
                    .map(|v| v.to_string())
                    .unwrap_or_default()
            }));
            csv_writer.write_record(&row)?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

impl CleanedDatasetOutputPort for CsvDatasetOutputAdapter {
    fn write_dataset(&mut self, records: &[CleanRecord]) -> Result<()> {
        if let Some(dir) = self.file_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let file = fs::File::create(&self.file_path)?;
        self.write_to(file, records)?;
        info!("Wrote {} cleaned records to {}", records.len(), self.file_path.display());
        Ok(())
    }
}

/// Union of extra field names, in first-seen order
fn extra_columns(records: &[CleanRecord]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for name in record.extra.keys() {
            if !columns.iter().any(|c| c == name) {
                columns.push(name.to_string());
            }
        }
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldRecord, OrderDate};
    use chrono::NaiveDate;

    fn record(order_id: RawValue, extra: &[(&str, &str)]) -> CleanRecord {
        CleanRecord {
            order_id,
            customer_name: "Jane Doe".to_string(),
            product: "Widget".to_string(),
            quantity: 3,
            unit_price: 9.99,
            order_date: OrderDate::Missing,
            extra: FieldRecord::from_fields(
                extra
                    .iter()
                    .map(|(k, v)| (k.to_string(), RawValue::text(*v)))
                    .collect(),
            ),
            source: "q1".to_string(),
        }
    }

    fn render(adapter: &CsvDatasetOutputAdapter, records: &[CleanRecord]) -> String {
        let mut buf = Vec::new();
        adapter.write_to(&mut buf, records).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_canonical_columns_only_by_default() {
        let adapter = CsvDatasetOutputAdapter::new(Path::new("unused.csv"), false);
        let mut dated = record(RawValue::Int(2001), &[("Region", "West")]);
        dated.order_date = OrderDate::Known(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());

        let out = render(&adapter, &[record(RawValue::text("1001"), &[]), dated]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "order_id,customer_name,product,quantity,unit_price,order_date");
        assert_eq!(lines[1], "1001,Jane Doe,Widget,3,9.99,");
        assert_eq!(lines[2], "2001,Jane Doe,Widget,3,9.99,2024-03-05");
    }

    #[test]
    fn test_whole_prices_keep_decimal_marker() {
        let adapter = CsvDatasetOutputAdapter::new(Path::new("unused.csv"), false);
        let mut whole = record(RawValue::Int(3002), &[]);
        whole.unit_price = 10.0;

        let out = render(&adapter, &[whole]);
        assert_eq!(out.lines().nth(1), Some("3002,Jane Doe,Widget,3,10.0,"));
    }

    #[test]
    fn test_extra_fields_appended_when_enabled() {
        let adapter = CsvDatasetOutputAdapter::new(Path::new("unused.csv"), true);
        let out = render(
            &adapter,
            &[
                record(RawValue::text("1"), &[("Region", "West")]),
                record(RawValue::text("2"), &[("Channel", "Web"), ("Region", "East")]),
            ],
        );
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].ends_with("order_date,Region,Channel"));
        assert!(lines[1].ends_with(",West,"));
        assert!(lines[2].ends_with(",East,Web"));
    }

    #[test]
    fn test_write_dataset_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed/cleaned_sales.csv");
        let mut adapter = CsvDatasetOutputAdapter::new(&path, false);
        adapter.write_dataset(&[]).unwrap();

        let content = fs::read_to_string(adapter.file_path()).unwrap();
        assert_eq!(content.lines().count(), 1);
    }
}
