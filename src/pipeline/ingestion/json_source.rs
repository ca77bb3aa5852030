use super::{SourceFormat, SourceLoader};
use crate::error::{Result, SalesError};
use crate::types::{RawRecord, RawValue};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

/// JSON exports, either an array of row objects or an object of columns keyed by row label
pub struct JsonSource;

impl JsonSource {
    pub fn parse_records(content: &str) -> Result<Vec<RawRecord>> {
        let value: Value = serde_json::from_str(content)?;

        let rows = match value {
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::Object(row) => Ok(row),
                    other => Err(SalesError::UnsupportedFormat(format!(
                        "JSON row {} is {}, expected an object",
                        i,
                        kind(&other)
                    ))),
                })
                .collect::<Result<Vec<_>>>()?,
            Value::Object(columns) => columns_to_rows(columns)?,
            other => {
                return Err(SalesError::UnsupportedFormat(format!(
                    "JSON document is {}, expected an array or object",
                    kind(&other)
                )))
            }
        };

        // Column set is the union of all keys, in first-seen order
        let mut seen = HashSet::new();
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if seen.insert(key.as_str()) {
                    columns.push(key.clone());
                }
            }
        }

        Ok(rows
            .iter()
            .map(|row| {
                let mut record = RawRecord::new();
                for name in &columns {
                    let value = row.get(name).map(json_to_raw).unwrap_or(RawValue::Empty);
                    record.push(name.clone(), value);
                }
                record
            })
            .collect())
    }
}

impl SourceLoader for JsonSource {
    fn format(&self) -> SourceFormat {
        SourceFormat::Json
    }

    fn load(&self, path: &Path) -> Result<Vec<RawRecord>> {
        let content = fs::read_to_string(path)?;
        Self::parse_records(&content)
    }
}

/// `{"col": {"0": v, "1": v}, ...}` → one object per row label
fn columns_to_rows(columns: Map<String, Value>) -> Result<Vec<Map<String, Value>>> {
    let mut row_index: HashMap<String, usize> = HashMap::new();
    let mut rows: Vec<Map<String, Value>> = Vec::new();

    for (column, cells) in columns {
        let cells = match cells {
            Value::Object(cells) => cells,
            other => {
                return Err(SalesError::UnsupportedFormat(format!(
                    "JSON column '{}' is {}, expected an object of row labels",
                    column,
                    kind(&other)
                )))
            }
        };

        for (label, cell) in cells {
            let idx = *row_index.entry(label).or_insert_with(|| {
                rows.push(Map::new());
                rows.len() - 1
            });
            rows[idx].insert(column.clone(), cell);
        }
    }

    Ok(rows)
}

fn json_to_raw(value: &Value) -> RawValue {
    match value {
        Value::Null => RawValue::Empty,
        Value::String(s) => RawValue::text(s.trim()),
        Value::Number(n) => match n.as_i64() {
            Some(i) => RawValue::Int(i),
            None => n.as_f64().map(RawValue::Float).unwrap_or(RawValue::Empty),
        },
        Value::Bool(true) => RawValue::text("True"),
        Value::Bool(false) => RawValue::text("False"),
        nested => RawValue::Text(nested.to_string()),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
