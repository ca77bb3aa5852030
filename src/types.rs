use crate::constants;
use chrono::NaiveDate;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// A single cell as handed over by a source loader.
///
/// Missing cells are always `Empty`, never an absent key, so downstream
/// stages can rely on every record of a source carrying the same columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawValue {
    Int(i64),
    Float(f64),
    Text(String),
    Empty,
}

impl RawValue {
    /// Empty cells, empty strings and numeric zero count as "not provided".
    ///
    /// Numeric text is judged by its value, so a CSV "0" behaves like a JSON 0.
    pub fn is_truthy(&self) -> bool {
        match self {
            RawValue::Empty => false,
            RawValue::Text(s) => match s.trim().parse::<f64>() {
                Ok(n) => n != 0.0,
                Err(_) => !s.is_empty(),
            },
            RawValue::Int(i) => *i != 0,
            RawValue::Float(f) => *f != 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, RawValue::Empty)
    }

    /// Wrap a string cell, mapping blank text to the empty sentinel
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.is_empty() {
            RawValue::Empty
        } else {
            RawValue::Text(s)
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Int(i) => write!(f, "{}", i),
            // integral floats keep a trailing ".0" so 3.0 never reads as an int column
            RawValue::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 => {
                write!(f, "{:.1}", v)
            }
            RawValue::Float(v) => write!(f, "{}", v),
            RawValue::Text(s) => f.write_str(s),
            RawValue::Empty => Ok(()),
        }
    }
}

/// Ordered field-name → value pairs, in source column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldRecord {
    fields: Vec<(String, RawValue)>,
}

/// A record exactly as loaded, with source-specific header names
pub type RawRecord = FieldRecord;

/// A record whose headers have been mapped onto canonical keys but not yet validated
pub type StagedRecord = FieldRecord;

impl FieldRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: Vec<(String, RawValue)>) -> Self {
        Self { fields }
    }

    pub fn push(&mut self, name: impl Into<String>, value: RawValue) {
        self.fields.push((name.into(), value));
    }

    /// Set a field, replacing the value in place when the name already exists.
    /// Returns true when an existing value was overwritten.
    pub fn upsert(&mut self, name: &str, value: RawValue) -> bool {
        match self.fields.iter_mut().find(|(k, _)| k == name) {
            Some((_, slot)) => {
                *slot = value;
                true
            }
            None => {
                self.fields.push((name.to_string(), value));
                false
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for FieldRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Records from one input file, tagged with the source's configured name
#[derive(Debug, Clone)]
pub struct SourceBatch<T> {
    pub source: String,
    pub records: Vec<T>,
}

impl<T> SourceBatch<T> {
    pub fn new(source: impl Into<String>, records: Vec<T>) -> Self {
        Self {
            source: source.into(),
            records,
        }
    }
}

/// The six standardized field names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CanonicalKey {
    OrderId,
    CustomerName,
    Product,
    Quantity,
    UnitPrice,
    OrderDate,
}

impl CanonicalKey {
    pub const ALL: [CanonicalKey; 6] = [
        CanonicalKey::OrderId,
        CanonicalKey::CustomerName,
        CanonicalKey::Product,
        CanonicalKey::Quantity,
        CanonicalKey::UnitPrice,
        CanonicalKey::OrderDate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalKey::OrderId => constants::ORDER_ID,
            CanonicalKey::CustomerName => constants::CUSTOMER_NAME,
            CanonicalKey::Product => constants::PRODUCT,
            CanonicalKey::Quantity => constants::QUANTITY,
            CanonicalKey::UnitPrice => constants::UNIT_PRICE,
            CanonicalKey::OrderDate => constants::ORDER_DATE,
        }
    }

    pub fn is_canonical(name: &str) -> bool {
        Self::ALL.iter().any(|k| k.as_str() == name)
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonicalKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown canonical key '{}'", s))
    }
}

/// Normalized order date, or the no-date marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDate {
    Known(NaiveDate),
    Missing,
}

impl OrderDate {
    pub fn is_known(&self) -> bool {
        matches!(self, OrderDate::Known(_))
    }
}

impl fmt::Display for OrderDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderDate::Known(d) => write!(f, "{}", d.format(constants::ISO_DATE_FORMAT)),
            OrderDate::Missing => Ok(()),
        }
    }
}

impl Serialize for OrderDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            OrderDate::Known(_) => serializer.serialize_str(&self.to_string()),
            OrderDate::Missing => serializer.serialize_none(),
        }
    }
}

/// An accepted, fully normalized sales record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanRecord {
    pub order_id: RawValue,
    pub customer_name: String,
    pub product: String,
    pub quantity: u64,
    pub unit_price: f64,
    pub order_date: OrderDate,
    /// Non-canonical fields carried through untouched
    pub extra: FieldRecord,
    /// Name of the source this record came from
    pub source: String,
}

impl CleanRecord {
    pub fn revenue(&self) -> f64 {
        self.quantity as f64 * self.unit_price
    }
}
