use serde::Serialize;
use std::fmt;

use crate::constants::{self, UNKNOWN_CUSTOMER};
use crate::pipeline::processing::date_parser::parse_order_date;
use crate::types::{CanonicalKey, CleanRecord, FieldRecord, OrderDate, RawValue, StagedRecord};

/// Why a staged record was kept out of the cleaned dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectionReason {
    MissingOrderId,
    MissingProduct,
    MissingUnitPrice,
    UnparseableUnitPrice { raw: String },
    NonPositiveUnitPrice { value: f64 },
}

impl RejectionReason {
    /// Stable machine-readable code, used for tallies and metric labels
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::MissingOrderId => "missing_order_id",
            RejectionReason::MissingProduct => "missing_product",
            RejectionReason::MissingUnitPrice => "missing_unit_price",
            RejectionReason::UnparseableUnitPrice { .. } => "unparseable_unit_price",
            RejectionReason::NonPositiveUnitPrice { .. } => "non_positive_unit_price",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::MissingOrderId => f.write_str("order_id is missing"),
            RejectionReason::MissingProduct => f.write_str("product is missing"),
            RejectionReason::MissingUnitPrice => f.write_str("unit_price is missing"),
            RejectionReason::UnparseableUnitPrice { raw } => {
                write!(f, "unit_price '{}' is not a number", raw)
            }
            RejectionReason::NonPositiveUnitPrice { value } => {
                write!(f, "unit_price {} is not positive", value)
            }
        }
    }
}

/// Optional fields that were filled with a default instead of a source value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultedField {
    CustomerName,
    Quantity,
    OrderDate,
}

impl DefaultedField {
    pub fn as_str(&self) -> &'static str {
        match self {
            DefaultedField::CustomerName => constants::CUSTOMER_NAME,
            DefaultedField::Quantity => constants::QUANTITY,
            DefaultedField::OrderDate => constants::ORDER_DATE,
        }
    }
}

/// Outcome of assessing one staged record; nothing partial escapes a rejection
#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    Accept {
        record: CleanRecord,
        defaulted: Vec<DefaultedField>,
    },
    Reject(RejectionReason),
}

impl GateDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, GateDecision::Accept { .. })
    }
}

/// A dropped record, kept for the rejection log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRecord {
    pub source: String,
    /// Zero-based position within its source
    pub row: usize,
    pub reason: RejectionReason,
    pub fields: StagedRecord,
}

/// Trait for per-record validation and cleaning
pub trait QualityGate {
    /// Never fails: bad records come back as `GateDecision::Reject`
    fn assess(&self, source: &str, record: &StagedRecord) -> GateDecision;
}

/// The standard sales rules.
///
/// Required fields are checked first (order_id, product, unit_price, in that
/// order), then unit_price must parse to a positive finite number. Everything
/// after that only normalizes: customer name, quantity and order date fall
/// back to defaults rather than rejecting the record.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultQualityGate;

impl DefaultQualityGate {
    pub fn new() -> Self {
        Self
    }
}

impl QualityGate for DefaultQualityGate {
    fn assess(&self, source: &str, record: &StagedRecord) -> GateDecision {
        let field = |key: CanonicalKey| record.get(key.as_str()).filter(|v| v.is_truthy());

        let order_id = match field(CanonicalKey::OrderId) {
            Some(v) => v,
            None => return GateDecision::Reject(RejectionReason::MissingOrderId),
        };
        let product = match field(CanonicalKey::Product) {
            Some(v) => v,
            None => return GateDecision::Reject(RejectionReason::MissingProduct),
        };
        let raw_price = match field(CanonicalKey::UnitPrice) {
            Some(v) => v,
            None => return GateDecision::Reject(RejectionReason::MissingUnitPrice),
        };

        let unit_price = match parse_unit_price(raw_price) {
            Ok(price) => price,
            Err(reason) => return GateDecision::Reject(reason),
        };

        let mut defaulted = Vec::new();

        let raw_customer = record.get(CanonicalKey::CustomerName.as_str());
        let customer_name = match provided_customer_name(raw_customer) {
            Some(name) => name,
            None => {
                defaulted.push(DefaultedField::CustomerName);
                UNKNOWN_CUSTOMER.to_string()
            }
        };

        let quantity = match record.get(CanonicalKey::Quantity.as_str()).and_then(parse_quantity) {
            Some(q) => q,
            None => {
                defaulted.push(DefaultedField::Quantity);
                0
            }
        };

        let order_date = match record
            .get(CanonicalKey::OrderDate.as_str())
            .filter(|v| v.is_truthy())
            .and_then(date_from_raw)
        {
            Some(date) => OrderDate::Known(date),
            None => {
                defaulted.push(DefaultedField::OrderDate);
                OrderDate::Missing
            }
        };

        let extra = FieldRecord::from_fields(
            record
                .iter()
                .filter(|(k, _)| !CanonicalKey::is_canonical(k))
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        );

        GateDecision::Accept {
            record: CleanRecord {
                order_id: order_id.clone(),
                customer_name,
                product: product.to_string(),
                quantity,
                unit_price,
                order_date,
                extra,
                source: source.to_string(),
            },
            defaulted,
        }
    }
}

/// Positive, finite price or the reason it is unusable
pub fn parse_unit_price(value: &RawValue) -> Result<f64, RejectionReason> {
    let parsed = match value {
        RawValue::Int(i) => Some(*i as f64),
        RawValue::Float(f) => Some(*f),
        RawValue::Text(s) => s.trim().parse::<f64>().ok(),
        RawValue::Empty => None,
    };

    match parsed {
        Some(price) if price.is_finite() && price > 0.0 => Ok(price),
        Some(price) if price.is_finite() => Err(RejectionReason::NonPositiveUnitPrice { value: price }),
        _ => Err(RejectionReason::UnparseableUnitPrice {
            raw: value.to_string(),
        }),
    }
}

/// Non-negative whole quantity, or None when the value can't be used.
///
/// Decimals such as "3.0" are accepted since spreadsheet and JSON exports
/// often render whole numbers that way. A fractional part is truncated
/// whether it arrives as a number or as text.
pub fn parse_quantity(value: &RawValue) -> Option<u64> {
    let parsed: Option<i64> = match value {
        RawValue::Empty => None,
        RawValue::Int(i) => Some(*i),
        RawValue::Float(f) if f.is_finite() => Some(f.trunc() as i64),
        RawValue::Float(_) => None,
        RawValue::Text(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })
        }
    };

    parsed.and_then(|q| u64::try_from(q).ok())
}

/// Trimmed, title-cased name; blank input becomes "Unknown Customer"
pub fn clean_customer_name(value: Option<&RawValue>) -> String {
    provided_customer_name(value).unwrap_or_else(|| UNKNOWN_CUSTOMER.to_string())
}

/// Title-cased name, or None when the input is blank or absent
fn provided_customer_name(value: Option<&RawValue>) -> Option<String> {
    let name = value.map(|v| v.to_string()).unwrap_or_default();
    let name = name.trim();
    if name.is_empty() {
        None
    } else {
        Some(title_case(name))
    }
}

/// Upper-case the first letter of every alphabetic run, lower-case the rest
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;

    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }

    out
}

fn date_from_raw(value: &RawValue) -> Option<chrono::NaiveDate> {
    match value {
        // a bare number is an order total or id that landed in the wrong column, not a date
        RawValue::Int(_) | RawValue::Float(_) | RawValue::Empty => None,
        RawValue::Text(s) => parse_order_date(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn staged(fields: &[(&str, RawValue)]) -> StagedRecord {
        StagedRecord::from_fields(
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    fn text(s: &str) -> RawValue {
        RawValue::text(s)
    }

    fn valid() -> Vec<(&'static str, RawValue)> {
        vec![
            ("order_id", text("1001")),
            ("customer_name", text("  jane DOE ")),
            ("product", text("Widget")),
            ("quantity", text("3")),
            ("unit_price", text("9.99")),
            ("order_date", text("03/05/2024")),
        ]
    }

    fn accept(decision: GateDecision) -> (CleanRecord, Vec<DefaultedField>) {
        match decision {
            GateDecision::Accept { record, defaulted } => (record, defaulted),
            GateDecision::Reject(reason) => panic!("unexpected rejection: {reason}"),
        }
    }

    fn reject(decision: GateDecision) -> RejectionReason {
        match decision {
            GateDecision::Reject(reason) => reason,
            GateDecision::Accept { record, .. } => panic!("unexpected accept: {record:?}"),
        }
    }

    #[test]
    fn test_accepts_and_cleans_valid_record() {
        let gate = DefaultQualityGate::new();
        let (record, defaulted) = accept(gate.assess("q1", &staged(&valid())));

        assert_eq!(record.order_id, text("1001"));
        assert_eq!(record.customer_name, "Jane Doe");
        assert_eq!(record.product, "Widget");
        assert_eq!(record.quantity, 3);
        assert!((record.unit_price - 9.99).abs() < 1e-9);
        assert_eq!(
            record.order_date,
            OrderDate::Known(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap())
        );
        assert_eq!(record.source, "q1");
        assert!(defaulted.is_empty());
    }

    #[test]
    fn test_minimal_record_gets_defaults() {
        let gate = DefaultQualityGate::new();
        let (record, defaulted) = accept(gate.assess(
            "q1",
            &staged(&[
                ("order_id", text("1001")),
                ("product", text("Widget")),
                ("unit_price", text("9.99")),
                ("quantity", text("3")),
            ]),
        ));

        assert_eq!(record.customer_name, UNKNOWN_CUSTOMER);
        assert_eq!(record.quantity, 3);
        assert_eq!(record.order_date, OrderDate::Missing);
        assert_eq!(defaulted, vec![DefaultedField::CustomerName, DefaultedField::OrderDate]);
    }

    #[test]
    fn test_literal_unknown_customer_is_not_a_default() {
        let gate = DefaultQualityGate::new();
        let mut rec = valid();
        rec[1].1 = text("unknown customer");

        let (record, defaulted) = accept(gate.assess("q1", &staged(&rec)));

        assert_eq!(record.customer_name, UNKNOWN_CUSTOMER);
        assert!(!defaulted.contains(&DefaultedField::CustomerName));
    }

    #[test]
    fn test_required_fields_checked_in_order() {
        let gate = DefaultQualityGate::new();

        let mut rec = valid();
        rec[0].1 = RawValue::Empty;
        rec[2].1 = RawValue::Empty;
        assert_eq!(reject(gate.assess("q1", &staged(&rec))), RejectionReason::MissingOrderId);

        let mut rec = valid();
        rec[2].1 = text("");
        assert_eq!(reject(gate.assess("q1", &staged(&rec))), RejectionReason::MissingProduct);

        let mut rec = valid();
        rec.remove(4);
        assert_eq!(reject(gate.assess("q1", &staged(&rec))), RejectionReason::MissingUnitPrice);
    }

    #[test]
    fn test_zero_order_id_counts_as_missing() {
        let gate = DefaultQualityGate::new();
        let mut rec = valid();
        rec[0].1 = RawValue::Int(0);
        assert_eq!(reject(gate.assess("q1", &staged(&rec))), RejectionReason::MissingOrderId);

        rec[0].1 = text("0");
        assert_eq!(reject(gate.assess("q1", &staged(&rec))), RejectionReason::MissingOrderId);
    }

    #[test]
    fn test_negative_price_rejected() {
        let gate = DefaultQualityGate::new();
        let mut rec = valid();
        rec[4].1 = text("-5");
        assert_eq!(
            reject(gate.assess("q1", &staged(&rec))),
            RejectionReason::NonPositiveUnitPrice { value: -5.0 }
        );
    }

    #[test]
    fn test_numeric_zero_price_is_missing() {
        let gate = DefaultQualityGate::new();
        let mut rec = valid();
        rec[4].1 = RawValue::Float(0.0);
        assert_eq!(reject(gate.assess("q1", &staged(&rec))), RejectionReason::MissingUnitPrice);

        rec[4].1 = text("0");
        assert_eq!(reject(gate.assess("q1", &staged(&rec))), RejectionReason::MissingUnitPrice);
    }

    #[test]
    fn test_unparseable_price_rejected() {
        let gate = DefaultQualityGate::new();
        for bad in ["abc", "$9.99", "NaN", "inf"] {
            let mut rec = valid();
            rec[4].1 = text(bad);
            assert_eq!(
                reject(gate.assess("q1", &staged(&rec))),
                RejectionReason::UnparseableUnitPrice { raw: bad.to_string() },
                "{}",
                bad
            );
        }
    }

    #[test]
    fn test_bad_quantity_defaults_to_zero() {
        let gate = DefaultQualityGate::new();
        for bad in [text("abc"), text("-4"), RawValue::Empty, RawValue::Float(f64::NAN)] {
            let mut rec = valid();
            rec[3].1 = bad.clone();
            let (record, defaulted) = accept(gate.assess("q1", &staged(&rec)));
            assert_eq!(record.quantity, 0, "{:?}", bad);
            assert!(defaulted.contains(&DefaultedField::Quantity));
        }
    }

    #[test]
    fn test_quantity_coercions() {
        assert_eq!(parse_quantity(&text(" 7 ")), Some(7));
        assert_eq!(parse_quantity(&text("3.0")), Some(3));
        assert_eq!(parse_quantity(&text("+2")), Some(2));
        assert_eq!(parse_quantity(&RawValue::Float(4.9)), Some(4));
        assert_eq!(parse_quantity(&text("2.5")), Some(2));
        assert_eq!(parse_quantity(&text("4.9")), parse_quantity(&RawValue::Float(4.9)));
        assert_eq!(parse_quantity(&RawValue::Int(12)), Some(12));
        assert_eq!(parse_quantity(&RawValue::Int(-1)), None);
        assert_eq!(parse_quantity(&text("0")), Some(0));
    }

    #[test]
    fn test_unparseable_date_becomes_missing() {
        let gate = DefaultQualityGate::new();
        for bad in [text("someday"), RawValue::Int(20240305), RawValue::Empty] {
            let mut rec = valid();
            rec[5].1 = bad;
            let (record, defaulted) = accept(gate.assess("q1", &staged(&rec)));
            assert_eq!(record.order_date, OrderDate::Missing);
            assert!(defaulted.contains(&DefaultedField::OrderDate));
        }
    }

    #[test]
    fn test_customer_name_cleaning() {
        assert_eq!(clean_customer_name(Some(&text("mary o'neil"))), "Mary O'Neil");
        assert_eq!(clean_customer_name(Some(&text("   "))), UNKNOWN_CUSTOMER);
        assert_eq!(clean_customer_name(Some(&RawValue::Empty)), UNKNOWN_CUSTOMER);
        assert_eq!(clean_customer_name(None), UNKNOWN_CUSTOMER);
        assert_eq!(clean_customer_name(Some(&RawValue::Int(42))), "42");
        assert_eq!(title_case("ACME corp-west"), "Acme Corp-West");
    }

    #[test]
    fn test_extra_fields_pass_through() {
        let gate = DefaultQualityGate::new();
        let mut rec = valid();
        rec.push(("Region", text("West")));
        rec.push(("Notes", RawValue::Empty));
        let (record, _) = accept(gate.assess("q1", &staged(&rec)));

        let keys: Vec<&str> = record.extra.keys().collect();
        assert_eq!(keys, vec!["Region", "Notes"]);
        assert_eq!(record.extra.get("Region"), Some(&text("West")));
    }

    #[test]
    fn test_numeric_identifiers_are_kept() {
        let gate = DefaultQualityGate::new();
        let mut rec = valid();
        rec[0].1 = RawValue::Int(2001);
        rec[2].1 = RawValue::Int(55);
        rec[4].1 = RawValue::Float(12.5);
        let (record, _) = accept(gate.assess("q2", &staged(&rec)));
        assert_eq!(record.order_id, RawValue::Int(2001));
        assert_eq!(record.product, "55");
        assert!((record.unit_price - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_rejection_reason_codes() {
        assert_eq!(RejectionReason::MissingOrderId.code(), "missing_order_id");
        let json = serde_json::to_string(&RejectionReason::NonPositiveUnitPrice { value: -5.0 }).unwrap();
        assert_eq!(json, r#"{"reason":"non_positive_unit_price","value":-5.0}"#);
    }
}
