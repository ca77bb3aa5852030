use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

use sales_etl::app::export_use_case::ExportUseCase;
use sales_etl::infra::{CsvDatasetOutputAdapter, FileRejectionOutputAdapter, JsonReportOutputAdapter};
use sales_etl::pipeline::ingestion::{SourceLoader, SpreadsheetSource};
use sales_etl::types::{OrderDate, RawValue};
use sales_etl::{Config, Pipeline, SalesError};

const Q1_CSV: &str = "\
Order ID,CustomerName,Product,Price,qty,Date
1001,  jane doe ,Widget,9.99,3,2024-01-15
1002,bob smith,Gadget,-5,2,2024-01-16
1003,,Widget,19.99,abc,not a date
,ghost,Cable,5,1,2024-01-17
";

const Q2_JSON: &str = r#"[
  {"Order_ID": 2001, "Customer_Name": "ANN LEE", "PRODUCT": "Lamp", "Unit Price": 24.5,
   "Quantity": 2, "Purchase Date": "03/05/2024", "Region": "West"},
  {"Order_ID": 2002, "Customer_Name": null, "PRODUCT": "Widget", "Unit Price": "abc",
   "Quantity": 1, "Purchase Date": null},
  {"Order_ID": 2003, "PRODUCT": 55, "Unit Price": 3, "Quantity": 1}
]"#;

/// Q3 worksheet: whole-number ids, a numeric product code and an Excel date cell
fn q3_fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sales_q3.xlsx")
}

fn write_sources(dir: &Path) -> Result<Config> {
    let q1 = dir.join("sales_q1.csv");
    let q2 = dir.join("sales_q2.json");
    fs::write(&q1, Q1_CSV)?;
    fs::write(&q2, Q2_JSON)?;
    let q3 = dir.join("sales_q3.xlsx");
    fs::copy(q3_fixture(), &q3)?;

    let toml = format!(
        r#"
[[sources]]
name = "q1"
path = '{}'

[[sources]]
name = "q2"
path = '{}'

[[sources]]
name = "q3"
path = '{}'
sheet = 'Q3 Sales'

[output]
cleaned_csv = '{}'
report_json = '{}'
rejections = '{}'
include_extra_fields = true
"#,
        q1.display(),
        q2.display(),
        q3.display(),
        dir.join("out/cleaned_sales.csv").display(),
        dir.join("out/report.json").display(),
        dir.join("out/rejections.ndjson").display(),
    );
    let config_path = dir.join("sales_etl.toml");
    fs::write(&config_path, toml)?;

    Ok(Config::load(&config_path)?)
}

#[test]
fn test_cleans_and_combines_csv_json_and_spreadsheet_sources() -> Result<()> {
    let temp_dir = tempdir()?;
    let config = write_sources(temp_dir.path())?;
    let pipeline = Pipeline::new(config)?;

    let run = pipeline.run(None)?;

    assert_eq!(run.stats.raw_records, 9);
    assert_eq!(run.stats.cleaned_records, 6);
    assert_eq!(run.stats.removed_records, 3);

    let ids: Vec<String> = run.dataset.iter().map(|r| r.order_id.to_string()).collect();
    assert_eq!(ids, vec!["1001", "1003", "2001", "2003", "3001", "3002"]);

    let jane = &run.dataset[0];
    assert_eq!(jane.customer_name, "Jane Doe");
    assert_eq!(jane.quantity, 3);
    assert_eq!(jane.order_date.to_string(), "2024-01-15");

    let unknown = &run.dataset[1];
    assert_eq!(unknown.customer_name, "Unknown Customer");
    assert_eq!(unknown.quantity, 0);
    assert_eq!(unknown.order_date, OrderDate::Missing);

    let ann = &run.dataset[2];
    assert_eq!(ann.customer_name, "Ann Lee");
    assert_eq!(ann.order_date.to_string(), "2024-03-05");
    assert_eq!(ann.extra.get("Region").map(|v| v.to_string()), Some("West".to_string()));

    let carl = &run.dataset[4];
    assert_eq!(carl.order_id, RawValue::Int(3001));
    assert_eq!(carl.customer_name, "Carl Diaz");
    assert_eq!(carl.product, "55");
    assert_eq!(carl.quantity, 2);
    assert_eq!(carl.order_date.to_string(), "2024-03-05");
    assert_eq!(carl.source, "q3");

    let blank = &run.dataset[5];
    assert_eq!(blank.customer_name, "Unknown Customer");
    assert_eq!(blank.product, "Widget");
    assert_eq!(blank.order_date, OrderDate::Missing);

    let reasons: Vec<&str> = run.rejected.iter().map(|r| r.reason.code()).collect();
    assert_eq!(
        reasons,
        vec!["non_positive_unit_price", "missing_order_id", "unparseable_unit_price"]
    );
    Ok(())
}

#[test]
fn test_analytics_over_combined_run() -> Result<()> {
    let temp_dir = tempdir()?;
    let pipeline = Pipeline::new(write_sources(temp_dir.path())?)?;
    let analytics = pipeline.run(None)?.analytics(5);

    let common: Vec<&str> = analytics.catalog.common_products.iter().map(String::as_str).collect();
    assert_eq!(common, vec!["Widget"]);
    let unique: Vec<&str> = analytics.catalog.unique_products.iter().map(String::as_str).collect();
    assert_eq!(unique, vec!["Cable", "Gadget", "Lamp"]);
    let all: Vec<&str> = analytics.catalog.all_products.iter().map(String::as_str).collect();
    assert_eq!(all, vec!["55", "Cable", "Gadget", "Lamp", "Widget"]);

    let ranking: Vec<&str> = analytics.product_ranking.iter().map(|p| p.product.as_str()).collect();
    assert_eq!(ranking, vec!["Lamp", "Widget", "55", "Cable", "Gadget"]);
    assert!((analytics.product_ranking[1].revenue - 39.97).abs() < 1e-9);
    assert!((analytics.product_ranking[2].revenue - 28.0).abs() < 1e-9);

    let top: Vec<&str> = analytics.top_customers.iter().map(|c| c.customer.as_str()).collect();
    assert_eq!(top, vec!["Ann Lee", "Jane Doe", "Carl Diaz", "Unknown Customer"]);
    assert!((analytics.top_customers[3].total_spent - 13.0).abs() < 1e-9);
    assert_eq!(analytics.totals.total_units, 9);
    Ok(())
}

#[test]
fn test_exports_write_all_configured_files() -> Result<()> {
    let temp_dir = tempdir()?;
    let pipeline = Pipeline::new(write_sources(temp_dir.path())?)?;
    let output = pipeline.config().output.clone();

    let rejections = output.rejections.as_deref().expect("rejections configured");
    let run = pipeline.run(Some(Box::new(FileRejectionOutputAdapter::new(rejections)?)))?;

    let report_path = output.report_json.as_deref().expect("report configured");
    let mut export = ExportUseCase::new(
        Some(Box::new(CsvDatasetOutputAdapter::new(&output.cleaned_csv, true))),
        Some(Box::new(JsonReportOutputAdapter::new(report_path))),
    );
    export.export(&run, pipeline.config().report.top_customers)?;

    let cleaned = fs::read_to_string(&output.cleaned_csv)?;
    let lines: Vec<&str> = cleaned.lines().collect();
    assert_eq!(
        lines[0],
        "order_id,customer_name,product,quantity,unit_price,order_date,Region"
    );
    assert_eq!(lines[1], "1001,Jane Doe,Widget,3,9.99,2024-01-15,");
    assert_eq!(lines[2], "1003,Unknown Customer,Widget,0,19.99,,");
    assert_eq!(lines[3], "2001,Ann Lee,Lamp,2,24.5,2024-03-05,West");
    assert_eq!(lines[4], "2003,Unknown Customer,55,1,3.0,,");
    assert_eq!(lines[5], "3001,Carl Diaz,55,2,12.5,2024-03-05,");
    assert_eq!(lines[6], "3002,Unknown Customer,Widget,1,10.0,,");

    let rejected = fs::read_to_string(rejections)?;
    assert_eq!(rejected.lines().count(), 3);

    let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(report_path)?)?;
    assert_eq!(report["stats"]["cleaned_records"], 6);
    assert_eq!(report["stats"]["quality"]["rejected_by_reason"]["missing_order_id"], 1);
    assert_eq!(report["analytics"]["top_customers"][0]["customer"], "Ann Lee");
    Ok(())
}

#[test]
fn test_spreadsheet_source_reads_first_or_named_sheet() -> Result<()> {
    let first = SpreadsheetSource::new(None).load(&q3_fixture())?;
    let named = SpreadsheetSource::new(Some("Q3 Sales".to_string())).load(&q3_fixture())?;

    assert_eq!(first, named);
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].get("Order ID"), Some(&RawValue::Int(3001)));
    assert_eq!(first[0].get("price"), Some(&RawValue::Float(12.5)));
    assert_eq!(first[0].get("Date"), Some(&RawValue::text("2024-03-05 00:00:00")));
    assert_eq!(first[1].get("customer name"), Some(&RawValue::Empty));
    assert_eq!(first[1].get("price"), Some(&RawValue::Int(10)));

    let missing = SpreadsheetSource::new(Some("Q4 Sales".to_string())).load(&q3_fixture());
    assert!(matches!(missing, Err(SalesError::Spreadsheet(_))));
    Ok(())
}

#[test]
fn test_missing_source_file_is_fatal() -> Result<()> {
    let config = Config::from_toml_str(
        r#"
        [[sources]]
        name = "q1"
        path = "definitely/not/here.csv"
        "#,
    )?;
    let pipeline = Pipeline::new(config)?;
    assert!(pipeline.run(None).is_err());
    Ok(())
}

#[test]
fn test_unknown_extension_needs_explicit_format() -> Result<()> {
    let temp_dir = tempdir()?;
    let path = temp_dir.path().join("export.dat");
    fs::write(&path, "Order ID,Product,Price\n1,Widget,2\n")?;

    let toml = format!("[[sources]]\nname = \"q1\"\npath = '{}'\n", path.display());
    let pipeline = Pipeline::new(Config::from_toml_str(&toml)?)?;
    assert!(matches!(pipeline.run(None), Err(SalesError::UnsupportedFormat(_))));

    let pipeline = Pipeline::new(Config::from_toml_str(&format!("{}format = \"csv\"\n", toml))?)?;
    assert_eq!(pipeline.run(None)?.stats.cleaned_records, 1);
    Ok(())
}

#[test]
fn test_conflicting_configured_alias_fails_fast() -> Result<()> {
    let config = Config::from_toml_str(
        r#"
        [[sources]]
        name = "q1"
        path = "q1.csv"

        [aliases]
        quantity = ["Price"]
        "#,
    )?;
    assert!(matches!(Pipeline::new(config), Err(SalesError::AliasConflict { .. })));
    Ok(())
}
