use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use sales_etl::app::export_use_case::ExportUseCase;
use sales_etl::app::ports::{CleanedDatasetOutputPort, RejectionOutputPort, ReportOutputPort};
use sales_etl::infra::{CsvDatasetOutputAdapter, FileRejectionOutputAdapter, JsonReportOutputAdapter};
use sales_etl::observability;
use sales_etl::pipeline::processing::analytics::SalesAnalytics;
use sales_etl::{logging, Config, Pipeline, PipelineRun};

#[derive(Parser)]
#[command(name = "sales_etl")]
#[command(about = "Clean, combine and summarize sales exports")]
#[command(version = "0.1.0")]
struct Cli {
    /// Config file (defaults to sales_etl.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write JSON logs to a daily-rotated file in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Write Prometheus metrics for the run to this file
    #[arg(long, global = true)]
    metrics_out: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load, validate and write the cleaned dataset
    Clean {
        /// Cleaned CSV path (overrides output.cleaned_csv)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Write rejected records as NDJSON to this path
        #[arg(long)]
        rejections: Option<PathBuf>,
    },
    /// Print product and customer analytics
    Report {
        /// Also write the report as JSON to this path
        #[arg(long)]
        json: Option<PathBuf>,
        /// Number of customers to rank (overrides report.top_customers)
        #[arg(long)]
        top: Option<usize>,
    },
    /// Clean and report in one pass, using the configured outputs
    Run,
    /// Show the header alias table
    Aliases,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init_logging(cli.log_dir.as_deref());

    if cli.metrics_out.is_some() {
        if let Err(e) = observability::init() {
            warn!("{}", e);
        }
    }

    let result = execute(&cli);

    if let Some(path) = &cli.metrics_out {
        write_metrics(path)?;
    }

    if let Err(e) = &result {
        error!("{:#}", e);
        println!("❌ {:#}", e);
    }
    result
}

fn execute(cli: &Cli) -> anyhow::Result<()> {
    let config = Config::load_or_default(cli.config.as_deref()).context("loading configuration")?;
    let pipeline = Pipeline::new(config).context("building pipeline")?;

    match &cli.command {
        Commands::Clean { output, rejections } => {
            println!("🧹 Cleaning sales records...");
            let cleaned_csv = output
                .clone()
                .unwrap_or_else(|| pipeline.config().output.cleaned_csv.clone());
            let rejections = rejections.clone().or_else(|| pipeline.config().output.rejections.clone());

            let run = pipeline.run(rejection_output(rejections.as_deref())?)?;
            let mut export = ExportUseCase::new(Some(dataset_output(&pipeline, &cleaned_csv)), None);
            export.export(&run, pipeline.config().report.top_customers)?;

            print_summary(&run, pipeline.config().report.preview_records);
            println!("\n💾 Cleaned data written to {}", cleaned_csv.display());
            if let Some(path) = rejections {
                println!("   Rejections written to {}", path.display());
            }
        }
        Commands::Report { json, top } => {
            println!("📊 Building sales report...");
            let top = top.unwrap_or(pipeline.config().report.top_customers).max(1);
            let report_json = json.clone().or_else(|| pipeline.config().output.report_json.clone());

            let run = pipeline.run(None)?;
            let mut export = ExportUseCase::new(None, report_output(report_json.as_deref()));
            let report = export.export(&run, top)?;

            let analytics = match report {
                Some(report) => report.analytics,
                None => run.analytics(top),
            };
            print_analytics(&analytics);
            if let Some(path) = report_json {
                println!("\n💾 Report written to {}", path.display());
            }
        }
        Commands::Run => {
            println!("🚀 Running full pipeline (clean + report)...");
            let output = &pipeline.config().output;
            let top = pipeline.config().report.top_customers;

            let run = pipeline.run(rejection_output(output.rejections.as_deref())?)?;
            let mut export = ExportUseCase::new(
                Some(dataset_output(&pipeline, &output.cleaned_csv)),
                report_output(output.report_json.as_deref()),
            );
            let report = export.export(&run, top)?;

            print_summary(&run, pipeline.config().report.preview_records);
            let analytics = match report {
                Some(report) => report.analytics,
                None => run.analytics(top),
            };
            print_analytics(&analytics);
            println!("\n✅ Pipeline completed (run {})", run.run_id);
        }
        Commands::Aliases => {
            println!("🔤 Header aliases:");
            for (key, variants) in pipeline.alias_table().variants() {
                println!("   {:<14} ← {}", key.as_str(), variants.join(", "));
            }
        }
    }

    Ok(())
}

fn dataset_output(pipeline: &Pipeline, path: &Path) -> Box<dyn CleanedDatasetOutputPort> {
    Box::new(CsvDatasetOutputAdapter::new(
        path,
        pipeline.config().output.include_extra_fields,
    ))
}

fn rejection_output(path: Option<&Path>) -> anyhow::Result<Option<Box<dyn RejectionOutputPort>>> {
    match path {
        Some(path) => {
            let adapter = FileRejectionOutputAdapter::new(path)
                .with_context(|| format!("opening rejection log {}", path.display()))?;
            Ok(Some(Box::new(adapter)))
        }
        None => Ok(None),
    }
}

fn report_output(path: Option<&Path>) -> Option<Box<dyn ReportOutputPort>> {
    path.map(|p| Box::new(JsonReportOutputAdapter::new(p)) as Box<dyn ReportOutputPort>)
}

fn write_metrics(path: &Path) -> anyhow::Result<()> {
    match observability::render() {
        Some(text) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir)?;
            }
            fs::write(path, text).with_context(|| format!("writing metrics to {}", path.display()))?;
            info!("Metrics written to {}", path.display());
        }
        None => warn!("No metrics recorder installed; nothing written"),
    }
    Ok(())
}

fn print_summary(run: &PipelineRun, preview: usize) {
    let stats = &run.stats;
    println!("\n📊 Pipeline Results:");
    println!("   Raw records: {}", stats.raw_records);
    println!("   Cleaned records: {}", stats.cleaned_records);
    println!("   Removed records: {}", stats.removed_records);

    for source in &stats.sources {
        println!(
            "   - {}: {} raw, {} kept, {} removed",
            source.source, source.raw_records, source.accepted, source.rejected
        );
    }

    if !stats.quality.rejected_by_reason.is_empty() {
        println!("\n⚠️  Rejections:");
        for (reason, count) in &stats.quality.rejected_by_reason {
            println!("   - {}: {}", reason, count);
        }
    }
    println!(
        "   Defaults applied: {} customer, {} quantity, {} missing dates",
        stats.quality.customer_defaulted, stats.quality.quantity_defaulted, stats.quality.date_missing
    );

    let sample = run.preview(preview);
    if !sample.is_empty() {
        println!("\n🔎 First {} cleaned records:", sample.len());
        for record in sample {
            println!(
                "   {} | {} | {} | qty {} @ {:.2} | {}",
                record.order_id,
                record.customer_name,
                record.product,
                record.quantity,
                record.unit_price,
                if record.order_date.is_known() {
                    record.order_date.to_string()
                } else {
                    "no date".to_string()
                }
            );
        }
    }
}

fn print_analytics(analytics: &SalesAnalytics) {
    let catalog = &analytics.catalog;
    println!("\n🛒 Products");
    println!("   All products ({}): {}", catalog.all_products.len(), join(&catalog.all_products));
    println!(
        "   In every source ({}): {}",
        catalog.common_products.len(),
        join(&catalog.common_products)
    );
    println!(
        "   Unique to one source ({}): {}",
        catalog.unique_products.len(),
        join(&catalog.unique_products)
    );
    for source in &catalog.sources {
        println!("   - only in {}: {}", source.source, join(&source.exclusive));
    }

    println!("\n💰 Revenue by product:");
    for stat in &analytics.product_ranking {
        println!("   {:<24} {:>8} units  {:>12.2}", stat.product, stat.total_quantity, stat.revenue);
    }

    println!("\n🏆 Top customers:");
    for (rank, customer) in analytics.top_customers.iter().enumerate() {
        println!(
            "   {}. {:<24} {:>4} orders  {:>12.2}",
            rank + 1,
            customer.customer,
            customer.orders,
            customer.total_spent
        );
    }

    println!(
        "\n   {} customers, {} records, {} units, {:.2} total revenue",
        analytics.customers.len(),
        analytics.totals.records,
        analytics.totals.total_units,
        analytics.totals.total_revenue
    );
}

fn join<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    let joined: Vec<&str> = items.into_iter().map(String::as_str).collect();
    if joined.is_empty() {
        "-".to_string()
    } else {
        joined.join(", ")
    }
}
