use std::fs::File;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tds_core::calculations::summarize;
use tds_core::db::{DbConfig, RepositoryRegistry};
use tds_core::format::indian_currency;
use tds_data::BulkLoader;
use tds_db_sqlite::SqliteRepositoryFactory;
use tracing_subscriber::EnvFilter;

/// Calculate TDS for every row of a bulk deductee CSV.
///
/// The input must have the columns `Deductee Name`, `Deductee PAN`,
/// `TDS Section`, `Transaction Amount` and `Date of Deduction`. Results are
/// written as CSV and a summary is printed to stderr.
#[derive(Parser, Debug)]
#[command(name = "tds-bulk")]
#[command(version, about, long_about = None)]
struct Args {
    /// Bulk input CSV. Required unless --template is given.
    #[arg(short, long, required_unless_present = "template")]
    input: Option<PathBuf>,

    /// Results CSV (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// SQLite database holding the rate chart
    #[arg(short, long, default_value = "sqlite:tds.db?mode=rwc")]
    database: String,

    /// Write a sample input file to this path and exit
    #[arg(long)]
    template: Option<PathBuf>,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    if let Some(path) = &args.template {
        let file = File::create(path)
            .with_context(|| format!("Failed to create: {}", path.display()))?;
        BulkLoader::write_template(file).context("Failed to write template")?;
        eprintln!("Template written to: {}", path.display());
        return Ok(());
    }

    let Some(input) = &args.input else {
        anyhow::bail!("--input is required");
    };

    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));

    let repo = registry
        .create(&DbConfig {
            backend: "sqlite".to_string(),
            connection_string: args.database.clone(),
        })
        .await
        .with_context(|| format!("Failed to open rate chart: {}", args.database))?;

    let catalog = repo
        .catalog()
        .await
        .context("Failed to read TDS sections")?;

    let file =
        File::open(input).with_context(|| format!("Failed to open: {}", input.display()))?;
    let records = BulkLoader::parse(file)
        .with_context(|| format!("Failed to parse CSV: {}", input.display()))?;

    eprintln!("Processing {} rows from: {}", records.len(), input.display());

    let outcomes = BulkLoader::process(&catalog, &records, Local::now().date_naive());

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create: {}", path.display()))?;
            BulkLoader::write_results(file, &outcomes).context("Failed to write results")?;
            eprintln!("Results written to: {}", path.display());
        }
        None => {
            BulkLoader::write_results(io::stdout().lock(), &outcomes)
                .context("Failed to write results")?;
        }
    }

    let summary = summarize(&outcomes);
    eprintln!("Total Transactions: {}", summary.total);
    eprintln!("Taxable:            {}", summary.taxable);
    eprintln!("Under Threshold:    {}", summary.under_threshold);
    match summary.total_tds {
        Some(total) => eprintln!("Total TDS:          {}", indian_currency(total)),
        None => eprintln!("Total TDS:          out of range"),
    }

    Ok(())
}
