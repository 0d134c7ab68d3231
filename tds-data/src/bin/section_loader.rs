use std::fs::File;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tds_data::SectionLoader;
use tds_db_sqlite::SqliteRepository;
use tracing_subscriber::EnvFilter;

/// Load the TDS rate chart from a CSV file into the database.
///
/// The CSV file should have the following columns:
/// - code, description: section code (e.g., 194C) and its description
/// - threshold, threshold_note: threshold amount (empty for none) and its label
/// - company_rate, individual_rate, no_pan_rate: percentages (e.g., 2 for 2%)
/// - company_rate_note, individual_rate_note: optional rate notes
/// - is_property_section, tds_on_excess: true/false flags
/// - threshold_types: `name=threshold=note` entries separated by `;`
/// - slabs, conditions: `label=rate` entries separated by `;`
#[derive(Parser, Debug)]
#[command(name = "tds-section-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the CSV file containing the rate chart
    #[arg(short, long)]
    file: PathBuf,

    /// SQLite database URL or path (created if missing)
    #[arg(short, long, default_value = "sqlite:tds.db?mode=rwc")]
    database: String,

    /// Run database migrations before loading data
    #[arg(short, long, default_value_t = false)]
    migrate: bool,

    /// Run seed files from the specified directory after migrations
    #[arg(short, long)]
    seeds: Option<PathBuf>,

    /// Delete sections that are not present in the CSV file
    #[arg(long, default_value_t = false)]
    prune: bool,
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

    let repo = SqliteRepository::new(&args.database)
        .await
        .with_context(|| format!("Failed to connect to database: {}", args.database))?;

    if args.migrate {
        println!("Running migrations...");
        repo.run_migrations()
            .await
            .context("Failed to run migrations")?;
        println!("Migrations complete.");
    }

    if let Some(seeds_dir) = &args.seeds {
        println!("Running seeds from: {}", seeds_dir.display());
        repo.run_seeds(seeds_dir)
            .await
            .with_context(|| format!("Failed to run seeds from: {}", seeds_dir.display()))?;
        println!("Seeds complete.");
    }

    println!("Loading TDS sections from: {}", args.file.display());

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open: {}", args.file.display()))?;

    let records = SectionLoader::parse(file)
        .with_context(|| format!("Failed to parse CSV: {}", args.file.display()))?;

    println!("Parsed {} records from CSV", records.len());

    let loaded = SectionLoader::load(&repo, &records)
        .await
        .context("Failed to load sections into database")?;

    println!("Successfully loaded {} sections into the database.", loaded);

    if args.prune {
        let removed = SectionLoader::prune(&repo, &records)
            .await
            .context("Failed to prune sections")?;
        println!("Removed {} sections not present in the CSV.", removed);
    }

    Ok(())
}
