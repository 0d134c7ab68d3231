use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use tds_core::FINANCIAL_YEAR;
use tds_core::db::{DbConfig, RepositoryRegistry};
use tds_db_sqlite::SqliteRepositoryFactory;
use tds_server::{AppState, serve};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// TDS calculator backend.
///
/// Opens the configured rate chart database and serves the section list,
/// calculations and Excel reports over HTTP.
#[derive(Debug, Parser)]
struct Cli {
    /// Database backend to use.
    #[arg(long, default_value = "sqlite")]
    backend: String,

    /// Database connection string.
    /// For SQLite this is a file path (e.g. `tds.db`) or `:memory:`.
    #[arg(long, default_value = "tds.db")]
    db: String,

    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:8000")]
    bind: SocketAddr,
}

// ─── tracing ─────────────────────────────────────────────────────────────────

/// Initialise the tracing subscriber.
///
/// * Honours `RUST_LOG` when set.
/// * Falls back to `info` plus request traces from `tower_http`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::from("info,tower_http=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let db_config = DbConfig {
        backend: cli.backend,
        connection_string: cli.db,
    };

    debug!("connecting to {} backend", db_config.backend);
    let repo = build_registry()
        .create_shared(&db_config)
        .await
        .with_context(|| format!("Failed to open {} database", db_config.backend))?;

    let sections = repo.list_sections().await?.len();
    info!("loaded {} TDS sections for FY {}", sections, FINANCIAL_YEAR);

    let listener = TcpListener::bind(cli.bind)
        .await
        .with_context(|| format!("Failed to bind {}", cli.bind))?;

    info!("listening on {}", cli.bind);
    serve(listener, AppState::new(repo)).await?;

    Ok(())
}
