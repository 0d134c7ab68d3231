use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use cursive::event::Event;
use tracing::{info, warn};

use tds_ui::api::ApiClient;
use tds_ui::app::AppState;
use tds_ui::config::{ConfigOverrides, UiConfig};
use tds_ui::{logging, views};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// TDS calculator for FY 2025-26 (non-salary payments).
///
/// Collects entity and transaction details, sends them to the TDS service
/// and shows the computed TDS, due dates and late-payment interest.
#[derive(Debug, Parser)]
struct Cli {
    /// Base URL of the TDS service.
    #[arg(long)]
    api_url: Option<String>,

    /// Directory Excel reports are written to.
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Log file. Defaults to `<program>.log` in the current directory.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// TOML configuration file. Command-line flags take precedence.
    #[arg(long)]
    config: Option<PathBuf>,
}

// ─── entry point ─────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    logging::init_default_logging();

    let cli = Cli::parse();

    let config = UiConfig::resolve(
        cli.config.as_deref(),
        ConfigOverrides {
            api_url: cli.api_url,
            export_dir: cli.export_dir,
            log_file: cli.log_file,
        },
    )?;

    let log_file = config
        .log_file
        .clone()
        .unwrap_or_else(logging::default_log_file);
    logging::route_to_file(&log_file, config.log_level.as_deref())
        .with_context(|| format!("Failed to set up logging to {}", log_file.display()))?;

    info!(api_url = %config.api_url, export_dir = %config.export_dir.display(), "starting");

    let api = ApiClient::new(&config.api_url, config.timeout())
        .context("Failed to create HTTP client")?;
    let mut state = AppState::new(api, config.export_dir.clone());
    if let Err(e) = state.refresh_sections() {
        // The wizard retries when a form needs the catalog.
        warn!(error = %e, "section catalog unavailable at startup");
        state.wizard.clear_banner();
    }

    let mut siv = cursive::default();
    siv.set_user_data(state);
    siv.add_global_callback(Event::CtrlChar('q'), |s| s.quit());

    views::show_main_menu(&mut siv);
    siv.run();

    logging::set_console_enabled(true)?;
    info!("session ended");
    Ok(())
}
