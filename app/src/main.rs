mod logging;

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use dbpanel_adapters::HttpPanelBackend;
use dbpanel_core::backend::PanelBackend;
use dbpanel_core::config::{ConfigError, PanelConfig};
use dbpanel_tui::TuiError;

/// Terminal admin panel for an HTTP SQL server.
#[derive(Debug, Parser)]
#[command(name = "dbpanel", version, about)]
struct Args {
    /// Base URL of the SQL server.
    #[arg(long, env = "DBPANEL_SERVER_URL")]
    server: Option<String>,

    /// Config file to read instead of the default location.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log filter such as `info` or `dbpanel_core=debug`.
    #[arg(long)]
    log_level: Option<String>,
}

fn load_config(args: &Args) -> Result<PanelConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => PanelConfig::load_from_path(path)?,
        None => PanelConfig::load_default()?,
    };

    if let Some(server) = &args.server {
        config.server_url.clone_from(server);
    }
    if let Some(log_level) = &args.log_level {
        config.log_level.clone_from(log_level);
    }

    config.validate()?;
    Ok(config)
}

fn run_app(
    config: &PanelConfig,
    run_tui: impl FnOnce(&PanelConfig, Arc<dyn PanelBackend>) -> Result<(), TuiError>,
) -> Result<(), Box<dyn Error>> {
    let backend = HttpPanelBackend::new(config.server_url.clone(), config.request_timeout())?;
    tracing::info!(server = backend.base_url(), "starting panel");
    run_tui(config, Arc::new(backend))?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let config = load_config(&args)?;
    let _log_guard = logging::init(&config.resolved_log_file()?, &config.log_level)?;
    run_app(&config, dbpanel_tui::run)
}
