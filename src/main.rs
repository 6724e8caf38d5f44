use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

use video_catalog::config::Config;
use video_catalog::{logging, start_http_server, AppState};

#[derive(Parser)]
#[command(name = "video-catalog")]
#[command(version, about = "Search, filter and browse the video catalog")]
struct Cli {
    /// Configuration file (defaults to video-catalog.toml lookup)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Port for the viewer server
    #[arg(short, long)]
    port: Option<u16>,

    /// Base URL of the catalog backend
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Target of the /api dev proxy
    #[arg(long, value_name = "URL")]
    proxy_target: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let (mut config, load_error) = match &cli.config {
        Some(path) => (Config::from_file(path)?, None),
        None => match Config::load() {
            Ok(config) => (config, None),
            Err(e) => (Config::default(), Some(e)),
        },
    };

    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(base_url) = cli.base_url {
        config.api.base_url = Some(base_url);
    }
    if let Some(target) = cli.proxy_target {
        config.server.proxy_target = target;
    }

    // Initialize logging
    logging::init(Some(config.logging.level.as_str()), cli.verbose);

    if let Some(e) = load_error {
        warn!("Failed to load config, using defaults: {:#}", e);
    }
    if cli.verbose {
        info!("Verbose logging enabled");
    }

    config.validate().context("Invalid configuration")?;
    info!("{}", config.summary());

    let app_state = AppState::from_config(config)?;
    start_http_server(app_state).await
}
