use anyhow::Result;
use chrono::Local;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use epgdata2xmltv::{
    config::Config,
    metadata::{EpisodeResolver, TvdbClient},
    services::{ConversionService, RunOptions},
};

#[derive(Parser)]
#[command(name = "epgdata2xmltv")]
#[command(version)]
#[command(about = "Converts epgdata.com schedule packages into an XMLTV guide")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Directory holding the staged epgdata files
    #[arg(short, long, value_name = "DIR")]
    input: Option<PathBuf>,

    /// Directory the XMLTV document is written to
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// TheTVDB API key
    #[arg(short, long, value_name = "KEY")]
    key: Option<String>,

    /// epgdata.com subscriber pin
    #[arg(short, long, value_name = "PIN")]
    pin: Option<String>,

    /// Fetch only this day offset instead of the configured range
    #[arg(short, long, value_name = "OFFSET")]
    day: Option<u32>,

    /// Enable debug output
    #[arg(short = 'v', long)]
    debug: bool,

    /// Convert already staged files without contacting epgdata.com
    #[arg(long)]
    skip_fetch: bool,

    /// Do not look up episode numbers
    #[arg(long)]
    no_enrich: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("epgdata2xmltv={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting EPGData2XMLTV v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load_from_file(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config);

    if let Some(input) = cli.input {
        config.storage.input_path = input;
    }
    if let Some(output) = cli.output {
        config.storage.output_path = output;
    }
    if let Some(key) = cli.key {
        config.tvdb.api_key = key;
        config.tvdb.enabled = true;
    }
    if let Some(pin) = cli.pin {
        config.epgdata.pin = pin;
    }
    if cli.skip_fetch {
        config.epgdata.fetch_enabled = false;
    }
    if cli.no_enrich {
        config.tvdb.enabled = false;
    }

    info!("Input directory: {}", config.storage.input_path.display());
    info!("Output file: {}", config.output_file_path().display());

    let resolver = if config.enrichment_enabled() {
        let client = TvdbClient::new(&config.tvdb)?;
        info!("Episode enrichment enabled ({})", config.tvdb.base_url);
        Some(EpisodeResolver::with_cache_capacity(
            Box::new(client),
            config.tvdb.cache_capacity,
        ))
    } else {
        if config.tvdb.enabled {
            warn!("Episode enrichment enabled but no TheTVDB API key configured");
        }
        None
    };

    let service = ConversionService::new(config, resolver)?;
    let options = RunOptions { day: cli.day };
    service.run(&options, Local::now().naive_local()).await?;

    info!("Conversion finished");
    Ok(())
}
