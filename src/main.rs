//! codedash - survey coding dashboard backend
//!
//! Serves aggregated statistics over coded survey responses to the
//! dashboard client, or writes them to an offline report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Invalid arguments, configuration or data errors

mod analysis;
mod cli;
mod config;
mod models;
mod report;
mod server;
mod store;

use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use server::AppState;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use store::{queries, SnapshotStore};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    if args.init_config {
        return handle_init_config();
    }

    let (mut config, source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(&args, &config)?;

    info!("codedash v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    source.log();

    if let Err(e) = run(args, config).await {
        error!("{:#}", e);
        eprintln!("\nError: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: write a default config file.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("{} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    std::fs::write(path, Config::default_toml())
        .with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("Created {} with default settings.", CONFIG_FILE);
    Ok(())
}

/// Initialize logging. `RUST_LOG` takes precedence over the flags and the file.
fn init_logging(args: &Args, config: &Config) -> Result<()> {
    let level = args.log_level(config.general.verbose);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

async fn run(args: Args, config: Config) -> Result<()> {
    config.validate()?;

    let store = SnapshotStore::new(&config.data.dir);
    info!("Reading data from {}", store.root().display());
    for missing in store.missing_tables() {
        warn!("Missing table file: {}", missing.display());
    }

    match args.report {
        Some(ref output) => write_report(&store, &config, args.format, output).await,
        None => {
            let state = AppState::new(Arc::new(store), config.aggregate_options());
            server::serve(state, &config.server).await
        }
    }
}

/// Compute every question once and write the report file.
async fn write_report(
    store: &SnapshotStore,
    config: &Config,
    format: OutputFormat,
    output: &Path,
) -> Result<()> {
    let start_time = Instant::now();

    let questions = queries::question_data(store, &config.aggregate_options())
        .await
        .context("Failed to compute question data")?;

    let duration = start_time.elapsed().as_secs_f64();
    let report = report::build_report(
        &store.root().display().to_string(),
        questions,
        duration,
    );

    let content = match format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report, &config.report),
    };

    std::fs::write(output, &content)
        .with_context(|| format!("Failed to write report to {}", output.display()))?;

    println!(
        "Report saved to {} ({} questions, {} responses, {:.2}s)",
        output.display(),
        report.metadata.question_count,
        report.metadata.response_count,
        duration
    );

    Ok(())
}

/// Where the configuration came from. Logged once the subscriber is installed.
enum ConfigSource {
    Explicit(PathBuf),
    DefaultFile,
    BuiltIn,
    Fallback(anyhow::Error),
}

impl ConfigSource {
    fn log(&self) {
        match self {
            ConfigSource::Explicit(path) => info!("Loaded config from: {}", path.display()),
            ConfigSource::DefaultFile => info!("Loaded default config from {}", CONFIG_FILE),
            ConfigSource::BuiltIn => debug!("No config file found, using defaults"),
            ConfigSource::Fallback(e) => warn!("Failed to load config: {:#}", e),
        }
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigSource)> {
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigSource::Explicit(config_path.clone())));
    }

    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigSource::DefaultFile)),
        Ok(None) => Ok((Config::default(), ConfigSource::BuiltIn)),
        Err(e) => Ok((Config::default(), ConfigSource::Fallback(e))),
    }
}
