//! linkaudit CLI
//!
//! Runs one pipeline stage per invocation; stages hand over through the
//! artifacts in the storage directory.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use linkaudit::{
    error::Result,
    models::{Config, RunStats},
    pipeline::{self, Source},
    storage::LocalStorage,
    utils::http,
};

/// linkaudit - broken link audit for federated content platforms
#[derive(Parser, Debug)]
#[command(
    name = "linkaudit",
    version,
    about = "Harvest, resolve and correlate broken links"
)]
struct Cli {
    /// Path to the configuration file (default: {storage_dir}/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding intermediate artifacts (overrides paths.storage_dir)
    #[arg(short, long)]
    storage_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Harvest seed URIs from the paginated listing
    Harvest,

    /// Resolve harvested seeds to canonical URLs
    Resolve,

    /// Extract candidate links from a tabular metadata export
    Extract {
        /// Path to the export file
        #[arg(long)]
        export: PathBuf,
    },

    /// Repair a raw oracle report into a normalized table
    Normalize {
        /// Path to the raw oracle report
        #[arg(long)]
        oracle: PathBuf,
    },

    /// Correlate normalized findings with content records
    Correlate {
        /// Artifact to join findings against
        #[arg(long, value_enum, default_value_t = Source::Candidates)]
        source: Source,
    },

    /// Run normalize → correlate in one go
    Report {
        /// Path to the raw oracle report
        #[arg(long)]
        oracle: PathBuf,

        /// Artifact to join findings against
        #[arg(long, value_enum, default_value_t = Source::Candidates)]
        source: Source,
    },

    /// Validate configuration files
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Load the explicitly given config strictly, otherwise fall back to defaults.
fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => Config::load(path),
        None => {
            let dir = cli
                .storage_dir
                .clone()
                .unwrap_or_else(|| Config::default().paths.storage_dir);
            Ok(Config::load_or_default(dir.join("config.toml")))
        }
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("linkaudit starting...");

    let mut config = load_config(&cli)?;
    if let Some(dir) = &cli.storage_dir {
        config.paths.storage_dir = dir.clone();
    }
    log::info!(
        "Using storage directory {}",
        config.paths.storage_dir.display()
    );

    let storage = LocalStorage::new(&config.paths.storage_dir);
    let mut stats = RunStats::started();

    let title = match cli.command {
        Command::Harvest => {
            config.validate()?;
            let client = http::create_client(&config.http)?;
            pipeline::run_harvest(&config, &client, &storage, &mut stats).await?;
            "Harvest"
        }

        Command::Resolve => {
            config.validate()?;
            let client = http::create_client(&config.http)?;
            pipeline::run_resolve(&config, &client, &storage, &mut stats).await?;
            "Resolve"
        }

        Command::Extract { export } => {
            config.validate()?;
            pipeline::run_extract(&config, &export, &storage, &mut stats).await?;
            "Extract"
        }

        Command::Normalize { oracle } => {
            config.validate()?;
            pipeline::run_normalize(&config, &oracle, &storage, &mut stats).await?;
            "Normalize"
        }

        Command::Correlate { source } => {
            config.validate()?;
            pipeline::run_correlate(&config, source, &storage, &mut stats).await?;
            "Correlate"
        }

        Command::Report { oracle, source } => {
            config.validate()?;
            pipeline::run_report(&config, &oracle, source, &storage, &mut stats).await?;
            "Report"
        }

        Command::Validate => {
            pipeline::run_validate(&config)?;
            return Ok(());
        }
    };

    pipeline::finish_run(&storage, &config.paths, &mut stats, title).await?;
    log::info!("Done!");

    Ok(())
}
