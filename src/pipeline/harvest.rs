// src/pipeline/harvest.rs

//! Listing harvest stage.

use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::{Config, RunStats};
use crate::services::PaginatedHarvester;
use crate::storage::ArtifactStore;
use crate::utils::http::Throttle;

/// Harvest seed URIs from the remote listing and store them one per line.
pub async fn run_harvest(
    config: &Config,
    client: &Client,
    storage: &dyn ArtifactStore,
    stats: &mut RunStats,
) -> Result<()> {
    if config.harvest.base_url.trim().is_empty() {
        return Err(AppError::config("harvest.base_url is not set"));
    }
    log::info!("Harvesting listing from {}", config.harvest.base_url);

    let mut harvester = PaginatedHarvester::new(client, &config.harvest, Throttle::new(&config.http));
    let outcome = harvester.harvest().await?;

    stats.pages_fetched += outcome.pages_fetched;
    stats.pages_failed += outcome.pages_failed;
    stats.seeds_harvested += outcome.seeds.len();

    let mut text = String::new();
    for seed in &outcome.seeds {
        text.push_str(seed.as_str());
        text.push('\n');
    }
    storage.write_text(&config.paths.seeds_file, &text).await?;

    log::info!(
        "Saved {} seeds to {}",
        outcome.seeds.len(),
        storage.locate(&config.paths.seeds_file)
    );
    Ok(())
}
