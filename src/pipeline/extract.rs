// src/pipeline/extract.rs

//! Tabular export extraction stage.

use std::path::Path;

use crate::error::Result;
use crate::models::{Config, RunStats};
use crate::pipeline::write_oracle_inputs;
use crate::services::{LinkExtractor, TabularReader};
use crate::storage::ArtifactStore;
use crate::utils::delimited::write_table;
use crate::utils::fs::read_required;

/// Key column of the candidates table.
pub(crate) const CANDIDATE_URL_COLUMN: &str = "url";

/// Extract candidate links from a metadata export.
///
/// Writes every (URL, record metadata) pair for correlation and the
/// deduplicated URL set for the oracle.
pub async fn run_extract(
    config: &Config,
    export: &Path,
    storage: &dyn ArtifactStore,
    stats: &mut RunStats,
) -> Result<()> {
    let text = read_required(export)?;
    log::info!("Reading export {}", export.display());

    let table = TabularReader::new(config.extract.delimiter).parse(&text);
    stats.records_read += table.records.len();
    stats.records_malformed += table.rejected.len();

    let extractor = LinkExtractor::new(&config.extract);
    let set = extractor.extract(&table.records);
    stats.records_without_link += set.records_without_link;
    stats.candidate_pairs += set.links.len();
    stats.unique_urls += set.unique_urls.len();

    let mut header = vec![CANDIDATE_URL_COLUMN.to_string()];
    header.extend(extractor.metadata_header());
    let rows = set.links.iter().map(|link| {
        let mut row = vec![link.url.clone()];
        row.extend(extractor.metadata(&link.record));
        row
    });
    let candidates = write_table(&header, rows, config.report.delimiter)?;
    storage
        .write_text(&config.paths.candidates_file, &candidates)
        .await?;

    write_oracle_inputs(storage, &config.paths, &set.unique_urls).await
}
