// src/pipeline/correlate.rs

//! Oracle report normalization and correlation stages.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Config, JoinKey, RunStats, ValidationFinding};
use crate::pipeline::extract::CANDIDATE_URL_COLUMN;
use crate::services::{CorrelationIndex, Correlator, GuideNames, OracleNormalizer, TabularReader};
use crate::storage::ArtifactStore;
use crate::utils::delimited::write_table;
use crate::utils::fs::read_required;

/// Which artifact findings are joined against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Extracted (URL, record) pairs from a tabular export
    #[default]
    Candidates,
    /// Resolved seeds from a harvested listing
    Resolved,
}

impl Source {
    fn artifact<'c>(&self, config: &'c Config) -> &'c str {
        match self {
            Source::Candidates => &config.paths.candidates_file,
            Source::Resolved => &config.paths.resolved_file,
        }
    }

    fn key_column(&self) -> &'static str {
        match self {
            Source::Candidates => CANDIDATE_URL_COLUMN,
            Source::Resolved => "canonical_url",
        }
    }

    /// Join key used when `report.join_on` is unset.
    ///
    /// Candidate URLs are checked by the oracle directly; resolved item pages
    /// are crawled, so their findings point back through the parent column.
    pub fn default_join(&self) -> JoinKey {
        match self {
            Source::Candidates => JoinKey::Url,
            Source::Resolved => JoinKey::Parent,
        }
    }

    fn join_key(&self, config: &Config) -> JoinKey {
        let natural = self.default_join();
        match config.report.join_on {
            Some(key) if key != natural => {
                log::warn!(
                    "Joining {} on {:?} instead of {:?}; most findings may go unreported",
                    self,
                    key,
                    natural
                );
                key
            }
            Some(key) => key,
            None => natural,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Candidates => f.write_str("candidates"),
            Source::Resolved => f.write_str("resolved"),
        }
    }
}

/// Repair a raw oracle report and store it as the normalized table.
pub async fn run_normalize(
    config: &Config,
    oracle_report: &Path,
    storage: &dyn ArtifactStore,
    stats: &mut RunStats,
) -> Result<()> {
    let raw = read_required(oracle_report)?;
    log::info!("Normalizing oracle report {}", oracle_report.display());

    let table = OracleNormalizer::new(&config.oracle, config.report.delimiter).normalize(&raw);
    stats.findings_read += table.rows.len();
    stats.findings_skipped += table.rejected.len();
    stats.duplicate_headers += table.duplicate_headers;

    let text = table.to_delimited(config.report.delimiter)?;
    storage
        .write_text(&config.paths.normalized_file, &text)
        .await?;

    log::info!(
        "Normalized {} findings ({} rows skipped) into {}",
        table.rows.len(),
        table.rejected.len(),
        storage.locate(&config.paths.normalized_file)
    );
    Ok(())
}

/// Join normalized findings back to the content that referenced them.
pub async fn run_correlate(
    config: &Config,
    source: Source,
    storage: &dyn ArtifactStore,
    stats: &mut RunStats,
) -> Result<()> {
    let reader = TabularReader::new(config.report.delimiter);

    let normalized = reader.parse(&storage.read_text(&config.paths.normalized_file).await?);
    stats.findings_skipped += normalized.rejected.len();
    let findings = normalized
        .records
        .iter()
        .map(|record| ValidationFinding::from_row(record.values(), &config.oracle))
        .collect::<Result<Vec<_>>>()?;

    let content = reader.parse(&storage.read_text(source.artifact(config)).await?);
    let index = CorrelationIndex::from_records(&content.records, source.key_column());
    let join_on = source.join_key(config);
    log::info!(
        "Correlating {} findings against {} {} URLs (join on {:?})",
        findings.len(),
        index.url_count(),
        source,
        join_on
    );

    let correlator = Correlator::new(join_on, config.report.broken_only);
    let mut correlation = correlator.correlate(&findings, &index);
    stats.findings_unreportable += correlation.unreportable;

    if let Some(path) = &config.report.guide_map {
        let guides = GuideNames::parse(&read_required(path)?, config.report.guide_map_delimiter)?;
        let applied = guides.apply(&mut correlation.reports);
        stats.guide_names_applied += applied;
        log::info!("Replaced {} parent URLs with guide names", applied);
    }

    let header = Correlator::report_header(&index, &config.oracle);
    let report = write_table(
        &header,
        correlation.reports.iter().map(|r| r.values()),
        config.report.delimiter,
    )?;
    storage.write_text(&config.paths.report_file, &report).await?;
    stats.report_rows += correlation.reports.len();

    log::info!(
        "Wrote {} report rows to {}",
        correlation.reports.len(),
        storage.locate(&config.paths.report_file)
    );
    Ok(())
}

/// Normalize an oracle report, then correlate it.
pub async fn run_report(
    config: &Config,
    oracle_report: &Path,
    source: Source,
    storage: &dyn ArtifactStore,
    stats: &mut RunStats,
) -> Result<()> {
    run_normalize(config, oracle_report, storage, stats).await?;
    run_correlate(config, source, storage, stats).await
}
