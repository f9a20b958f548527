// src/services/correlator.rs

//! Correlation engine.
//!
//! Joins oracle findings back to the content that referenced the checked URL.
//! The join is byte-exact on the URL text; a finding is emitted once for every
//! referencing record, and findings with no referencing record are dropped.

use std::collections::HashMap;

use crate::models::{
    CandidateLink, ContentRecord, CorrelatedReport, JoinKey, OracleConfig, ResolvedLink,
    ValidationFinding,
};
use crate::services::LinkExtractor;

/// Lookup from URL to the metadata of every record that references it.
#[derive(Debug, Default)]
pub struct CorrelationIndex {
    header: Vec<String>,
    by_url: HashMap<String, Vec<Vec<String>>>,
}

impl CorrelationIndex {
    pub fn new(header: Vec<String>) -> Self {
        Self {
            header,
            by_url: HashMap::new(),
        }
    }

    /// Add one referencing record. Duplicates are kept.
    pub fn insert(&mut self, url: impl Into<String>, metadata: Vec<String>) {
        self.by_url.entry(url.into()).or_default().push(metadata);
    }

    /// Index extracted (URL, record) pairs by the extractor's metadata fields.
    pub fn from_candidates(links: &[CandidateLink], extractor: &LinkExtractor) -> Self {
        let mut index = Self::new(extractor.metadata_header());
        for link in links {
            index.insert(link.url.clone(), extractor.metadata(&link.record));
        }
        index
    }

    /// Index successfully resolved seeds by canonical URL.
    pub fn from_resolved(links: &[ResolvedLink]) -> Self {
        let mut index = Self::new(vec!["seed".to_string()]);
        for link in links {
            if let Some(url) = link.canonical() {
                index.insert(url, vec![link.seed.0.clone()]);
            }
        }
        index
    }

    /// Index records read back from an artifact table, keyed by `url_field`.
    ///
    /// Every other column becomes metadata; rows with an empty key are ignored.
    pub fn from_records(records: &[ContentRecord], url_field: &str) -> Self {
        let Some(first) = records.first() else {
            return Self::default();
        };
        let key = first.header().iter().position(|h| h == url_field);
        let header = first
            .header()
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != key)
            .map(|(_, h)| h.clone())
            .collect();

        let mut index = Self::new(header);
        let Some(key) = key else {
            log::warn!("Column '{}' not found; nothing to correlate", url_field);
            return index;
        };
        for record in records {
            let url = record.values().get(key).map(String::as_str).unwrap_or("");
            if url.is_empty() {
                continue;
            }
            let metadata = record
                .values()
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != key)
                .map(|(_, v)| v.clone())
                .collect();
            index.insert(url, metadata);
        }
        index
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Metadata rows referencing a URL, in insertion order.
    pub fn lookup(&self, url: &str) -> &[Vec<String>] {
        self.by_url.get(url).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct URLs.
    pub fn url_count(&self) -> usize {
        self.by_url.len()
    }
}

/// Output of a correlation pass.
#[derive(Debug, Default)]
pub struct Correlation {
    pub reports: Vec<CorrelatedReport>,
    /// Findings whose URL no record references
    pub unreportable: usize,
    /// Findings the oracle marked valid, when only broken ones are reported
    pub ignored_valid: usize,
}

/// Service joining findings to content metadata.
pub struct Correlator {
    join_on: JoinKey,
    broken_only: bool,
}

impl Correlator {
    pub fn new(join_on: JoinKey, broken_only: bool) -> Self {
        Self {
            join_on,
            broken_only,
        }
    }

    /// Join every finding against the index, fanning out per referencing record.
    pub fn correlate(
        &self,
        findings: &[ValidationFinding],
        index: &CorrelationIndex,
    ) -> Correlation {
        let mut correlation = Correlation::default();

        for finding in findings {
            if self.broken_only && !finding.is_broken() {
                correlation.ignored_valid += 1;
                continue;
            }
            let key = match self.join_on {
                JoinKey::Url => &finding.url,
                JoinKey::Parent => &finding.parent,
            };
            let matches = index.lookup(key);
            if matches.is_empty() {
                log::debug!("No content references {}; dropping finding", key);
                correlation.unreportable += 1;
                continue;
            }
            correlation
                .reports
                .extend(matches.iter().map(|metadata| CorrelatedReport {
                    metadata: metadata.clone(),
                    finding: finding.clone(),
                }));
        }

        log::info!(
            "Correlated {} findings into {} report rows ({} unreportable)",
            findings.len(),
            correlation.reports.len(),
            correlation.unreportable
        );
        correlation
    }

    /// Report header: index metadata columns, then finding columns.
    pub fn report_header(index: &CorrelationIndex, layout: &OracleConfig) -> Vec<String> {
        let mut header = index.header().to_vec();
        header.extend(ValidationFinding::header(layout));
        header
    }
}
