//! Correlated report rows and run statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ValidationFinding;

/// A finding joined to one content record that referenced its URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelatedReport {
    /// Metadata of the referencing record, in index header order
    pub metadata: Vec<String>,
    pub finding: ValidationFinding,
}

impl CorrelatedReport {
    /// Row values: metadata first, then finding fields.
    pub fn values(&self) -> Vec<String> {
        let mut values = self.metadata.clone();
        values.extend(self.finding.values());
        values
    }
}

/// Counters surfaced at the end of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,

    // Harvest
    pub pages_fetched: usize,
    pub pages_failed: usize,
    pub seeds_harvested: usize,

    // Resolve
    pub seeds_resolved: usize,
    pub seeds_failed: usize,

    // Extract
    pub records_read: usize,
    pub records_malformed: usize,
    pub records_without_link: usize,
    pub candidate_pairs: usize,
    pub unique_urls: usize,

    // Normalize / correlate
    pub findings_read: usize,
    pub findings_skipped: usize,
    pub duplicate_headers: usize,
    pub findings_unreportable: usize,
    pub report_rows: usize,
    pub guide_names_applied: usize,
}

impl RunStats {
    pub fn started() -> Self {
        Self {
            started_at: Some(Utc::now()),
            ..Self::default()
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Non-zero counters as (label, value) pairs for logging.
    pub fn summary_items(&self) -> Vec<(&'static str, usize)> {
        [
            ("pages fetched", self.pages_fetched),
            ("pages failed", self.pages_failed),
            ("seeds harvested", self.seeds_harvested),
            ("seeds resolved", self.seeds_resolved),
            ("seeds failed", self.seeds_failed),
            ("records read", self.records_read),
            ("records malformed", self.records_malformed),
            ("records without link", self.records_without_link),
            ("candidate pairs", self.candidate_pairs),
            ("unique urls", self.unique_urls),
            ("findings read", self.findings_read),
            ("findings skipped", self.findings_skipped),
            ("duplicate headers", self.duplicate_headers),
            ("findings unreportable", self.findings_unreportable),
            ("report rows", self.report_rows),
            ("guide names applied", self.guide_names_applied),
        ]
        .into_iter()
        .filter(|(_, value)| *value > 0)
        .collect()
    }

    /// Log the non-zero counters.
    pub fn log_summary(&self, title: &str) {
        log::info!("[SUMMARY] {}", title);
        for (key, value) in self.summary_items() {
            log::info!("    {}: {}", key, value);
        }
    }
}
