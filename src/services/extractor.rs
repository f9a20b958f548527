// src/services/extractor.rs

//! Candidate link extractor.
//!
//! Picks the first populated URL field of every content record and keeps the
//! record alongside it, so findings can later be traced back to every record
//! that pointed at a URL.

use std::collections::HashSet;

use crate::models::{CandidateLink, ContentRecord, ExtractConfig, FieldRef, MultiValuePolicy};
use crate::utils::url::{clean, split_values};

/// Output of an extraction pass.
#[derive(Debug, Default)]
pub struct CandidateSet {
    /// Every (URL, record) pair, in record order
    pub links: Vec<CandidateLink>,
    /// Distinct URLs in first-seen order, for oracle submission
    pub unique_urls: Vec<String>,
    /// Records with no populated candidate field
    pub records_without_link: usize,
}

/// Service selecting candidate URLs from content records.
pub struct LinkExtractor {
    config: ExtractConfig,
}

impl LinkExtractor {
    pub fn new(config: &ExtractConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Extract candidate links from all records.
    pub fn extract(&self, records: &[ContentRecord]) -> CandidateSet {
        let mut set = CandidateSet::default();
        let mut seen = HashSet::new();

        for record in records {
            let urls = self.select(record);
            if urls.is_empty() {
                set.records_without_link += 1;
                continue;
            }
            for url in urls {
                if seen.insert(url.clone()) {
                    set.unique_urls.push(url.clone());
                }
                set.links.push(CandidateLink {
                    url,
                    record: record.clone(),
                });
            }
        }

        log::info!(
            "Extracted {} links ({} unique) from {} records; {} without a link",
            set.links.len(),
            set.unique_urls.len(),
            records.len(),
            set.records_without_link
        );
        set
    }

    /// URLs of the first candidate field holding a usable value, after cleanup.
    pub fn select(&self, record: &ContentRecord) -> Vec<String> {
        let Some(values) = first_populated(
            record,
            &self.config.candidate_fields,
            &self.config.multi_value_separator,
        ) else {
            return Vec::new();
        };

        let kept = match self.config.multi_value_policy {
            MultiValuePolicy::First => values.into_iter().take(1).collect::<Vec<_>>(),
            MultiValuePolicy::FanOut => values,
        };

        let mut urls: Vec<String> = Vec::with_capacity(kept.len());
        for url in kept {
            if !urls.contains(&url) {
                urls.push(url);
            }
        }
        urls
    }

    /// Metadata values of a record for the configured fields; missing fields read as empty.
    pub fn metadata(&self, record: &ContentRecord) -> Vec<String> {
        self.config
            .metadata_fields
            .iter()
            .map(|f| record.get(f).unwrap_or_default().to_string())
            .collect()
    }

    /// Header names matching [`Self::metadata`].
    pub fn metadata_header(&self) -> Vec<String> {
        self.config
            .metadata_fields
            .iter()
            .map(|f| f.to_string())
            .collect()
    }
}

/// Cleaned values of the first field, in priority order, that yields any.
///
/// Entities are decoded before splitting so `&amp;` never reads as a separator.
fn first_populated(
    record: &ContentRecord,
    fields: &[FieldRef],
    separator: &str,
) -> Option<Vec<String>> {
    fields.iter().filter_map(|f| record.get(f)).find_map(|raw| {
        let decoded = raw.replace("&amp;", "&");
        let values: Vec<String> = split_values(&decoded, separator)
            .into_iter()
            .map(clean)
            .filter(|u| !u.is_empty())
            .collect();
        (!values.is_empty()).then_some(values)
    })
}
