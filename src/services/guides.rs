// src/services/guides.rs

//! Guide-name correlation.
//!
//! Research guides are reachable both by numeric id (`...?g=1234`) and by a
//! friendly alias path (`/g-one`). A mapping table with `real`, `alias` and
//! `name` columns lets report rows show the guide's name instead of its URL.

use std::collections::HashMap;

use crate::error::{AppError, Result};
use crate::models::CorrelatedReport;
use crate::services::TabularReader;
use crate::utils::url::{first_path_segment, query_param};

const GUIDE_PARAM: &str = "g";

/// Reduce a guide URL to the key used by the mapping table.
///
/// The `g` query parameter wins; otherwise the first path segment is the
/// alias. Text that is not a URL is used as-is.
pub fn normalize_guide_ref(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if !text.contains("://") {
        return Some(text.to_string());
    }
    query_param(text, GUIDE_PARAM).or_else(|| first_path_segment(text))
}

/// Lookup from guide id or alias to guide name.
#[derive(Debug, Default)]
pub struct GuideNames {
    names: HashMap<String, String>,
}

impl GuideNames {
    /// Build the lookup from a delimited mapping table.
    pub fn parse(text: &str, delimiter: char) -> Result<Self> {
        let table = TabularReader::new(delimiter).parse(text);
        for column in ["real", "alias", "name"] {
            if !table.header.iter().any(|h| h == column) {
                return Err(AppError::validation(format!(
                    "guide map is missing the '{column}' column"
                )));
            }
        }

        let mut names = HashMap::new();
        for record in &table.records {
            let name = record.field("name").unwrap_or_default().trim();
            if name.is_empty() {
                continue;
            }
            for column in ["real", "alias"] {
                if let Some(key) = record.field(column).and_then(normalize_guide_ref) {
                    names.insert(key, name.to_string());
                }
            }
        }
        log::debug!("Loaded {} guide keys", names.len());
        Ok(Self { names })
    }

    pub fn lookup(&self, guide_ref: &str) -> Option<&str> {
        normalize_guide_ref(guide_ref)
            .and_then(|key| self.names.get(&key))
            .map(String::as_str)
    }

    /// Replace parent URLs that point at a known guide with its name.
    ///
    /// Returns the number of rows changed.
    pub fn apply(&self, reports: &mut [CorrelatedReport]) -> usize {
        let mut applied = 0;
        for report in reports.iter_mut() {
            if let Some(name) = self.lookup(&report.finding.parent) {
                report.finding.parent = name.to_string();
                applied += 1;
            }
        }
        applied
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
