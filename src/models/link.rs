//! Seed, resolved and candidate link structures.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::ContentRecord;

/// An indirect content-system identifier that still needs resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeedUri(pub String);

impl SeedUri {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SeedUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a redirect chain did not reach a canonical item page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// More redirects than the configured bound
    HopLimitExceeded { limit: usize },
    /// The request itself failed (transport error, timeout)
    Request(String),
    /// The chain ended on a page that is not an item page
    NotCanonical { status: u16 },
    /// A redirect target could not be parsed
    InvalidTarget(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::HopLimitExceeded { limit } => {
                write!(f, "hop limit exceeded ({limit} hops)")
            }
            FailureReason::Request(message) => write!(f, "request failed: {message}"),
            FailureReason::NotCanonical { status } => {
                write!(f, "chain ended outside item pages (status {status})")
            }
            FailureReason::InvalidTarget(target) => write!(f, "invalid redirect target '{target}'"),
        }
    }
}

/// A failed resolution, carrying the last URI reached.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Resolution failed at {last_uri}: {reason}")]
pub struct ResolutionFailure {
    pub last_uri: String,
    pub reason: FailureReason,
}

impl ResolutionFailure {
    pub fn new(last_uri: impl Into<String>, reason: FailureReason) -> Self {
        Self {
            last_uri: last_uri.into(),
            reason,
        }
    }
}

/// Outcome of resolving one seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    pub seed: SeedUri,
    pub outcome: std::result::Result<CanonicalUrl, ResolutionFailure>,
}

/// A crawlable URL reached by following a redirect chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalUrl {
    pub url: String,
    /// Number of redirects followed to reach it
    pub hops: usize,
}

impl ResolvedLink {
    pub fn canonical(&self) -> Option<&str> {
        self.outcome.as_ref().ok().map(|c| c.url.as_str())
    }

    pub fn is_resolved(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Header of the resolved-link artifact table.
    pub fn table_header() -> [&'static str; 5] {
        ["seed", "canonical_url", "hops", "status", "last_uri"]
    }

    /// Row of the resolved-link artifact table, matching [`Self::table_header`].
    pub fn to_row(&self) -> [String; 5] {
        match &self.outcome {
            Ok(canonical) => [
                self.seed.0.clone(),
                canonical.url.clone(),
                canonical.hops.to_string(),
                "resolved".to_string(),
                canonical.url.clone(),
            ],
            Err(failure) => [
                self.seed.0.clone(),
                String::new(),
                String::new(),
                failure.reason.to_string(),
                failure.last_uri.clone(),
            ],
        }
    }
}

/// A selected URL together with the record that contained it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLink {
    pub url: String,
    pub record: ContentRecord,
}
