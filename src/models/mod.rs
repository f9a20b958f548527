// src/models/mod.rs

//! Domain models for the link audit engine.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod finding;
mod link;
mod record;
mod report;

// Re-export all public types
pub use config::{
    Config, ExtractConfig, HarvestConfig, HopMethod, HttpConfig, JoinKey, MultiValuePolicy,
    OracleConfig, PathsConfig, Replacement, ReportConfig, ResolverConfig,
};
pub use finding::ValidationFinding;
pub use link::{CandidateLink, CanonicalUrl, FailureReason, ResolutionFailure, ResolvedLink, SeedUri};
pub use record::{ContentRecord, FieldRef};
pub use report::{CorrelatedReport, RunStats};
