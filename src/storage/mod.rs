//! Storage abstractions for materialized pipeline artifacts.
//!
//! Every stage reads its full input from storage and writes its full output
//! back before the next stage starts.
//!
//! ## Directory Structure
//!
//! ```text
//! storage/
//! ├── config.toml         # Run configuration
//! ├── seeds.txt           # Harvested seed URIs, one per line
//! ├── resolved.csv        # Seed -> canonical URL outcomes
//! ├── candidates.csv      # (URL, record metadata) pairs from the export
//! ├── oracle_urls.txt     # Deduplicated URLs for the oracle
//! ├── oracle_links.html   # Same URLs as an anchor page
//! ├── normalized.csv      # Repaired oracle report
//! ├── report.csv          # Correlated report
//! └── summary.json        # Run statistics
//! ```

pub mod local;

use async_trait::async_trait;

use crate::error::{AppError, Result};

// Re-export for convenience
pub use local::LocalStorage;

/// Trait for artifact storage backends.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Read an artifact, returning None if it does not exist.
    async fn read_optional(&self, key: &str) -> Result<Option<String>>;

    /// Write an artifact, replacing any previous version.
    async fn write_text(&self, key: &str, content: &str) -> Result<()>;

    /// Location of an artifact, for messages.
    fn locate(&self, key: &str) -> String;

    /// Read a required artifact. Absence is `InputMissing`.
    async fn read_text(&self, key: &str) -> Result<String> {
        self.read_optional(key)
            .await?
            .ok_or_else(|| AppError::input_missing(self.locate(key)))
    }
}
