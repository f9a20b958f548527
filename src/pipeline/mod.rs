//! Pipeline entry points for link audit stages.
//!
//! Redirect-indirection platforms: `run_harvest` → `run_resolve` → oracle →
//! `run_normalize` → `run_correlate`.
//! Tabular-export platforms: `run_extract` → oracle → `run_normalize` →
//! `run_correlate`.
//!
//! Every stage reads its inputs from and writes its outputs to an
//! [`ArtifactStore`](crate::storage::ArtifactStore), and adds its counters to
//! the run's [`RunStats`].

mod correlate;
mod extract;
mod harvest;
mod resolve;
mod validate;

use crate::error::Result;
use crate::models::{PathsConfig, RunStats};
use crate::storage::ArtifactStore;
use crate::utils::url::escape_html;

pub use correlate::{Source, run_correlate, run_normalize, run_report};
pub use extract::run_extract;
pub use harvest::run_harvest;
pub use resolve::run_resolve;
pub use validate::run_validate;

/// Close the run: stamp the finish time, log counters and persist them.
pub async fn finish_run(
    storage: &dyn ArtifactStore,
    paths: &PathsConfig,
    stats: &mut RunStats,
    title: &str,
) -> Result<()> {
    stats.finish();
    stats.log_summary(title);
    let json = serde_json::to_string_pretty(stats)?;
    storage.write_text(&paths.summary_file, &json).await
}

/// Write the deduplicated URL set in both forms the oracle accepts.
async fn write_oracle_inputs(
    storage: &dyn ArtifactStore,
    paths: &PathsConfig,
    urls: &[String],
) -> Result<()> {
    let mut list = urls.join("\n");
    if !list.is_empty() {
        list.push('\n');
    }
    storage.write_text(&paths.oracle_urls_file, &list).await?;
    storage
        .write_text(&paths.oracle_links_file, &anchor_page(urls))
        .await?;

    log::info!(
        "Wrote {} URLs for the oracle to {} and {}",
        urls.len(),
        storage.locate(&paths.oracle_urls_file),
        storage.locate(&paths.oracle_links_file)
    );
    Ok(())
}

/// HTML page with one anchor per URL.
fn anchor_page(urls: &[String]) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Links</title></head>\n<body>\n",
    );
    for url in urls {
        let escaped = escape_html(url);
        html.push_str(&format!("<a href=\"{escaped}\">{escaped}</a><br>\n"));
    }
    html.push_str("</body>\n</html>\n");
    html
}

/// Split a one-per-line list, ignoring blank lines.
fn read_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
