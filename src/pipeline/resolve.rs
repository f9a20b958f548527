// src/pipeline/resolve.rs

//! Seed resolution stage.

use std::collections::HashSet;

use reqwest::Client;

use crate::error::Result;
use crate::models::{Config, ResolvedLink, RunStats, SeedUri};
use crate::pipeline::{read_lines, write_oracle_inputs};
use crate::services::RedirectResolver;
use crate::storage::ArtifactStore;
use crate::utils::delimited::write_table;
use crate::utils::http::Throttle;

/// Resolve stored seeds to canonical URLs and prepare the oracle input.
///
/// Failed seeds are kept in the resolved table with their reason and last
/// URI; only canonical URLs go to the oracle.
pub async fn run_resolve(
    config: &Config,
    client: &Client,
    storage: &dyn ArtifactStore,
    stats: &mut RunStats,
) -> Result<()> {
    let seeds: Vec<SeedUri> = read_lines(&storage.read_text(&config.paths.seeds_file).await?)
        .into_iter()
        .map(SeedUri::new)
        .collect();
    log::info!("Resolving {} seeds (max {} hops)", seeds.len(), config.resolver.max_hops);

    let mut resolver = RedirectResolver::new(client, &config.resolver, Throttle::new(&config.http));
    let links = resolver.resolve_all(&seeds).await;

    let resolved = links.iter().filter(|l| l.is_resolved()).count();
    stats.seeds_resolved += resolved;
    stats.seeds_failed += links.len() - resolved;

    let table = write_table(
        &ResolvedLink::table_header(),
        links.iter().map(ResolvedLink::to_row),
        config.report.delimiter,
    )?;
    storage.write_text(&config.paths.resolved_file, &table).await?;

    let urls = unique_canonical(&links);
    stats.unique_urls += urls.len();
    write_oracle_inputs(storage, &config.paths, &urls).await?;

    log::info!(
        "Resolved {}/{} seeds to {} distinct URLs",
        resolved,
        links.len(),
        urls.len()
    );
    Ok(())
}

/// Canonical URLs in first-seen order, without repeats.
fn unique_canonical(links: &[ResolvedLink]) -> Vec<String> {
    let mut seen = HashSet::new();
    links
        .iter()
        .filter_map(ResolvedLink::canonical)
        .filter(|url| seen.insert(*url))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CanonicalUrl, FailureReason, ResolutionFailure};

    fn ok(seed: &str, url: &str) -> ResolvedLink {
        ResolvedLink {
            seed: SeedUri::new(seed),
            outcome: Ok(CanonicalUrl {
                url: url.into(),
                hops: 1,
            }),
        }
    }

    #[test]
    fn test_unique_canonical_skips_failures_and_repeats() {
        let links = vec![
            ok("s1", "https://repo.test/items/1"),
            ResolvedLink {
                seed: SeedUri::new("s2"),
                outcome: Err(ResolutionFailure::new("s2", FailureReason::Request("timeout".into()))),
            },
            ok("s3", "https://repo.test/items/1"),
            ok("s4", "https://repo.test/items/2"),
        ];
        assert_eq!(
            unique_canonical(&links),
            vec!["https://repo.test/items/1", "https://repo.test/items/2"]
        );
    }
}
