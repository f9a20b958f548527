// src/services/resolver.rs

//! Redirect resolver.
//!
//! Walks a seed's redirect chain one hop at a time until it reaches the
//! platform's item page shape, so the oracle never sees a redirect.

use regex::Regex;
use reqwest::header::{CONTENT_TYPE, LOCATION, REFRESH};
use reqwest::{Client, Method, Response};
use scraper::{Html, Selector};

use crate::models::{
    CanonicalUrl, FailureReason, HopMethod, ResolutionFailure, ResolvedLink, ResolverConfig,
    SeedUri,
};
use crate::utils::http::Throttle;
use crate::utils::url::{has_path_prefix, resolve};

/// What one request told us about the next hop.
#[derive(Debug)]
struct HopOutcome {
    status: u16,
    next: Option<String>,
}

/// Service resolving seeds to canonical item-page URLs.
pub struct RedirectResolver<'a> {
    client: &'a Client,
    config: ResolverConfig,
    throttle: Throttle,
}

impl<'a> RedirectResolver<'a> {
    pub fn new(client: &'a Client, config: &ResolverConfig, throttle: Throttle) -> Self {
        Self {
            client,
            config: config.clone(),
            throttle,
        }
    }

    /// Resolve every seed in order, one request at a time.
    pub async fn resolve_all(&mut self, seeds: &[SeedUri]) -> Vec<ResolvedLink> {
        let mut resolved = Vec::with_capacity(seeds.len());
        for (i, seed) in seeds.iter().enumerate() {
            let link = self.resolve(seed).await;
            match &link.outcome {
                Ok(canonical) => log::debug!(
                    "[{}/{}] {} -> {} ({} hops)",
                    i + 1,
                    seeds.len(),
                    seed,
                    canonical.url,
                    canonical.hops
                ),
                Err(failure) => log::warn!("[{}/{}] {}: {}", i + 1, seeds.len(), seed, failure),
            }
            resolved.push(link);
        }
        resolved
    }

    /// Resolve one seed, following at most `max_hops` redirects.
    pub async fn resolve(&mut self, seed: &SeedUri) -> ResolvedLink {
        ResolvedLink {
            seed: seed.clone(),
            outcome: self.follow(seed.as_str()).await,
        }
    }

    async fn follow(&mut self, seed: &str) -> Result<CanonicalUrl, ResolutionFailure> {
        let mut current = seed.to_string();
        let mut hops = 0;

        loop {
            if self.is_item_page(&current) {
                return Ok(CanonicalUrl { url: current, hops });
            }

            let outcome = self
                .hop(&current)
                .await
                .map_err(|reason| ResolutionFailure::new(&current, reason))?;

            let Some(target) = outcome.next else {
                return match self.config.item_path_prefix {
                    None => Ok(CanonicalUrl { url: current, hops }),
                    Some(_) => Err(ResolutionFailure::new(
                        current,
                        FailureReason::NotCanonical {
                            status: outcome.status,
                        },
                    )),
                };
            };

            if hops == self.config.max_hops {
                return Err(ResolutionFailure::new(
                    current,
                    FailureReason::HopLimitExceeded {
                        limit: self.config.max_hops,
                    },
                ));
            }
            hops += 1;
            current = target;
        }
    }

    fn is_item_page(&self, url: &str) -> bool {
        self.config
            .item_path_prefix
            .as_deref()
            .is_some_and(|prefix| has_path_prefix(url, prefix))
    }

    /// Issue one request and work out where it points, without following it.
    async fn hop(&mut self, url: &str) -> Result<HopOutcome, FailureReason> {
        let method = match self.config.method {
            HopMethod::Head => Method::HEAD,
            HopMethod::Get => Method::GET,
        };
        let response = self.send(method, url).await?;
        let status = response.status().as_u16();

        if response.status().is_redirection() {
            if let Some(location) = header_str(&response, LOCATION) {
                let target = resolve(url, &location)
                    .map_err(|_| FailureReason::InvalidTarget(location.clone()))?;
                return Ok(HopOutcome {
                    status,
                    next: Some(target),
                });
            }
        }

        // Only interstitial pages are worth inspecting for a refresh.
        if !self.config.follow_refresh || self.config.item_path_prefix.is_none() {
            return Ok(HopOutcome { status, next: None });
        }

        let mut refresh = header_str(&response, REFRESH).and_then(|v| refresh_target(&v));
        if refresh.is_none() {
            let response = match self.config.method {
                HopMethod::Get => response,
                HopMethod::Head => self.send(Method::GET, url).await?,
            };
            if is_html(&response) {
                let body = response
                    .text()
                    .await
                    .map_err(|e| FailureReason::Request(e.to_string()))?;
                refresh = meta_refresh_target(&body);
            }
        }

        let next = refresh
            .map(|target| {
                resolve(url, &target).map_err(|_| FailureReason::InvalidTarget(target.clone()))
            })
            .transpose()?;
        Ok(HopOutcome { status, next })
    }

    async fn send(&mut self, method: Method, url: &str) -> Result<Response, FailureReason> {
        self.throttle.wait().await;
        self.client
            .request(method, url)
            .send()
            .await
            .map_err(|e| FailureReason::Request(e.to_string()))
    }
}

fn header_str(response: &Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn is_html(response: &Response) -> bool {
    header_str(response, CONTENT_TYPE).is_some_and(|ct| ct.contains("html"))
}

/// Target of a `Refresh` header or meta content value, e.g. `0; url=/items/1`.
fn refresh_target(value: &str) -> Option<String> {
    Regex::new(r#"(?i)url\s*=\s*['"]?([^'"\s>]+)"#)
        .ok()?
        .captures(value)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn meta_refresh_target(body: &str) -> Option<String> {
    let document = Html::parse_document(body);
    let selector = Selector::parse("meta[http-equiv][content]").ok()?;
    document
        .select(&selector)
        .filter(|el| {
            el.value()
                .attr("http-equiv")
                .is_some_and(|v| v.eq_ignore_ascii_case("refresh"))
        })
        .find_map(|el| el.value().attr("content").and_then(refresh_target))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_target_parses_header_forms() {
        assert_eq!(
            refresh_target("0; url=/items/abc"),
            Some("/items/abc".to_string())
        );
        assert_eq!(
            refresh_target("5;URL='https://repo.test/items/abc'"),
            Some("https://repo.test/items/abc".to_string())
        );
        assert_eq!(refresh_target("30"), None);
    }

    #[test]
    fn test_meta_refresh_target() {
        let body = r#"<html><head>
            <meta charset="utf-8">
            <meta http-equiv="Refresh" content="0; url=/items/abc">
            </head><body>Redirecting</body></html>"#;
        assert_eq!(meta_refresh_target(body), Some("/items/abc".to_string()));
        assert_eq!(meta_refresh_target("<html><body>plain</body></html>"), None);
    }
}
