// src/services/harvester.rs

//! Paginated listing harvester.
//!
//! Drives a resumption-token listing (OAI-PMH `ListRecords` style) to the
//! end, pulling one identifier element out of every record and turning it
//! into a seed for the redirect resolver.
//!
//! The end of the listing is taken from the protocol when it says so (an
//! empty or missing `resumptionToken`, `noRecordsMatch`, an empty page).
//! `max_pages` caps the walk, and `token_template` lets the harvester
//! synthesize cursors from its running record counter for servers that do
//! not hand out tokens.

use std::collections::HashSet;

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use reqwest::Client;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{HarvestConfig, SeedUri};
use crate::utils::http::Throttle;

/// How the next page is requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    Start,
    Resume(String),
}

/// What a page said about the rest of the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resumption {
    Token(String),
    Exhausted,
    Absent,
}

/// One parsed listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    pub identifiers: Vec<String>,
    pub record_count: usize,
    pub resumption: Resumption,
}

/// Summary of a harvest run.
#[derive(Debug, Default)]
pub struct HarvestOutcome {
    pub seeds: Vec<SeedUri>,
    pub pages_fetched: usize,
    pub pages_failed: usize,
    pub records_seen: usize,
}

/// Service harvesting seeds from a paginated remote listing.
pub struct PaginatedHarvester<'a> {
    client: &'a Client,
    config: HarvestConfig,
    throttle: Throttle,
}

impl<'a> PaginatedHarvester<'a> {
    pub fn new(client: &'a Client, config: &HarvestConfig, throttle: Throttle) -> Self {
        Self {
            client,
            config: config.clone(),
            throttle,
        }
    }

    /// Walk the listing until it is exhausted or the page cap is reached.
    pub async fn harvest(&mut self) -> Result<HarvestOutcome> {
        let mut outcome = HarvestOutcome::default();
        let mut seen = HashSet::new();
        let mut request = PageRequest::Start;
        let mut cursor = 0;
        let mut page = 0;

        loop {
            if self.config.max_pages.is_some_and(|max| page >= max) {
                log::info!("Stopping after configured page count ({})", page);
                break;
            }
            page += 1;

            let url = self.request_url(&request)?;
            log::debug!("Fetching listing page {}: {}", page, url);
            let result = self.fetch_page(&url).await;
            cursor += self.config.page_size;

            let next = match result {
                Ok(listing) => {
                    outcome.pages_fetched += 1;
                    outcome.records_seen += listing.record_count;
                    for seed in self.seeds_from(&listing.identifiers) {
                        if seen.insert(seed.clone()) {
                            outcome.seeds.push(seed);
                        }
                    }
                    match listing.resumption {
                        Resumption::Token(token) => Some(PageRequest::Resume(token)),
                        Resumption::Exhausted => None,
                        Resumption::Absent if listing.record_count == 0 => None,
                        Resumption::Absent => self.synthesized(cursor),
                    }
                }
                Err(e) => {
                    outcome.pages_failed += 1;
                    log::warn!("Listing page {} failed: {}", page, e);
                    self.synthesized(cursor)
                }
            };

            match next {
                Some(r) => request = r,
                None => break,
            }
        }

        log::info!(
            "Harvested {} seeds from {} records over {} pages ({} failed)",
            outcome.seeds.len(),
            outcome.records_seen,
            outcome.pages_fetched,
            outcome.pages_failed
        );
        Ok(outcome)
    }

    /// Build the request URL for a page.
    pub fn request_url(&self, request: &PageRequest) -> Result<Url> {
        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| AppError::config(format!("harvest.base_url: {e}")))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("verb", "ListRecords");
            match request {
                PageRequest::Start => {
                    query.append_pair("metadataPrefix", &self.config.metadata_prefix);
                    if let Some(set) = &self.config.set {
                        query.append_pair("set", set);
                    }
                }
                PageRequest::Resume(token) => {
                    query.append_pair("resumptionToken", token);
                }
            }
        }
        Ok(url)
    }

    fn synthesized(&self, cursor: usize) -> Option<PageRequest> {
        let template = self.config.token_template.as_ref()?;
        let token = template
            .replace("{prefix}", &self.config.metadata_prefix)
            .replace("{set}", self.config.set.as_deref().unwrap_or(""))
            .replace("{cursor}", &cursor.to_string());
        Some(PageRequest::Resume(token))
    }

    async fn fetch_page(&mut self, url: &Url) -> Result<ListingPage> {
        self.throttle.wait().await;
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::remote(url.as_str(), format!("HTTP {status}")));
        }
        let body = response.text().await?;
        parse_listing(&body, &self.config.identifier_path)
    }

    /// Filter and rewrite raw identifiers into seeds.
    fn seeds_from(&self, identifiers: &[String]) -> Vec<SeedUri> {
        identifiers
            .iter()
            .filter(|id| {
                self.config
                    .identifier_prefix
                    .as_deref()
                    .is_none_or(|prefix| id.starts_with(prefix))
            })
            .map(|id| match &self.config.rewrite {
                Some(rule) => rule.apply(id),
                None => id.clone(),
            })
            .map(SeedUri)
            .collect()
    }
}

/// Parse one listing response.
///
/// `identifier_path` is a suffix of element local names; its first entry names
/// the per-record element, which is what gets counted.
pub fn parse_listing(xml: &str, identifier_path: &[String]) -> Result<ListingPage> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<String> = Vec::new();
    let mut identifiers = Vec::new();
    let mut record_count = 0;
    let mut text = String::new();
    let mut token: Option<String> = None;
    let mut error_code: Option<String> = None;

    let record_element = identifier_path.first().map(String::as_str);

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if Some(name.as_str()) == record_element {
                    record_count += 1;
                }
                if name == "resumptionToken" {
                    token = Some(String::new());
                }
                if name == "error" {
                    error_code = Some(attribute(&e, b"code").unwrap_or_default());
                }
                stack.push(name);
                text.clear();
            }
            Event::Empty(e) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"resumptionToken" => token = Some(String::new()),
                    b"error" => error_code = Some(attribute(&e, b"code").unwrap_or_default()),
                    _ => {}
                }
            }
            Event::Text(t) => text.push_str(&t.unescape().map_err(quick_xml::Error::from)?),
            Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c)),
            Event::End(_) => {
                if stack.ends_with(identifier_path) {
                    let value = text.trim();
                    if !value.is_empty() {
                        identifiers.push(value.to_string());
                    }
                } else if stack.last().is_some_and(|n| n == "resumptionToken") {
                    token = Some(text.trim().to_string());
                }
                stack.pop();
                text.clear();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(code) = error_code {
        if code == "noRecordsMatch" {
            return Ok(ListingPage {
                identifiers,
                record_count,
                resumption: Resumption::Exhausted,
            });
        }
        return Err(AppError::remote("listing", format!("protocol error '{code}'")));
    }

    let resumption = match token {
        Some(t) if !t.is_empty() => Resumption::Token(t),
        Some(_) => Resumption::Exhausted,
        None => Resumption::Absent,
    };
    Ok(ListingPage {
        identifiers,
        record_count,
        resumption,
    })
}

fn attribute(element: &quick_xml::events::BytesStart<'_>, key: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}
