//! Application configuration structures.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::FieldRef;
use crate::utils::fs::load_toml;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP client and politeness settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Paginated listing harvest settings
    #[serde(default)]
    pub harvest: HarvestConfig,

    /// Redirect resolution settings
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Tabular export link extraction settings
    #[serde(default)]
    pub extract: ExtractConfig,

    /// Validation oracle report layout
    #[serde(default)]
    pub oracle: OracleConfig,

    /// Final report settings
    #[serde(default)]
    pub report: ReportConfig,

    /// Artifact locations
    #[serde(default)]
    pub paths: PathsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load_toml(path.as_ref())
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.harvest.page_size == 0 {
            return Err(AppError::validation("harvest.page_size must be > 0"));
        }
        if self.harvest.identifier_path.is_empty() {
            return Err(AppError::validation("harvest.identifier_path is empty"));
        }
        if self.resolver.max_hops == 0 {
            return Err(AppError::validation("resolver.max_hops must be > 0"));
        }
        if self.extract.candidate_fields.is_empty() {
            return Err(AppError::validation("extract.candidate_fields is empty"));
        }
        if self.oracle.columns.is_empty() {
            return Err(AppError::validation("oracle.columns is empty"));
        }
        for column in self.oracle.referenced_columns() {
            if self.oracle.column_index(column).is_none() {
                return Err(AppError::validation(format!(
                    "oracle column '{column}' is not listed in oracle.columns"
                )));
            }
        }
        for (name, delimiter) in [
            ("extract.delimiter", self.extract.delimiter),
            ("oracle.delimiter", self.oracle.delimiter),
            ("report.delimiter", self.report.delimiter),
        ] {
            if !delimiter.is_ascii() || delimiter == '"' || delimiter == '\n' {
                return Err(AppError::validation(format!(
                    "{name} must be a single ASCII character other than quote or newline"
                )));
            }
        }
        Ok(())
    }
}

/// HTTP client settings shared by the harvester and resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header identifying the auditor
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Minimum delay between successive remote calls in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
        }
    }
}

/// Cursor-based listing harvest settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Listing endpoint
    #[serde(default)]
    pub base_url: String,

    #[serde(default = "defaults::metadata_prefix")]
    pub metadata_prefix: String,

    /// Optional set restriction
    #[serde(default)]
    pub set: Option<String>,

    /// Records per page served by the remote listing
    #[serde(default = "defaults::page_size")]
    pub page_size: usize,

    /// Hard cap on pages requested (corpus size / page size, rounded up)
    #[serde(default)]
    pub max_pages: Option<usize>,

    /// Synthesized resumption cursor, used when a page carries no token.
    /// Placeholders: `{prefix}`, `{set}`, `{cursor}`.
    #[serde(default)]
    pub token_template: Option<String>,

    /// Element local-name path of the identifier inside each record
    #[serde(default = "defaults::identifier_path")]
    pub identifier_path: Vec<String>,

    /// Only identifiers starting with this prefix become seeds
    #[serde(default)]
    pub identifier_prefix: Option<String>,

    /// Identifier scheme substitution applied to every kept identifier
    #[serde(default)]
    pub rewrite: Option<Replacement>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            metadata_prefix: defaults::metadata_prefix(),
            set: None,
            page_size: defaults::page_size(),
            max_pages: None,
            token_template: None,
            identifier_path: defaults::identifier_path(),
            identifier_prefix: None,
            rewrite: None,
        }
    }
}

/// A text replacement rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    pub from: String,
    pub to: String,
}

impl Replacement {
    /// Replace the first occurrence of `from`.
    pub fn apply(&self, text: &str) -> String {
        text.replacen(&self.from, &self.to, 1)
    }
}

/// HTTP method used for each resolution hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HopMethod {
    #[default]
    Head,
    Get,
}

/// Redirect resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Maximum redirects followed per seed
    #[serde(default = "defaults::max_hops")]
    pub max_hops: usize,

    #[serde(default)]
    pub method: HopMethod,

    /// URL path prefix of canonical item pages; any final URL is accepted when unset
    #[serde(default)]
    pub item_path_prefix: Option<String>,

    /// Follow `Refresh` headers and meta refresh tags on interstitial pages
    #[serde(default = "defaults::enabled")]
    pub follow_refresh: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_hops: defaults::max_hops(),
            method: HopMethod::default(),
            item_path_prefix: None,
            follow_refresh: defaults::enabled(),
        }
    }
}

/// What to do with a field holding several URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MultiValuePolicy {
    /// Keep the first URL and discard the rest
    #[default]
    First,
    /// Emit one candidate per URL
    FanOut,
}

/// Tabular export link extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Field delimiter of the export
    #[serde(default = "defaults::comma")]
    pub delimiter: char,

    /// Candidate URL fields in priority order
    #[serde(default = "defaults::candidate_fields")]
    pub candidate_fields: Vec<FieldRef>,

    /// Record fields carried into the report
    #[serde(default = "defaults::metadata_fields")]
    pub metadata_fields: Vec<FieldRef>,

    /// Separator between URLs in a multi-valued field
    #[serde(default = "defaults::multi_value_separator")]
    pub multi_value_separator: String,

    #[serde(default)]
    pub multi_value_policy: MultiValuePolicy,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            delimiter: defaults::comma(),
            candidate_fields: defaults::candidate_fields(),
            metadata_fields: defaults::metadata_fields(),
            multi_value_separator: defaults::multi_value_separator(),
            multi_value_policy: MultiValuePolicy::default(),
        }
    }
}

/// Layout of the link-validation oracle's report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Native field delimiter
    #[serde(default = "defaults::semicolon")]
    pub delimiter: char,

    /// Rows starting with this character are annotations
    #[serde(default = "defaults::comment_marker")]
    pub comment_marker: char,

    /// Column names in oracle-defined order
    #[serde(default = "defaults::oracle_columns")]
    pub columns: Vec<String>,

    #[serde(default = "defaults::url_column")]
    pub url_column: String,

    #[serde(default = "defaults::parent_column")]
    pub parent_column: String,

    #[serde(default = "defaults::result_column")]
    pub result_column: String,

    #[serde(default = "defaults::diagnostic_columns")]
    pub diagnostic_columns: Vec<String>,

    #[serde(default = "defaults::valid_column")]
    pub valid_column: String,

    /// Characters that end a record when they immediately precede a line break
    #[serde(default = "defaults::record_terminators")]
    pub record_terminators: Vec<char>,

    /// Also end a record at a break once the pending row holds every column.
    ///
    /// The oracle does not always close rows with a terminator, so this is on
    /// by default. Switch it off when a wrapped last column can itself contain
    /// enough delimiters to look like a full row; records then end only at a
    /// terminator mark, a blank line or an annotation.
    #[serde(default = "defaults::enabled")]
    pub full_row_ends_record: bool,
}

impl OracleConfig {
    /// Position of a named column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    fn referenced_columns(&self) -> impl Iterator<Item = &String> {
        [&self.url_column, &self.parent_column, &self.result_column, &self.valid_column]
            .into_iter()
            .chain(self.diagnostic_columns.iter())
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            delimiter: defaults::semicolon(),
            comment_marker: defaults::comment_marker(),
            columns: defaults::oracle_columns(),
            url_column: defaults::url_column(),
            parent_column: defaults::parent_column(),
            result_column: defaults::result_column(),
            diagnostic_columns: defaults::diagnostic_columns(),
            valid_column: defaults::valid_column(),
            record_terminators: defaults::record_terminators(),
            full_row_ends_record: defaults::enabled(),
        }
    }
}

/// Which finding URL is joined against record URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinKey {
    /// The checked URL itself (URL list submitted to the oracle)
    Url,
    /// The page the URL was found on (item pages crawled by the oracle)
    Parent,
}

/// Final report settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Delimiter of normalized tables and the final report
    #[serde(default = "defaults::comma")]
    pub delimiter: char,

    /// Join key override; unset means the source's natural key
    /// (`url` for candidates, `parent` for resolved links)
    #[serde(default)]
    pub join_on: Option<JoinKey>,

    /// Keep only findings the oracle flagged invalid
    #[serde(default = "defaults::enabled")]
    pub broken_only: bool,

    /// Optional guide-name mapping table (real, alias, name)
    #[serde(default)]
    pub guide_map: Option<PathBuf>,

    #[serde(default = "defaults::comma")]
    pub guide_map_delimiter: char,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            delimiter: defaults::comma(),
            join_on: None,
            broken_only: defaults::enabled(),
            guide_map: None,
            guide_map_delimiter: defaults::comma(),
        }
    }
}

/// Artifact file names inside the storage directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "defaults::storage_dir")]
    pub storage_dir: PathBuf,
    #[serde(default = "defaults::seeds_file")]
    pub seeds_file: String,
    #[serde(default = "defaults::resolved_file")]
    pub resolved_file: String,
    #[serde(default = "defaults::candidates_file")]
    pub candidates_file: String,
    #[serde(default = "defaults::oracle_urls_file")]
    pub oracle_urls_file: String,
    #[serde(default = "defaults::oracle_links_file")]
    pub oracle_links_file: String,
    #[serde(default = "defaults::normalized_file")]
    pub normalized_file: String,
    #[serde(default = "defaults::report_file")]
    pub report_file: String,
    #[serde(default = "defaults::summary_file")]
    pub summary_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            storage_dir: defaults::storage_dir(),
            seeds_file: defaults::seeds_file(),
            resolved_file: defaults::resolved_file(),
            candidates_file: defaults::candidates_file(),
            oracle_urls_file: defaults::oracle_urls_file(),
            oracle_links_file: defaults::oracle_links_file(),
            normalized_file: defaults::normalized_file(),
            report_file: defaults::report_file(),
            summary_file: defaults::summary_file(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    use crate::models::FieldRef;

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; linkaudit/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        1000
    }
    pub fn enabled() -> bool {
        true
    }

    // Harvest defaults
    pub fn metadata_prefix() -> String {
        "oai_dc".into()
    }
    pub fn page_size() -> usize {
        100
    }
    pub fn identifier_path() -> Vec<String> {
        vec![
            "record".into(),
            "metadata".into(),
            "dc".into(),
            "identifier".into(),
        ]
    }

    // Resolver defaults
    pub fn max_hops() -> usize {
        2
    }

    // Extract defaults
    pub fn comma() -> char {
        ','
    }
    pub fn semicolon() -> char {
        ';'
    }
    pub fn candidate_fields() -> Vec<FieldRef> {
        vec![
            FieldRef::name("webAddress"),
            FieldRef::name("primaryWebAddress"),
            FieldRef::name("onlineResourceWebAddress"),
        ]
    }
    pub fn metadata_fields() -> Vec<FieldRef> {
        vec![
            FieldRef::name("title"),
            FieldRef::name("listId"),
            FieldRef::name("timePeriod"),
        ]
    }
    pub fn multi_value_separator() -> String {
        ";".into()
    }

    // Oracle defaults (LinkChecker CSV layout)
    pub fn comment_marker() -> char {
        '#'
    }
    pub fn oracle_columns() -> Vec<String> {
        [
            "urlname",
            "parentname",
            "base",
            "result",
            "warningstring",
            "infostring",
            "valid",
            "url",
            "line",
            "column",
            "name",
            "dltime",
            "size",
            "checktime",
            "cached",
            "level",
            "modified",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }
    pub fn url_column() -> String {
        "urlname".into()
    }
    pub fn parent_column() -> String {
        "parentname".into()
    }
    pub fn result_column() -> String {
        "result".into()
    }
    pub fn diagnostic_columns() -> Vec<String> {
        vec!["warningstring".into(), "infostring".into()]
    }
    pub fn valid_column() -> String {
        "valid".into()
    }
    pub fn record_terminators() -> Vec<char> {
        vec![';']
    }

    // Path defaults
    pub fn storage_dir() -> PathBuf {
        PathBuf::from("storage")
    }
    pub fn seeds_file() -> String {
        "seeds.txt".into()
    }
    pub fn resolved_file() -> String {
        "resolved.csv".into()
    }
    pub fn candidates_file() -> String {
        "candidates.csv".into()
    }
    pub fn oracle_urls_file() -> String {
        "oracle_urls.txt".into()
    }
    pub fn oracle_links_file() -> String {
        "oracle_links.html".into()
    }
    pub fn normalized_file() -> String {
        "normalized.csv".into()
    }
    pub fn report_file() -> String {
        "report.csv".into()
    }
    pub fn summary_file() -> String {
        "summary.json".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.http.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_hops() {
        let mut config = Config::default();
        config.resolver.max_hops = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_oracle_column() {
        let mut config = Config::default();
        config.oracle.valid_column = "ok".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_quote_delimiter() {
        let mut config = Config::default();
        config.report.delimiter = '"';
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            [resolver]
            item_path_prefix = "/items/"

            [extract]
            candidate_fields = ["url", 4]
            multi_value_policy = "fan_out"

            [report]
            join_on = "parent"
            "#,
        )
        .unwrap();
        assert_eq!(config.resolver.max_hops, 2);
        assert_eq!(config.resolver.method, HopMethod::Head);
        assert_eq!(config.resolver.item_path_prefix.as_deref(), Some("/items/"));
        assert_eq!(
            config.extract.candidate_fields,
            vec![FieldRef::name("url"), FieldRef::Index(4)]
        );
        assert_eq!(config.extract.multi_value_policy, MultiValuePolicy::FanOut);
        assert_eq!(config.report.join_on, Some(JoinKey::Parent));
        assert_eq!(config.oracle.delimiter, ';');
        assert!(config.oracle.full_row_ends_record);
        assert!(Config::default().report.join_on.is_none());
    }

    #[test]
    fn replacement_rewrites_first_occurrence() {
        let rule = Replacement {
            from: "hdl.handle.net".into(),
            to: "repository.example.edu/handle".into(),
        };
        assert_eq!(
            rule.apply("http://hdl.handle.net/1813/123"),
            "http://repository.example.edu/handle/1813/123"
        );
    }
}
