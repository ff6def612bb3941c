//! Configuration management.
//!
//! Configuration is read from a TOML file and then overridden by environment
//! variables named `CITE_SCOUT__<SECTION>__<KEY>`.
//!
//! ```toml
//! [extraction]
//! max_statements = 10
//! extra_patterns = []
//!
//! [aggregation]
//! max_queries = 3
//! max_papers = 15
//! query_delay_ms = 1000
//! request_budget_secs = 45
//! query_statements_when_no_citations = true
//! min_similarity = 0.0
//!
//! [sources]
//! timeout_secs = 10
//! max_results = 5
//! enabled = ["arxiv", "openalex", "crossref", "pubmed"]
//! # mailto = "you@example.com"
//!
//! [logging]
//! level = "info"
//! # format = "json"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "cite-scout.toml";

const ENV_PREFIX: &str = "CITE_SCOUT";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub extraction: ExtractionConfig,

    #[serde(default)]
    pub aggregation: AggregationConfig,

    #[serde(default)]
    pub sources: SourcesConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Citation and statement extraction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Maximum statements kept per document
    #[serde(default = "default_max_statements")]
    pub max_statements: usize,

    /// Additional citation regexes, tried after the built-in styles
    #[serde(default)]
    pub extra_patterns: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_statements: default_max_statements(),
            extra_patterns: Vec::new(),
        }
    }
}

fn default_max_statements() -> usize {
    10
}

/// Query fan-out and merge settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Citations (or statements) turned into queries per document
    #[serde(default = "default_max_queries")]
    pub max_queries: usize,

    /// Cap on unique related papers per report
    #[serde(default = "default_max_papers")]
    pub max_papers: usize,

    /// Pause between successive query batches
    #[serde(default = "default_query_delay_ms")]
    pub query_delay_ms: u64,

    /// Overall deadline for the search phase of one request
    #[serde(default = "default_request_budget_secs")]
    pub request_budget_secs: u64,

    #[serde(default = "default_true")]
    pub query_statements_when_no_citations: bool,

    /// Papers scoring below this fraction are dropped
    #[serde(default)]
    pub min_similarity: f64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            max_queries: default_max_queries(),
            max_papers: default_max_papers(),
            query_delay_ms: default_query_delay_ms(),
            request_budget_secs: default_request_budget_secs(),
            query_statements_when_no_citations: true,
            min_similarity: 0.0,
        }
    }
}

fn default_max_queries() -> usize {
    3
}

fn default_max_papers() -> usize {
    15
}

fn default_query_delay_ms() -> u64 {
    1000
}

fn default_request_budget_secs() -> u64 {
    45
}

fn default_true() -> bool {
    true
}

/// Academic source settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Per-call timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Results requested from each source per query
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Source ids to query
    #[serde(default = "default_enabled_sources")]
    pub enabled: Vec<String>,

    /// Contact address for the OpenAlex polite pool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mailto: Option<String>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_results: default_max_results(),
            enabled: default_enabled_sources(),
            mailto: None,
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_results() -> usize {
    crate::models::DEFAULT_MAX_RESULTS
}

fn default_enabled_sources() -> Vec<String> {
    crate::sources::SOURCE_ORDER
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `json` selects structured output; anything else is plain text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Load configuration from a file (if any) plus environment overrides.
///
/// With no explicit path, [`find_config_file`] is consulted; with nothing
/// found, defaults and the environment apply.
pub fn load_config(path: Option<&Path>) -> Result<Config, config::ConfigError> {
    let mut builder = config::Config::builder();

    match path {
        Some(path) => {
            builder = builder.add_source(config::File::from(path));
        }
        None => {
            if let Some(found) = find_config_file() {
                tracing::debug!("Using config file {}", found.display());
                builder = builder.add_source(config::File::from(found.as_path()).required(false));
            }
        }
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("sources.enabled")
                .with_list_parse_key("extraction.extra_patterns"),
        )
        .build()?;

    settings.try_deserialize()
}

/// Find the config file: working directory first, then the user config dir
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("cite-scout").join("config.toml"))
        .filter(|p| p.is_file())
}
