//! Academic source adapters behind a common trait.
//!
//! This module defines the [`Source`] trait that every academic metadata API
//! implements. Each adapter turns a free-text query into a list of
//! [`RelatedPaper`]s through its own request/response contract.
//!
//! # Feature Flags
//!
//! Individual sources can be disabled at compile time using Cargo features:
//!
//! - `arxiv` - Enable arXiv source (default: enabled)
//! - `openalex` - Enable OpenAlex source (default: enabled)
//! - `crossref` - Enable CrossRef source (default: enabled)
//! - `pubmed` - Enable PubMed source (default: enabled)
//!
//! # Runtime Source Configuration
//!
//! The `[sources] enabled` list in the configuration file (or the
//! `CITE_SCOUT__SOURCES__ENABLED` environment variable) selects which of the
//! compiled-in sources are queried.
//!
//! # Similarity
//!
//! Sources do not compute textual relevance. Each declares a
//! [`SimilarityPrior`] (a trust base plus a jitter range) and scores its
//! results with a generator seeded from the request, so identical requests
//! against identical responses score identically.

#[cfg(feature = "source-arxiv")]
mod arxiv;
#[cfg(feature = "source-crossref")]
mod crossref;
#[cfg(feature = "source-openalex")]
mod openalex;
#[cfg(feature = "source-pubmed")]
mod pubmed;
mod registry;

pub mod mock;

#[cfg(feature = "source-arxiv")]
pub use arxiv::ArxivSource;
#[cfg(feature = "source-crossref")]
pub use crossref::CrossRefSource;
#[cfg(feature = "source-openalex")]
pub use openalex::OpenAlexSource;
#[cfg(feature = "source-pubmed")]
pub use pubmed::PubMedSource;

pub use mock::MockSource;
pub use registry::{SourceRegistry, SOURCE_ORDER};

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::models::{RelatedPaper, SearchQuery, SourceType};
use crate::utils::HttpClient;

/// Abstracts longer than this many characters are truncated
pub const ABSTRACT_MAX_CHARS: usize = 200;

/// The Source trait defines the interface for all academic source adapters.
///
/// # Implementing a New Source
///
/// 1. Create a struct that implements `Source`
/// 2. Map the provider payload onto [`RelatedPaper`] with
///    [`crate::models::RelatedPaperBuilder`], which applies the literal fallbacks
/// 3. Score results with [`SimilarityPrior::score`] using [`query_rng`]
/// 4. Register it with [`SourceRegistry::register`]
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source (e.g., "arxiv", "pubmed")
    fn id(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Source type stamped on every returned paper
    fn source_type(&self) -> SourceType;

    /// Trust prior used to score results from this source
    fn similarity_prior(&self) -> SimilarityPrior;

    /// Search for papers matching the query, in the provider's own ranking order
    async fn search(&self, query: &SearchQuery) -> Result<Vec<RelatedPaper>, SourceError>;
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// The call did not finish within its deadline
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Non-success HTTP status
    #[error("{provider} API returned status: {status}")]
    Status { provider: String, status: u16 },

    /// Parsing error (XML, JSON)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// API error from the source
    #[error("API error: {0}")]
    Api(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout(err.to_string())
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

/// Provider trust prior: scores fall in `[base, base + range]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityPrior {
    pub base: f64,
    pub range: f64,
}

impl SimilarityPrior {
    pub const fn new(base: f64, range: f64) -> Self {
        Self { base, range }
    }

    /// Draw a score, clamped to `[0, 1]`
    pub fn score<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let jitter: f64 = rng.gen();
        (self.base + jitter * self.range).clamp(0.0, 1.0)
    }

    /// Whether `value` is a score this prior can produce
    pub fn contains(&self, value: f64) -> bool {
        value >= self.base && value <= (self.base + self.range).min(1.0)
    }
}

/// Generator for one source's scores on one query.
///
/// Derived from the request seed, the source id and the query text so that
/// concurrent sources never share state.
pub fn query_rng(seed: u64, source_id: &str, query: &str) -> StdRng {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    source_id.hash(&mut hasher);
    query.hash(&mut hasher);
    StdRng::seed_from_u64(hasher.finish())
}

/// Cut `text` to [`ABSTRACT_MAX_CHARS`] characters, marking the cut with `...`
pub fn truncate_abstract(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= ABSTRACT_MAX_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(ABSTRACT_MAX_CHARS).collect();
    format!("{}...", cut.trim_end())
}

/// Collapse runs of whitespace (including newlines) to single spaces
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// GET `url` and return the body of a successful response
pub(crate) async fn fetch_body(
    client: &HttpClient,
    url: &str,
    provider: &str,
) -> Result<String, SourceError> {
    tracing::debug!("{} request: {}", provider, url);

    let response = client
        .get(url)
        .timeout(client.timeout())
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                SourceError::Timeout(format!("{} request timed out", provider))
            } else {
                SourceError::Network(format!("Failed to reach {}: {}", provider, e))
            }
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status {
            provider: provider.to_string(),
            status: status.as_u16(),
        });
    }

    response
        .text()
        .await
        .map_err(|e| SourceError::Network(format!("Failed to read {} response: {}", provider, e)))
}
