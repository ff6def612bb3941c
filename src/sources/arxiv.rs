//! arXiv source implementation.

use async_trait::async_trait;
use chrono::Datelike;
use feed_rs::parser;

use crate::models::{RelatedPaper, RelatedPaperBuilder, SearchQuery, SourceType};
use crate::sources::{
    collapse_whitespace, fetch_body, query_rng, truncate_abstract, SimilarityPrior, Source,
    SourceError,
};
use crate::utils::HttpClient;

/// Base URL for arXiv API
const ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";

const ARXIV_PRIOR: SimilarityPrior = SimilarityPrior::new(0.8, 0.2);

/// arXiv source
///
/// Queries the Atom API with an exact-phrase `all:` search.
#[derive(Debug, Clone)]
pub struct ArxivSource {
    client: HttpClient,
    base_url: String,
}

impl ArxivSource {
    /// Create a new arXiv source
    pub fn new(client: HttpClient) -> Self {
        Self::with_base_url(client, ARXIV_API_URL)
    }

    /// Create against a different endpoint (for testing)
    pub fn with_base_url(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn build_url(&self, query: &SearchQuery) -> String {
        format!(
            "{}?search_query=all:%22{}%22&max_results={}",
            self.base_url,
            urlencoding::encode(query.query.trim()),
            query.max_results
        )
    }

    /// Parse an Atom feed into papers.
    ///
    /// Entries without a title are skipped; a document that is not a feed at
    /// all is a parse error.
    fn parse_feed(xml: &str, query: &SearchQuery) -> Result<Vec<RelatedPaper>, SourceError> {
        let feed = parser::parse(xml.as_bytes())
            .map_err(|e| SourceError::Parse(format!("Failed to parse Atom feed: {}", e)))?;

        let mut rng = query_rng(query.seed, "arxiv", &query.query);

        let papers = feed
            .entries
            .iter()
            .filter_map(|entry| {
                let title = entry
                    .title
                    .as_ref()
                    .map(|t| collapse_whitespace(&t.content))
                    .filter(|t| !t.is_empty());
                let Some(title) = title else {
                    tracing::debug!("Skipping arXiv entry without title: {}", entry.id);
                    return None;
                };

                let summary = entry
                    .summary
                    .as_ref()
                    .map(|s| truncate_abstract(&collapse_whitespace(&s.content)))
                    .unwrap_or_default();

                Some(
                    RelatedPaperBuilder::new(entry.id.clone(), title, entry.id.clone(), SourceType::Arxiv)
                        .authors(entry.authors.iter().map(|a| a.name.clone()))
                        .abstract_text(summary)
                        .year(entry.published.map(|d| d.year()))
                        .build(),
                )
            })
            .take(query.max_results)
            .map(|mut paper| {
                paper.similarity = ARXIV_PRIOR.score(&mut rng);
                paper
            })
            .collect();

        Ok(papers)
    }
}

#[async_trait]
impl Source for ArxivSource {
    fn id(&self) -> &str {
        "arxiv"
    }

    fn name(&self) -> &str {
        "arXiv"
    }

    fn source_type(&self) -> SourceType {
        SourceType::Arxiv
    }

    fn similarity_prior(&self) -> SimilarityPrior {
        ARXIV_PRIOR
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<RelatedPaper>, SourceError> {
        if query.query.trim().is_empty() {
            return Err(SourceError::InvalidRequest("Empty query".to_string()));
        }
        let body = fetch_body(&self.client, &self.build_url(query), self.name()).await?;
        Self::parse_feed(&body, query)
    }
}
