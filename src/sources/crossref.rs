//! CrossRef research source implementation.

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

use crate::models::{RelatedPaper, RelatedPaperBuilder, SearchQuery, SourceType};
use crate::sources::{
    collapse_whitespace, fetch_body, query_rng, truncate_abstract, SimilarityPrior, Source,
    SourceError,
};
use crate::utils::HttpClient;

const CROSSREF_API_BASE: &str = "https://api.crossref.org";

const CROSSREF_PRIOR: SimilarityPrior = SimilarityPrior::new(0.6, 0.4);

/// CrossRef research source
///
/// Uses the CrossRef REST API `works` endpoint.
#[derive(Debug, Clone)]
pub struct CrossRefSource {
    client: HttpClient,
    base_url: String,
}

impl CrossRefSource {
    /// Create a new CrossRef source
    pub fn new(client: HttpClient) -> Self {
        Self::with_base_url(client, CROSSREF_API_BASE)
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
            "{}/works?query={}&rows={}",
            self.base_url,
            urlencoding::encode(query.query.trim()),
            query.max_results
        )
    }

    /// Parse CrossRef work data
    fn parse_item(item: &CRItem) -> RelatedPaper {
        let title = item
            .title
            .as_ref()
            .and_then(|t| t.first())
            .map(|t| collapse_whitespace(t))
            .unwrap_or_default();

        let authors = item.author.iter().flatten().map(|a| {
            let given = a.given.as_deref().unwrap_or("");
            let family = a.family.as_deref().unwrap_or("");
            format!("{} {}", given, family).trim().to_string()
        });

        let year = item
            .published
            .as_ref()
            .and_then(|p| p.date_parts.first())
            .and_then(|parts| parts.first().copied().flatten());

        let url = match (&item.url, &item.doi) {
            (Some(url), _) => url.clone(),
            (None, Some(doi)) => format!("https://doi.org/{}", doi),
            (None, None) => String::new(),
        };

        let abstract_text = item
            .r#abstract
            .as_deref()
            .map(strip_markup)
            .map(|a| truncate_abstract(&a))
            .unwrap_or_default();

        RelatedPaperBuilder::new(
            item.doi.clone().unwrap_or_default(),
            title,
            url,
            SourceType::CrossRef,
        )
        .authors(authors)
        .abstract_text(abstract_text)
        .year(year)
        .doi(item.doi.clone())
        .build()
    }

    fn parse_response(body: &str, query: &SearchQuery) -> Result<Vec<RelatedPaper>, SourceError> {
        let data: CRResponse = serde_json::from_str(body)?;
        let mut rng = query_rng(query.seed, "crossref", &query.query);

        Ok(data
            .message
            .items
            .iter()
            .take(query.max_results)
            .map(|item| {
                let mut paper = Self::parse_item(item);
                paper.similarity = CROSSREF_PRIOR.score(&mut rng);
                paper
            })
            .collect())
    }
}

const MARKUP_PATTERN: &str = r"<[^>]+>";

/// Drop JATS/XML tags from an abstract
fn strip_markup(text: &str) -> String {
    static TAGS: OnceLock<Regex> = OnceLock::new();
    let tags = TAGS.get_or_init(|| Regex::new(MARKUP_PATTERN).expect("markup pattern is a valid regex"));
    collapse_whitespace(&tags.replace_all(text, " "))
}

#[async_trait]
impl Source for CrossRefSource {
    fn id(&self) -> &str {
        "crossref"
    }

    fn name(&self) -> &str {
        "CrossRef"
    }

    fn source_type(&self) -> SourceType {
        SourceType::CrossRef
    }

    fn similarity_prior(&self) -> SimilarityPrior {
        CROSSREF_PRIOR
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<RelatedPaper>, SourceError> {
        if query.query.trim().is_empty() {
            return Err(SourceError::InvalidRequest("Empty query".to_string()));
        }
        let body = fetch_body(&self.client, &self.build_url(query), self.name()).await?;
        Self::parse_response(&body, query)
    }
}

// ===== CrossRef API Types =====

#[derive(Debug, Deserialize)]
struct CRResponse {
    message: CRMessage,
}

#[derive(Debug, Deserialize)]
struct CRMessage {
    #[serde(default)]
    items: Vec<CRItem>,
}

#[derive(Debug, Deserialize)]
struct CRItem {
    #[serde(rename = "DOI")]
    doi: Option<String>,
    #[serde(rename = "URL")]
    url: Option<String>,
    title: Option<Vec<String>>,
    author: Option<Vec<CRAuthor>>,
    published: Option<CRDate>,
    r#abstract: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CRAuthor {
    given: Option<String>,
    family: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CRDate {
    #[serde(rename = "date-parts", default)]
    date_parts: Vec<Vec<Option<i32>>>,
}
