//! OpenAlex research source implementation.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

use crate::models::{RelatedPaper, RelatedPaperBuilder, SearchQuery, SourceType};
use crate::sources::{
    collapse_whitespace, fetch_body, query_rng, truncate_abstract, SimilarityPrior, Source,
    SourceError,
};
use crate::utils::HttpClient;

const OPENALEX_API_BASE: &str = "https://api.openalex.org";

const OPENALEX_PRIOR: SimilarityPrior = SimilarityPrior::new(0.7, 0.3);

/// OpenAlex research source
///
/// Uses the OpenAlex REST API.
#[derive(Debug, Clone)]
pub struct OpenAlexSource {
    client: HttpClient,
    base_url: String,
    email: Option<String>,
}

impl OpenAlexSource {
    /// Create a new OpenAlex source
    pub fn new(client: HttpClient) -> Self {
        Self::with_base_url(client, OPENALEX_API_BASE)
    }

    /// Create against a different endpoint (for testing)
    pub fn with_base_url(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            email: None,
        }
    }

    /// Set an email (recommended for better rate limits)
    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email.filter(|e| !e.trim().is_empty());
        self
    }

    fn build_url(&self, query: &SearchQuery) -> String {
        let url = format!(
            "{}/works?search={}&per_page={}",
            self.base_url,
            urlencoding::encode(query.query.trim()),
            query.max_results
        );
        // Polite pool
        match self.email {
            Some(ref email) => format!("{}&mailto={}", url, urlencoding::encode(email)),
            None => url,
        }
    }

    /// Parse OpenAlex paper data
    fn parse_paper(data: &OAWork) -> RelatedPaper {
        let authors = data
            .authorships
            .iter()
            .filter_map(|a| a.author.as_ref())
            .filter_map(|author| author.display_name.clone());

        let id = data
            .id
            .clone()
            .or_else(|| data.doi.clone())
            .unwrap_or_default();

        let url = data
            .doi
            .clone()
            .or_else(|| data.id.clone())
            .unwrap_or_default();

        let doi = data
            .doi
            .as_deref()
            .map(|d| d.trim_start_matches("https://doi.org/").to_string());

        let abstract_text = data
            .abstract_inverted_index
            .as_ref()
            .map(rebuild_abstract)
            .map(|a| truncate_abstract(&a))
            .unwrap_or_default();

        let title = data.title.as_deref().map(collapse_whitespace).unwrap_or_default();

        RelatedPaperBuilder::new(id, title, url, SourceType::OpenAlex)
            .authors(authors)
            .abstract_text(abstract_text)
            .year(data.publication_year)
            .doi(doi)
            .build()
    }

    fn parse_response(body: &str, query: &SearchQuery) -> Result<Vec<RelatedPaper>, SourceError> {
        let data: WorksResponse = serde_json::from_str(body)?;
        let mut rng = query_rng(query.seed, "openalex", &query.query);

        Ok(data
            .results
            .iter()
            .take(query.max_results)
            .map(|work| {
                let mut paper = Self::parse_paper(work);
                paper.similarity = OPENALEX_PRIOR.score(&mut rng);
                paper
            })
            .collect())
    }
}

/// Rebuild an abstract from OpenAlex's `word -> [positions]` index, in position order
fn rebuild_abstract(index: &HashMap<String, Vec<usize>>) -> String {
    let mut positioned: Vec<(usize, &str)> = index
        .iter()
        .flat_map(|(word, positions)| positions.iter().map(move |&p| (p, word.as_str())))
        .collect();
    positioned.sort_by_key(|&(p, _)| p);
    positioned
        .into_iter()
        .map(|(_, w)| w)
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl Source for OpenAlexSource {
    fn id(&self) -> &str {
        "openalex"
    }

    fn name(&self) -> &str {
        "OpenAlex"
    }

    fn source_type(&self) -> SourceType {
        SourceType::OpenAlex
    }

    fn similarity_prior(&self) -> SimilarityPrior {
        OPENALEX_PRIOR
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<RelatedPaper>, SourceError> {
        if query.query.trim().is_empty() {
            return Err(SourceError::InvalidRequest("Empty query".to_string()));
        }
        let body = fetch_body(&self.client, &self.build_url(query), self.name()).await?;
        Self::parse_response(&body, query)
    }
}

// ===== OpenAlex API Types =====

#[derive(Debug, Deserialize)]
struct WorksResponse {
    #[serde(default)]
    results: Vec<OAWork>,
}

#[derive(Debug, Deserialize)]
struct OAWork {
    id: Option<String>,
    title: Option<String>,
    #[serde(default)]
    authorships: Vec<OAAuthorship>,
    publication_year: Option<i32>,
    abstract_inverted_index: Option<HashMap<String, Vec<usize>>>,
    doi: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OAAuthorship {
    #[serde(default)]
    author: Option<OAAuthor>,
}

#[derive(Debug, Deserialize)]
struct OAAuthor {
    display_name: Option<String>,
}
