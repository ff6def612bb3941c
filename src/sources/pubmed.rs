//! PubMed research source implementation using E-utilities API.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

use crate::models::{RelatedPaper, RelatedPaperBuilder, SearchQuery, SourceType};
use crate::sources::{
    collapse_whitespace, fetch_body, query_rng, truncate_abstract, SimilarityPrior, Source,
    SourceError,
};
use crate::utils::HttpClient;

const PUBMED_EUTILS_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
const PUBMED_ARTICLE_URL: &str = "https://pubmed.ncbi.nlm.nih.gov";

const PUBMED_PRIOR: SimilarityPrior = SimilarityPrior::new(0.5, 0.5);

/// PubMed research source
///
/// Searches with `esearch` for PMIDs, then resolves them with `esummary`.
#[derive(Debug, Clone)]
pub struct PubMedSource {
    client: HttpClient,
    base_url: String,
}

impl PubMedSource {
    /// Create a new PubMed source
    pub fn new(client: HttpClient) -> Self {
        Self::with_base_url(client, PUBMED_EUTILS_BASE)
    }

    /// Create against a different E-utilities endpoint (for testing)
    pub fn with_base_url(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn build_search_url(&self, query: &SearchQuery) -> String {
        format!(
            "{}/esearch.fcgi?db=pubmed&term={}&retmax={}&retmode=json",
            self.base_url,
            urlencoding::encode(query.query.trim()),
            query.max_results
        )
    }

    fn build_summary_url(&self, ids: &[String]) -> String {
        format!(
            "{}/esummary.fcgi?db=pubmed&id={}&retmode=json",
            self.base_url,
            ids.join(",")
        )
    }

    /// Parse search response to get PMIDs
    fn parse_search_response(body: &str) -> Result<Vec<String>, SourceError> {
        #[derive(Debug, Deserialize)]
        struct ESearchResponse {
            esearchresult: ESearchResult,
        }

        #[derive(Debug, Deserialize)]
        struct ESearchResult {
            #[serde(default)]
            idlist: Vec<String>,
        }

        let data: ESearchResponse = serde_json::from_str(body)?;
        Ok(data.esearchresult.idlist)
    }

    /// Parse summary response, keeping the PMID order of the search
    fn parse_summary_response(
        body: &str,
        ids: &[String],
        query: &SearchQuery,
    ) -> Result<Vec<RelatedPaper>, SourceError> {
        #[derive(Debug, Deserialize)]
        struct ESummaryResponse {
            #[serde(default)]
            result: HashMap<String, serde_json::Value>,
        }

        #[derive(Debug, Deserialize)]
        struct DocSummary {
            #[serde(default)]
            title: String,
            #[serde(default)]
            authors: Vec<Author>,
            #[serde(default)]
            pubdate: String,
            #[serde(default)]
            r#abstract: Option<String>,
        }

        #[derive(Debug, Deserialize)]
        struct Author {
            #[serde(default)]
            name: String,
        }

        let data: ESummaryResponse = serde_json::from_str(body)?;
        let mut rng = query_rng(query.seed, "pubmed", &query.query);

        let mut papers = Vec::with_capacity(ids.len());
        for uid in ids {
            let Some(record) = data.result.get(uid) else {
                tracing::debug!("PubMed summary missing uid {}", uid);
                continue;
            };
            let doc: DocSummary = match serde_json::from_value(record.clone()) {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::debug!("Skipping malformed PubMed record {}: {}", uid, e);
                    continue;
                }
            };

            let abstract_text = doc
                .r#abstract
                .as_deref()
                .map(|a| truncate_abstract(&collapse_whitespace(a)))
                .unwrap_or_default();

            let mut paper = RelatedPaperBuilder::new(
                uid.clone(),
                collapse_whitespace(&doc.title),
                format!("{}/{}/", PUBMED_ARTICLE_URL, uid),
                SourceType::PubMed,
            )
            .authors(doc.authors.into_iter().map(|a| a.name))
            .abstract_text(abstract_text)
            .year(year_from_pubdate(&doc.pubdate))
            .build();
            paper.similarity = PUBMED_PRIOR.score(&mut rng);
            papers.push(paper);
        }

        Ok(papers)
    }
}

/// Year from a PubMed `pubdate` such as `2021 Mar 15`
fn year_from_pubdate(pubdate: &str) -> Option<i32> {
    pubdate.get(..4).and_then(|y| y.parse().ok())
}

#[async_trait]
impl Source for PubMedSource {
    fn id(&self) -> &str {
        "pubmed"
    }

    fn name(&self) -> &str {
        "PubMed"
    }

    fn source_type(&self) -> SourceType {
        SourceType::PubMed
    }

    fn similarity_prior(&self) -> SimilarityPrior {
        PUBMED_PRIOR
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<RelatedPaper>, SourceError> {
        if query.query.trim().is_empty() {
            return Err(SourceError::InvalidRequest("Empty query".to_string()));
        }

        let body = fetch_body(&self.client, &self.build_search_url(query), self.name()).await?;
        let mut ids = Self::parse_search_response(&body)?;
        ids.truncate(query.max_results);

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let body = fetch_body(&self.client, &self.build_summary_url(&ids), self.name()).await?;
        Self::parse_summary_response(&body, &ids, query)
    }
}
