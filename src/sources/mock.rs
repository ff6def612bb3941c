//! Mock source for testing purposes.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::models::{RelatedPaper, RelatedPaperBuilder, SearchQuery, SourceType};
use crate::sources::{SimilarityPrior, Source, SourceError};

type Responder = dyn Fn(&SearchQuery) -> Vec<RelatedPaper> + Send + Sync;

/// A mock source for testing that returns predefined responses.
///
/// It can also fail every call or sleep before answering, which makes it the
/// stand-in for a provider that is down or hangs.
pub struct MockSource {
    id: String,
    source_type: SourceType,
    prior: SimilarityPrior,
    papers: Mutex<Vec<RelatedPaper>>,
    responder: Option<Arc<Responder>>,
    error: Option<String>,
    delay: Option<Duration>,
    queries: Mutex<Vec<String>>,
}

impl std::fmt::Debug for MockSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSource")
            .field("id", &self.id)
            .field("error", &self.error)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl MockSource {
    /// Create a new mock source that returns no papers.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            source_type: SourceType::Other(id.clone()),
            id,
            prior: SimilarityPrior::new(0.5, 0.5),
            papers: Mutex::new(Vec::new()),
            responder: None,
            error: None,
            delay: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Return these papers for every query.
    pub fn with_papers(self, papers: Vec<RelatedPaper>) -> Self {
        self.set_papers(papers);
        self
    }

    /// Build the response from the query instead of a fixed list.
    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&SearchQuery) -> Vec<RelatedPaper> + Send + Sync + 'static,
    {
        self.responder = Some(Arc::new(responder));
        self
    }

    /// Fail every search with an API error.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_source_type(mut self, source_type: SourceType) -> Self {
        self.source_type = source_type;
        self
    }

    pub fn with_prior(mut self, prior: SimilarityPrior) -> Self {
        self.prior = prior;
        self
    }

    /// Replace the fixed response.
    pub fn set_papers(&self, papers: Vec<RelatedPaper>) {
        let mut guard = self.papers.lock().unwrap_or_else(|e| e.into_inner());
        *guard = papers;
    }

    /// Queries received so far, in call order.
    pub fn queries(&self) -> Vec<String> {
        self.queries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.queries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl Source for MockSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.id
    }

    fn source_type(&self) -> SourceType {
        self.source_type.clone()
    }

    fn similarity_prior(&self) -> SimilarityPrior {
        self.prior
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<RelatedPaper>, SourceError> {
        self.queries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(query.query.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(ref message) = self.error {
            return Err(SourceError::Api(message.clone()));
        }

        let mut papers = match self.responder {
            Some(ref responder) => responder(query),
            None => self.papers.lock().unwrap_or_else(|e| e.into_inner()).clone(),
        };
        papers.truncate(query.max_results);
        Ok(papers)
    }
}

/// Helper function to create a mock paper for testing.
pub fn make_paper(paper_id: &str, title: &str, source: SourceType, similarity: f64) -> RelatedPaper {
    RelatedPaperBuilder::new(
        paper_id,
        title,
        format!("http://example.com/{}", paper_id),
        source,
    )
    .similarity(similarity)
    .build()
}
