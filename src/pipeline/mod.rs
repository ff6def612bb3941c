//! End-to-end analysis: document in, report out.
//!
//! A [`Pipeline`] is built once per process and then serves any number of
//! independent requests. It keeps no per-request state: analyzing the same
//! document twice runs the same extraction and sends the same queries.

mod document;

pub use document::{Document, MAX_FILE_BYTES};

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::aggregate::{Aggregator, AggregatorSettings, QueryTarget};
use crate::config::Config;
use crate::extract::{CitationExtractor, ExtractError, StatementExtractor};
use crate::models::{AnalysisReport, Citation, Statement};
use crate::sources::{SourceError, SourceRegistry};
use crate::utils::{PdfExtractError, Sleeper, TokioSleeper};

/// Errors returned to the caller of the pipeline
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("No text to analyze")]
    EmptyInput,

    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    #[error("File too large: {size} bytes (limit {limit})")]
    FileTooLarge { size: u64, limit: u64 },

    #[error(transparent)]
    Pdf(#[from] PdfExtractError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Extractor construction failed (bad pattern in configuration)
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// Source setup failed
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Extraction blew up on this input
    #[error("Internal error during extraction: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Whether the caller sent something unusable (4xx) rather than the
    /// pipeline failing (5xx)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PipelineError::EmptyInput
                | PipelineError::UnsupportedInput(_)
                | PipelineError::FileTooLarge { .. }
                | PipelineError::Pdf(_)
        )
    }
}

/// Output of the extraction stage
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub citations: Vec<Citation>,
    pub statements: Vec<Statement>,
}

/// Citation extraction, statement detection and source aggregation
#[derive(Debug, Clone)]
pub struct Pipeline {
    citations: CitationExtractor,
    statements: StatementExtractor,
    aggregator: Aggregator,
    query_statements: bool,
}

impl Pipeline {
    /// Build a pipeline over the given sources.
    ///
    /// Every configured pattern is compiled here, so a bad pattern fails at
    /// startup instead of on some later request.
    pub fn new(
        config: &Config,
        sources: Arc<SourceRegistry>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self, PipelineError> {
        let citations = CitationExtractor::with_extra_patterns(&config.extraction.extra_patterns)?;
        let statements = StatementExtractor::new(config.extraction.max_statements)?;
        let aggregator = Aggregator::new(sources, AggregatorSettings::from(config), sleeper);

        tracing::debug!(
            "Pipeline ready: {} citation patterns, sources {:?}",
            citations.matcher().len(),
            aggregator.sources().ids().collect::<Vec<_>>()
        );

        Ok(Self {
            citations,
            statements,
            aggregator,
            query_statements: config.aggregation.query_statements_when_no_citations,
        })
    }

    /// Build a pipeline with the sources enabled in `config` and real sleeps
    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        let registry = SourceRegistry::from_config(&config.sources)?;
        Self::new(config, Arc::new(registry), Arc::new(TokioSleeper))
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Run citation and statement extraction only (no network)
    pub fn extract(&self, document: &Document) -> Result<Extraction, PipelineError> {
        let run = catch_unwind(AssertUnwindSafe(|| Extraction {
            citations: self.citations.extract(&document.text, document.mode),
            statements: self.statements.extract(&document.text),
        }));

        run.map_err(|panic| {
            let detail = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!("Extraction panicked: {}", detail);
            PipelineError::Internal(detail)
        })
    }

    /// Analyze a document, seeding similarity jitter from its text
    pub async fn analyze(&self, document: &Document) -> Result<AnalysisReport, PipelineError> {
        self.analyze_with_seed(document, seed_for(&document.text)).await
    }

    /// Analyze a document with an explicit jitter seed
    pub async fn analyze_with_seed(
        &self,
        document: &Document,
        seed: u64,
    ) -> Result<AnalysisReport, PipelineError> {
        let Extraction {
            citations,
            statements,
        } = self.extract(document)?;

        tracing::info!(
            "Extracted {} citations and {} statements from {} chars",
            citations.len(),
            statements.len(),
            document.text_length()
        );

        let targets: Vec<QueryTarget> = if !citations.is_empty() {
            citations.iter().map(QueryTarget::from_citation).collect()
        } else if self.query_statements {
            statements.iter().map(QueryTarget::from_statement).collect()
        } else {
            Vec::new()
        };

        let related = self.aggregator.aggregate_targets(&targets, seed).await;
        let topics = statements.into_iter().map(|s| s.text).collect();

        Ok(AnalysisReport::new(
            citations,
            related,
            document.text_length(),
            document.pages,
            topics,
        ))
    }
}

/// Default request seed: a hash of the input text
pub fn seed_for(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}
