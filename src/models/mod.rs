//! Core data models for extracted citations, searches and related papers.

mod citation;
mod paper;
mod report;
mod search;

pub use citation::{Citation, CitationStyle, ExtractionMode, RawMatch, Statement};
pub use paper::{
    RelatedPaper, RelatedPaperBuilder, SourceType, NO_ABSTRACT, UNKNOWN_AUTHOR, UNTITLED,
};
pub use report::AnalysisReport;
pub use search::{SearchQuery, DEFAULT_MAX_RESULTS};
