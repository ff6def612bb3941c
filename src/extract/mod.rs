//! Citation and statement extraction from raw document text.
//!
//! - [`PatternMatcher`]: ordered citation-shape patterns (APA, MLA, Chicago,
//!   parenthetical author-year, et al.)
//! - [`CitationNormalizer`]: author/year/title fields and confidence for a match
//! - [`CitationExtractor`]: both of the above, producing ranked [`Citation`]s
//! - [`StatementExtractor`]: keyword-based claim detection, independent of citations
//!
//! Extraction is synchronous, CPU-only and deterministic: the same text always
//! yields the same citations and statements.

mod normalize;
mod patterns;
mod statements;

pub use normalize::{confidence_for, CitationNormalizer, NormalizedFields};
pub use patterns::{CitationPattern, PatternMatcher};
pub use statements::{StatementExtractor, DEFAULT_MAX_STATEMENTS};

use crate::models::{Citation, ExtractionMode};

/// Errors raised while building extractors
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// A pattern failed to compile. This is a configuration bug and is
    /// reported when the extractor is built, never per document.
    #[error("Invalid {style} pattern #{index}: {source}")]
    Pattern {
        index: usize,
        style: String,
        source: regex::Error,
    },
}

/// Pattern matching plus normalization
#[derive(Debug, Clone)]
pub struct CitationExtractor {
    matcher: PatternMatcher,
    normalizer: CitationNormalizer,
}

impl CitationExtractor {
    /// Extractor with built-in patterns
    pub fn new() -> Result<Self, ExtractError> {
        Self::with_extra_patterns(&[])
    }

    /// Extractor with built-in patterns followed by `extra`
    pub fn with_extra_patterns(extra: &[String]) -> Result<Self, ExtractError> {
        Ok(Self {
            matcher: PatternMatcher::with_extra_patterns(extra)?,
            normalizer: CitationNormalizer::new()?,
        })
    }

    pub fn matcher(&self) -> &PatternMatcher {
        &self.matcher
    }

    /// Extract citations, highest confidence first.
    ///
    /// Equal confidences keep the order in which their matches were found.
    /// Ids are assigned after sorting (`c1`, `c2`, ...).
    pub fn extract(&self, text: &str, mode: ExtractionMode) -> Vec<Citation> {
        let mut citations: Vec<Citation> = self
            .matcher
            .find_matches(text)
            .into_iter()
            .map(|raw| {
                let fields = self.normalizer.normalize(&raw.text, mode);
                Citation {
                    id: String::new(),
                    text: raw.text,
                    authors: fields.authors,
                    year: fields.year,
                    title: fields.title,
                    confidence: fields.confidence,
                }
            })
            .collect();

        citations.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        for (i, citation) in citations.iter_mut().enumerate() {
            citation.id = format!("c{}", i + 1);
        }
        citations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_sorts_by_confidence_with_stable_ties() {
        let text = "As argued (Jones, 2019) and (Lee, 2018), see Smith, J. (2020). Deep learning methods.";
        let citations = CitationExtractor::new().unwrap().extract(text, ExtractionMode::Text);

        assert_eq!(citations.len(), 3);
        assert!(citations[0].text.starts_with("Smith, J. (2020)"));
        assert_eq!(citations[1].text, "(Jones, 2019)");
        assert_eq!(citations[2].text, "(Lee, 2018)");
        let ids: Vec<_> = citations.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);
    }

    #[test]
    fn test_extract_is_idempotent() {
        let text = "Smith et al. (2020) and (Jones, 2019) disagree.";
        let extractor = CitationExtractor::new().unwrap();
        let first = extractor.extract(text, ExtractionMode::Pdf);
        let second = extractor.extract(text, ExtractionMode::Pdf);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_extract_empty_text() {
        let citations = CitationExtractor::new().unwrap().extract("", ExtractionMode::Text);
        assert!(citations.is_empty());
    }

    #[test]
    fn test_error_message_names_pattern() {
        let err = CitationExtractor::with_extra_patterns(&["(".to_string()]).unwrap_err();
        assert!(err.to_string().contains("custom-1"));
    }
}
