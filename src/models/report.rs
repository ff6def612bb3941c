//! Pipeline output handed back to the caller.

use serde::{Deserialize, Serialize};

use super::{Citation, RelatedPaper};

/// Result of analyzing one document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub citations: Vec<Citation>,

    pub related_papers: Vec<RelatedPaper>,

    /// Length of the analyzed text in characters
    pub text_length: usize,

    /// Page count when the text came from a PDF
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<usize>,

    /// Topic phrases flagged as needing support
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub statements_found: Vec<String>,

    pub existing_citations_count: usize,

    pub discovered_citations_count: usize,
}

impl AnalysisReport {
    pub fn new(
        citations: Vec<Citation>,
        related_papers: Vec<RelatedPaper>,
        text_length: usize,
        pages: Option<usize>,
        statements_found: Vec<String>,
    ) -> Self {
        Self {
            existing_citations_count: citations.len(),
            discovered_citations_count: related_papers.len(),
            citations,
            related_papers,
            text_length,
            pages,
            statements_found,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_follow_contents() {
        let report = AnalysisReport::new(Vec::new(), Vec::new(), 42, Some(2), vec!["topic".into()]);
        assert_eq!(report.existing_citations_count, 0);
        assert_eq!(report.discovered_citations_count, 0);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["textLength"], 42);
        assert_eq!(json["pages"], 2);
        assert_eq!(json["statementsFound"][0], "topic");
    }
}
