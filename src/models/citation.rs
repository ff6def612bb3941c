//! Citation and statement models produced by the extraction stage.

use serde::{Deserialize, Serialize};

/// Which ingestion path produced the text being analyzed.
///
/// The mode only affects the starting confidence of extracted citations:
/// text recovered from a PDF is noisier than text pasted directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    Pdf,
    Text,
}

impl ExtractionMode {
    /// Base confidence in hundredths
    pub fn base_confidence(&self) -> u32 {
        match self {
            ExtractionMode::Pdf => 50,
            ExtractionMode::Text => 70,
        }
    }
}

/// Bibliographic shape a pattern recognizes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationStyle {
    Apa,
    Mla,
    Chicago,
    Parenthetical,
    EtAl,
    #[serde(untagged)]
    Custom(String),
}

impl CitationStyle {
    pub fn name(&self) -> &str {
        match self {
            CitationStyle::Apa => "APA",
            CitationStyle::Mla => "MLA",
            CitationStyle::Chicago => "Chicago",
            CitationStyle::Parenthetical => "parenthetical",
            CitationStyle::EtAl => "et al.",
            CitationStyle::Custom(s) => s,
        }
    }
}

impl std::fmt::Display for CitationStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A raw pattern hit before normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMatch {
    /// Matched text, trimmed
    pub text: String,
    /// Index of the pattern that produced this match
    pub pattern_index: usize,
    /// Style of that pattern
    pub style: CitationStyle,
}

/// A text span recognized as a bibliographic reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    pub id: String,

    /// The matched text exactly as it appears in the document
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Always within `[0, 1]`
    pub confidence: f64,
}

impl Citation {
    /// Query string used to look this citation up in external sources:
    /// title, else authors, else the first 100 characters of the raw text.
    pub fn query_string(&self) -> String {
        if let Some(title) = self.title.as_deref().filter(|t| !t.trim().is_empty()) {
            return title.trim().to_string();
        }
        if let Some(authors) = self.authors.as_deref().filter(|a| !a.trim().is_empty()) {
            return authors.trim().to_string();
        }
        self.text.chars().take(100).collect()
    }
}

/// A span of source text believed to need academic support
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statement {
    pub text: String,

    /// Byte offset of the first character of the span in the source document
    pub start_index: usize,

    /// Byte offset one past the last character of the span
    pub end_index: usize,

    pub confidence: f64,
}

impl Statement {
    pub fn len(&self) -> usize {
        self.end_index - self.start_index
    }

    pub fn is_empty(&self) -> bool {
        self.start_index == self.end_index
    }

    /// Whether two spans share at least one byte
    pub fn overlaps(&self, other: &Statement) -> bool {
        self.start_index < other.end_index && other.start_index < self.end_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn citation(text: &str, authors: Option<&str>, title: Option<&str>) -> Citation {
        Citation {
            id: "c1".to_string(),
            text: text.to_string(),
            authors: authors.map(str::to_string),
            year: None,
            title: title.map(str::to_string),
            confidence: 0.7,
        }
    }

    #[test]
    fn test_query_string_prefers_title() {
        let c = citation("Smith, J. (2020). Deep nets.", Some("Smith, J."), Some("Deep nets for all"));
        assert_eq!(c.query_string(), "Deep nets for all");
    }

    #[test]
    fn test_query_string_falls_back_to_authors_then_text() {
        let c = citation("(Jones, 2019)", Some("Jones"), None);
        assert_eq!(c.query_string(), "Jones");

        let long = "x".repeat(150);
        let c = citation(&long, None, Some("   "));
        assert_eq!(c.query_string().chars().count(), 100);
    }

    #[test]
    fn test_statement_overlap() {
        let a = Statement {
            text: "abc".into(),
            start_index: 0,
            end_index: 3,
            confidence: 0.5,
        };
        let b = Statement {
            text: "def".into(),
            start_index: 3,
            end_index: 6,
            confidence: 0.5,
        };
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&a.clone()));
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn test_citation_serializes_camel_case_without_empty_fields() {
        let c = citation("(Jones, 2019)", None, None);
        let json = serde_json::to_value(&c).unwrap();
        assert!(json.get("authors").is_none());
        assert_eq!(json["text"], "(Jones, 2019)");
    }

    #[test]
    fn test_base_confidence() {
        assert_eq!(ExtractionMode::Pdf.base_confidence(), 50);
        assert_eq!(ExtractionMode::Text.base_confidence(), 70);
    }
}
