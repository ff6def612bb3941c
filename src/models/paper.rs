//! Related paper model shared by every academic source.

use serde::{Deserialize, Serialize};

/// Literal used when a source reports no authors
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";
/// Literal used when a source reports no title
pub const UNTITLED: &str = "Untitled";
/// Literal used when a source reports no abstract
pub const NO_ABSTRACT: &str = "No abstract available";

/// The source/repository where the paper was found
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Arxiv,
    OpenAlex,
    CrossRef,
    PubMed,
    #[serde(untagged)]
    Other(String),
}

impl SourceType {
    /// Returns the display name of the source
    pub fn name(&self) -> &str {
        match self {
            SourceType::Arxiv => "arXiv",
            SourceType::OpenAlex => "OpenAlex",
            SourceType::CrossRef => "CrossRef",
            SourceType::PubMed => "PubMed",
            SourceType::Other(s) => s,
        }
    }

    /// Returns the source identifier (used in configuration)
    pub fn id(&self) -> &str {
        match self {
            SourceType::Arxiv => "arxiv",
            SourceType::OpenAlex => "openalex",
            SourceType::CrossRef => "crossref",
            SourceType::PubMed => "pubmed",
            SourceType::Other(s) => s,
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A normalized record of an academic work returned by a source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedPaper {
    /// Source-specific identifier (arXiv URL, OpenAlex id, DOI, PMID)
    pub id: String,

    pub title: String,

    pub authors: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    /// Abstract text, truncated for presentation
    pub r#abstract: String,

    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,

    /// Source where the paper was found
    pub source: SourceType,

    /// Heuristic relevance in `[0, 1]`
    pub similarity: f64,

    /// Text of the citation or statement whose query found this paper
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supporting_quote: Option<String>,
}

impl RelatedPaper {
    /// Create a new paper with required fields and literal fallbacks elsewhere
    pub fn new(id: String, title: String, url: String, source: SourceType) -> Self {
        Self {
            id,
            title,
            authors: vec![UNKNOWN_AUTHOR.to_string()],
            year: None,
            r#abstract: NO_ABSTRACT.to_string(),
            url,
            doi: None,
            source,
            similarity: 0.0,
            statement: None,
            supporting_quote: None,
        }
    }

    /// Similarity on the 0-100 scale used for display
    pub fn similarity_percent(&self) -> f64 {
        (self.similarity * 100.0).round()
    }

    /// Key used to detect the same work reported twice: lowercase, with
    /// runs of whitespace collapsed to one space
    pub fn title_key(&self) -> String {
        self.title
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    pub fn has_abstract(&self) -> bool {
        self.r#abstract != NO_ABSTRACT && !self.r#abstract.is_empty()
    }
}

/// Builder for constructing RelatedPaper objects
#[derive(Debug, Clone)]
pub struct RelatedPaperBuilder {
    paper: RelatedPaper,
}

impl RelatedPaperBuilder {
    /// Create a new builder with required fields.
    ///
    /// An empty title becomes [`UNTITLED`].
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
        source: SourceType,
    ) -> Self {
        let title = title.into();
        let title = if title.trim().is_empty() {
            UNTITLED.to_string()
        } else {
            title
        };
        Self {
            paper: RelatedPaper::new(id.into(), title, url.into(), source),
        }
    }

    /// Set authors; an empty list keeps the [`UNKNOWN_AUTHOR`] fallback
    pub fn authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let authors: Vec<String> = authors
            .into_iter()
            .map(Into::into)
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();
        if !authors.is_empty() {
            self.paper.authors = authors;
        }
        self
    }

    /// Set abstract; empty text keeps the [`NO_ABSTRACT`] fallback
    pub fn abstract_text(mut self, abstract_text: impl Into<String>) -> Self {
        let text = abstract_text.into();
        if !text.trim().is_empty() {
            self.paper.r#abstract = text;
        }
        self
    }

    pub fn year(mut self, year: Option<i32>) -> Self {
        self.paper.year = year;
        self
    }

    pub fn doi(mut self, doi: Option<String>) -> Self {
        self.paper.doi = doi.filter(|d| !d.is_empty());
        self
    }

    pub fn similarity(mut self, similarity: f64) -> Self {
        self.paper.similarity = similarity.clamp(0.0, 1.0);
        self
    }

    /// Build the RelatedPaper
    pub fn build(self) -> RelatedPaper {
        self.paper
    }
}
