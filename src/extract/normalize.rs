//! Derive author, year and title fields from a raw citation match.

use regex::Regex;

use super::ExtractError;
use crate::models::ExtractionMode;

/// Confidence weights in hundredths
const YEAR_WEIGHT: u32 = 20;
const AUTHORS_WEIGHT: u32 = 20;
const TITLE_WEIGHT: u32 = 10;

/// Accepted title length window, in characters
const TITLE_MIN_CHARS: usize = 10;
const TITLE_MAX_CHARS: usize = 200;

const AUTHOR_MAX_CHARS: usize = 100;

/// Fields derived from one raw match
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedFields {
    pub authors: Option<String>,
    pub year: Option<String>,
    pub title: Option<String>,
    pub confidence: f64,
}

/// Confidence for a citation given which fields were recovered.
///
/// Base 0.5 for PDF text, 0.7 for pasted text, plus 0.2 for a year, 0.2 for
/// authors and 0.1 for a title, capped at 1.0.
pub fn confidence_for(mode: ExtractionMode, has_year: bool, has_authors: bool, has_title: bool) -> f64 {
    let mut score = mode.base_confidence();
    if has_year {
        score += YEAR_WEIGHT;
    }
    if has_authors {
        score += AUTHORS_WEIGHT;
    }
    if has_title {
        score += TITLE_WEIGHT;
    }
    f64::from(score.min(100)) / 100.0
}

/// Splits a matched citation into its bibliographic parts
#[derive(Debug, Clone)]
pub struct CitationNormalizer {
    year: Regex,
    authors_before_year: Regex,
    et_al: Regex,
    quoted_title: Regex,
    title_after_year: Regex,
}

impl CitationNormalizer {
    pub fn new() -> Result<Self, ExtractError> {
        let compile = |index: usize, pattern: &str| {
            Regex::new(pattern).map_err(|source| ExtractError::Pattern {
                index,
                style: "normalizer".to_string(),
                source,
            })
        };

        Ok(Self {
            year: compile(0, r"\b((?:19|20)\d{2})(?:\D|$)")?,
            authors_before_year: compile(1, r"^(.+?)\s*\(\s*(?:19|20)\d{2}[a-z]?\s*\)")?,
            et_al: compile(2, r"([A-Z][A-Za-z'\-]+\s+et\s+al\.)")?,
            quoted_title: compile(3, r#"["“]([^"”]+)["”]"#)?,
            title_after_year: compile(4, r"\(\s*(?:19|20)\d{2}[a-z]?\s*\)\.?\s+([^.]+)\.")?,
        })
    }

    /// Normalize one raw match
    pub fn normalize(&self, raw: &str, mode: ExtractionMode) -> NormalizedFields {
        let raw = raw.trim();
        let year = self.extract_year(raw);
        let authors = self.extract_authors(raw);
        let title = self.extract_title(raw, authors.as_deref(), year.as_deref());
        let confidence = confidence_for(mode, year.is_some(), authors.is_some(), title.is_some());

        NormalizedFields {
            authors,
            year,
            title,
            confidence,
        }
    }

    /// First 19xx/20xx token
    pub fn extract_year(&self, raw: &str) -> Option<String> {
        self.year
            .captures(raw)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Author block before a `(year)` group, else an `X et al.` token, else
    /// the leading name block up to the first period or comma.
    pub fn extract_authors(&self, raw: &str) -> Option<String> {
        if let Some(block) = self
            .authors_before_year
            .captures(raw)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().trim_end_matches(',').trim())
        {
            if starts_with_capital(block) && block.chars().count() <= AUTHOR_MAX_CHARS {
                return Some(block.to_string());
            }
        }

        if let Some(m) = self.et_al.captures(raw).and_then(|c| c.get(1)) {
            return Some(m.as_str().to_string());
        }

        leading_name_block(raw)
    }

    fn extract_title(&self, raw: &str, authors: Option<&str>, year: Option<&str>) -> Option<String> {
        let candidate = self
            .quoted_title
            .captures(raw)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().trim_end_matches(['.', ',']).trim().to_string())
            .or_else(|| {
                self.title_after_year
                    .captures(raw)
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str().trim().to_string())
            })
            .or_else(|| between_authors_and_year(raw, authors?, year?));

        candidate.filter(|t| {
            let len = t.chars().count();
            (TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&len)
        })
    }
}

fn starts_with_capital(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_uppercase())
}

fn leading_name_block(raw: &str) -> Option<String> {
    if !starts_with_capital(raw) {
        return None;
    }
    let end = raw.find(". ").or_else(|| raw.find(','))?;
    let block = raw[..end].trim().trim_end_matches(',').trim();
    let len = block.chars().count();
    if len < 2 || len > AUTHOR_MAX_CHARS || block.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(block.to_string())
}

fn between_authors_and_year(raw: &str, authors: &str, year: &str) -> Option<String> {
    let after_authors = raw.find(authors)? + authors.len();
    let year_at = raw[after_authors..].find(year)? + after_authors;
    let segment = raw[after_authors..year_at]
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '.' | ',' | ';' | ':' | '('));
    let segment = segment.split(". ").next().unwrap_or(segment).trim();
    if segment.is_empty() {
        None
    } else {
        Some(segment.to_string())
    }
}
