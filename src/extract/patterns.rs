//! Citation-shape patterns applied to raw document text.

use regex::Regex;
use std::collections::HashSet;

use super::ExtractError;
use crate::models::{CitationStyle, RawMatch};

/// Built-in patterns in priority order: APA, MLA, Chicago, parenthetical, et al.
const BUILTIN_PATTERNS: &[(CitationStyle, &str)] = &[
    // Smith, J., & Doe, A. (2020). Title of the work.
    (
        CitationStyle::Apa,
        r"(?:[A-Z][A-Za-z'\-]+,\s+(?:[A-Z]\.\s?)+(?:,\s*|\s+)?(?:&\s+|and\s+)?)+\(\s*(?:19|20)\d{2}[a-z]?\s*\)\.\s+[^.\n]+\.",
    ),
    // Smith, John. "Title of the Work." Journal, vol. 3, 2018
    (
        CitationStyle::Mla,
        r#"[A-Z][A-Za-z'\-]+,\s+[A-Z][A-Za-z'\-]+(?:\s+[A-Z]\.)?\.\s+["“][^"”\n]{5,200}["”][^\n]{0,150}?(?:19|20)\d{2}"#,
    ),
    // Smith, John. Title of Book. New York: Publisher, 2020.
    (
        CitationStyle::Chicago,
        r#"[A-Z][A-Za-z'\-]+,\s+[A-Z][A-Za-z'\-]+(?:\s+[A-Z]\.)?\.\s+[A-Z][^.\n"“]{5,200}\.\s+[A-Z][A-Za-z .]*:\s+[^,\n]+,\s+(?:19|20)\d{2}\.?"#,
    ),
    // (Jones, 2019), (Smith & Lee, 2020), (Smith et al., 2021a)
    (
        CitationStyle::Parenthetical,
        r"\([A-Z][A-Za-z'\-]+(?:\s+(?:&|and)\s+[A-Z][A-Za-z'\-]+)?(?:\s+et\s+al\.)?,\s+(?:19|20)\d{2}[a-z]?\)",
    ),
    // Smith et al. (2020), Smith et al. 2020
    (
        CitationStyle::EtAl,
        r"[A-Z][A-Za-z'\-]+\s+et\s+al\.\s*\(?(?:19|20)\d{2}[a-z]?\)?",
    ),
];

/// A compiled citation pattern
#[derive(Debug, Clone)]
pub struct CitationPattern {
    pub style: CitationStyle,
    regex: Regex,
}

impl CitationPattern {
    /// Compile a pattern, reporting its position for diagnostics
    pub fn compile(index: usize, style: CitationStyle, pattern: &str) -> Result<Self, ExtractError> {
        let regex = Regex::new(pattern).map_err(|source| ExtractError::Pattern {
            index,
            style: style.to_string(),
            source,
        })?;
        Ok(Self { style, regex })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

/// Applies an ordered set of citation patterns to text.
///
/// Matches are reported pattern by pattern in declaration order. A match whose
/// text equals one already reported by an earlier pattern (or earlier in the
/// same pattern) is dropped.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    patterns: Vec<CitationPattern>,
}

impl PatternMatcher {
    /// Matcher with the built-in patterns only
    pub fn new() -> Result<Self, ExtractError> {
        Self::with_extra_patterns(&[])
    }

    /// Matcher with the built-in patterns followed by custom ones.
    ///
    /// Fails if any pattern does not compile.
    pub fn with_extra_patterns(extra: &[String]) -> Result<Self, ExtractError> {
        let mut patterns = Vec::with_capacity(BUILTIN_PATTERNS.len() + extra.len());
        for (index, (style, pattern)) in BUILTIN_PATTERNS.iter().enumerate() {
            patterns.push(CitationPattern::compile(index, style.clone(), pattern)?);
        }
        for (offset, pattern) in extra.iter().enumerate() {
            let index = BUILTIN_PATTERNS.len() + offset;
            let style = CitationStyle::Custom(format!("custom-{}", offset + 1));
            patterns.push(CitationPattern::compile(index, style, pattern)?);
        }
        Ok(Self { patterns })
    }

    pub fn patterns(&self) -> &[CitationPattern] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Run every pattern over `text` and collect unique matches
    pub fn find_matches(&self, text: &str) -> Vec<RawMatch> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut matches = Vec::new();

        for (pattern_index, pattern) in self.patterns.iter().enumerate() {
            for m in pattern.regex.find_iter(text) {
                let matched = m.as_str().trim();
                if matched.is_empty() || !seen.insert(matched.to_string()) {
                    continue;
                }
                matches.push(RawMatch {
                    text: matched.to_string(),
                    pattern_index,
                    style: pattern.style.clone(),
                });
            }
        }

        tracing::debug!(
            "Pattern matcher found {} unique citation candidates",
            matches.len()
        );
        matches
    }
}
