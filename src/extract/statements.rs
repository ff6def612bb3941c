//! Keyword-driven detection of claims that need academic support.
//!
//! This is a relevance filter, not language understanding: a sentence is a
//! claim candidate when it contains one of a fixed set of academic keywords,
//! and the candidate is the keyword plus up to 50 characters on either side.
//! Documents without any keyword hit fall back to their most frequent words.

use regex::Regex;
use std::collections::{HashMap, HashSet};

use super::ExtractError;
use crate::models::Statement;

/// Default cap on statements per document
pub const DEFAULT_MAX_STATEMENTS: usize = 10;

const MIN_SENTENCE_CHARS: usize = 10;
const WINDOW_CHARS: usize = 50;
const FALLBACK_TOPICS: usize = 5;
const FALLBACK_MIN_WORD_CHARS: usize = 5;
const FALLBACK_CONFIDENCE: f64 = 0.3;

const KEYWORDS: &[&str] = &[
    "research",
    "study",
    "studies",
    "analysis",
    "evidence",
    "data",
    "results",
    "findings",
    "significant",
    "significantly",
    "demonstrate",
    "demonstrated",
    "shows",
    "showed",
    "suggest",
    "suggests",
    "indicates",
    "hypothesis",
    "theory",
    "model",
    "experiment",
    "method",
    "approach",
    "effect",
    "impact",
    "increase",
    "decrease",
    "correlation",
    "associated",
    "according",
    "reported",
    "observed",
    "previous",
    "literature",
    "clinical",
    "population",
];

const STOP_WORDS: &[&str] = &[
    "about", "above", "after", "again", "against", "among", "because", "before", "being",
    "below", "between", "cannot", "could", "doing", "during", "every", "first", "further",
    "having", "however", "itself", "might", "other", "ourselves", "should", "since", "still",
    "their", "theirs", "themselves", "there", "these", "thing", "things", "those", "three",
    "through", "under", "until", "using", "where", "which", "while", "whose", "within",
    "without", "would", "yourself",
];

/// Scans prose for claim-bearing spans
#[derive(Debug, Clone)]
pub struct StatementExtractor {
    keywords: Regex,
    words: Regex,
    stop_words: HashSet<&'static str>,
    max_statements: usize,
}

impl StatementExtractor {
    pub fn new(max_statements: usize) -> Result<Self, ExtractError> {
        let keyword_pattern = format!(r"(?i)\b(?:{})\b", KEYWORDS.join("|"));
        let compile = |index: usize, pattern: &str| {
            Regex::new(pattern).map_err(|source| ExtractError::Pattern {
                index,
                style: "statement".to_string(),
                source,
            })
        };

        Ok(Self {
            keywords: compile(0, &keyword_pattern)?,
            words: compile(1, r"\p{L}+")?,
            stop_words: STOP_WORDS.iter().copied().collect(),
            max_statements,
        })
    }

    /// Extract statements sorted by position, never overlapping.
    ///
    /// Falls back to frequent-word topics when no sentence has a keyword.
    pub fn extract(&self, text: &str) -> Vec<Statement> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut statements = Vec::new();

        for (start, sentence) in split_sentences(text) {
            let Some(hit) = self.keywords.find(sentence) else {
                continue;
            };

            let window_start = back_chars(sentence, hit.start(), WINDOW_CHARS);
            let window_end = forward_chars(sentence, hit.end(), WINDOW_CHARS);
            let window = &sentence[window_start..window_end];
            let lead = window.len() - window.trim_start().len();
            let phrase = window.trim();
            if phrase.is_empty() || !seen.insert(phrase.to_string()) {
                continue;
            }

            let distinct: HashSet<String> = self
                .keywords
                .find_iter(phrase)
                .map(|m| m.as_str().to_lowercase())
                .collect();
            let score = (50 + 10 * distinct.len() as u32).min(90);

            let start_index = start + window_start + lead;
            statements.push(Statement {
                text: phrase.to_string(),
                start_index,
                end_index: start_index + phrase.len(),
                confidence: f64::from(score) / 100.0,
            });
        }

        if statements.is_empty() {
            statements = self.frequent_word_topics(text);
            tracing::debug!(
                "No keyword statements found, using {} frequent-word topics",
                statements.len()
            );
        }

        prune_overlaps(statements, self.max_statements)
    }

    /// Topic strings for the report
    pub fn topics(&self, text: &str) -> Vec<String> {
        self.extract(text).into_iter().map(|s| s.text).collect()
    }

    fn frequent_word_topics(&self, text: &str) -> Vec<Statement> {
        // word -> (count, first start, first end)
        let mut counts: HashMap<String, (usize, usize, usize)> = HashMap::new();

        for m in self.words.find_iter(text) {
            let word = m.as_str().to_lowercase();
            if word.chars().count() < FALLBACK_MIN_WORD_CHARS || self.stop_words.contains(word.as_str()) {
                continue;
            }
            counts
                .entry(word)
                .and_modify(|e| e.0 += 1)
                .or_insert((1, m.start(), m.end()));
        }

        let mut ranked: Vec<(usize, usize, usize)> = counts.into_values().collect();
        ranked.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        ranked
            .into_iter()
            .take(FALLBACK_TOPICS)
            .map(|(_, start, end)| Statement {
                text: text[start..end].to_string(),
                start_index: start,
                end_index: end,
                confidence: FALLBACK_CONFIDENCE,
            })
            .collect()
    }
}

/// Sentences ending in `.`, `!` or `?` followed by whitespace or end of text,
/// trimmed, with their byte offset. Unterminated trailing text is not a sentence.
fn split_sentences(text: &str) -> Vec<(usize, &str)> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let at_boundary = chars.peek().map_or(true, |(_, next)| next.is_whitespace());
        if !at_boundary {
            continue;
        }
        let end = i + c.len_utf8();
        let raw = &text[start..end];
        let lead = raw.len() - raw.trim_start().len();
        let sentence = raw.trim();
        if sentence.chars().count() >= MIN_SENTENCE_CHARS {
            sentences.push((start + lead, sentence));
        }
        start = end;
    }

    sentences
}

/// Byte index `n` characters before `from`, clamped to 0
fn back_chars(s: &str, from: usize, n: usize) -> usize {
    s[..from]
        .char_indices()
        .rev()
        .nth(n - 1)
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Byte index `n` characters after `from`, clamped to the end
fn forward_chars(s: &str, from: usize, n: usize) -> usize {
    s[from..]
        .char_indices()
        .nth(n)
        .map(|(i, _)| from + i)
        .unwrap_or(s.len())
}

fn prune_overlaps(mut statements: Vec<Statement>, max: usize) -> Vec<Statement> {
    statements.sort_by_key(|s| s.start_index);
    let mut kept: Vec<Statement> = Vec::with_capacity(statements.len().min(max));
    for statement in statements {
        if kept.len() >= max {
            break;
        }
        if kept.last().is_some_and(|last| last.overlaps(&statement)) {
            continue;
        }
        kept.push(statement);
    }
    kept
}
