//! Deduplication of papers reported by several sources.

use std::collections::HashSet;

use crate::models::RelatedPaper;

/// Drop papers whose trimmed, lowercased title was already seen.
///
/// The first occurrence wins, so input order sets priority.
pub fn dedup_by_title(papers: Vec<RelatedPaper>) -> Vec<RelatedPaper> {
    let mut seen = HashSet::new();
    papers
        .into_iter()
        .filter(|p| seen.insert(p.title_key()))
        .collect()
}

/// Indices of papers that repeat an earlier title
pub fn find_duplicates(papers: &[RelatedPaper]) -> Vec<usize> {
    let mut seen = HashSet::new();
    papers
        .iter()
        .enumerate()
        .filter(|(_, p)| !seen.insert(p.title_key()))
        .map(|(i, _)| i)
        .collect()
}
