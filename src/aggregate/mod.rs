//! Fan queries out to every source and merge the answers.
//!
//! For each query target (a citation, or a statement when a document has no
//! citations) all registered sources are searched concurrently. A source that
//! fails or times out contributes nothing; the others still count. Results
//! are merged in source registration order, deduplicated by title, capped,
//! and finally ranked by similarity.

use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::Config;
use crate::models::{
    Citation, RelatedPaper, SearchQuery, Statement, DEFAULT_MAX_RESULTS, NO_ABSTRACT,
};
use crate::sources::{Source, SourceError, SourceRegistry};
use crate::utils::{dedup_by_title, IntervalScheduler, Sleeper};

/// Words shorter than this never link a quote to a query
const QUOTE_MIN_WORD_CHARS: usize = 5;

/// Limits and pacing for one aggregation run
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatorSettings {
    /// Targets queried per run; later ones are ignored
    pub max_queries: usize,
    /// Results requested from each source per query
    pub per_source_limit: usize,
    /// Cap on unique papers kept
    pub max_papers: usize,
    /// Pause between successive targets
    pub query_delay: Duration,
    /// Deadline for a single source call
    pub call_timeout: Duration,
    /// Deadline for the whole run
    pub budget: Option<Duration>,
    /// Papers scoring below this are dropped after ranking
    pub min_similarity: f64,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            max_queries: 3,
            per_source_limit: DEFAULT_MAX_RESULTS,
            max_papers: 15,
            query_delay: Duration::from_secs(1),
            call_timeout: Duration::from_secs(10),
            budget: Some(Duration::from_secs(45)),
            min_similarity: 0.0,
        }
    }
}

impl From<&Config> for AggregatorSettings {
    fn from(config: &Config) -> Self {
        let agg = &config.aggregation;
        Self {
            max_queries: agg.max_queries,
            per_source_limit: config.sources.max_results,
            max_papers: agg.max_papers,
            query_delay: Duration::from_millis(agg.query_delay_ms),
            call_timeout: Duration::from_secs(config.sources.timeout_secs),
            budget: (agg.request_budget_secs > 0)
                .then(|| Duration::from_secs(agg.request_budget_secs)),
            min_similarity: agg.min_similarity,
        }
    }
}

/// One query sent to every source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTarget {
    /// Text of the citation or statement the query came from
    pub label: String,
    pub query: String,
}

impl QueryTarget {
    pub fn new(label: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            query: query.into(),
        }
    }

    pub fn from_citation(citation: &Citation) -> Self {
        Self::new(citation.text.clone(), citation.query_string())
    }

    pub fn from_statement(statement: &Statement) -> Self {
        Self::new(statement.text.clone(), statement.text.clone())
    }
}

/// Runs query targets against the registered sources
#[derive(Debug, Clone)]
pub struct Aggregator {
    sources: Arc<SourceRegistry>,
    settings: AggregatorSettings,
    sleeper: Arc<dyn Sleeper>,
}

impl Aggregator {
    pub fn new(
        sources: Arc<SourceRegistry>,
        settings: AggregatorSettings,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            sources,
            settings,
            sleeper,
        }
    }

    pub fn settings(&self) -> &AggregatorSettings {
        &self.settings
    }

    pub fn sources(&self) -> &SourceRegistry {
        &self.sources
    }

    /// Find related papers for the first `max_queries` citations.
    pub async fn aggregate(&self, citations: &[Citation], seed: u64) -> Vec<RelatedPaper> {
        let targets: Vec<QueryTarget> = citations.iter().map(QueryTarget::from_citation).collect();
        self.aggregate_targets(&targets, seed).await
    }

    /// Find related papers for the first `max_queries` targets.
    ///
    /// Never fails: a source error or timeout only removes that source's
    /// answer for that target.
    pub async fn aggregate_targets(&self, targets: &[QueryTarget], seed: u64) -> Vec<RelatedPaper> {
        let settings = &self.settings;
        // A budget too large to represent as an instant means no deadline
        let deadline = settings.budget.and_then(|b| Instant::now().checked_add(b));
        let mut scheduler = IntervalScheduler::new(settings.query_delay, self.sleeper.clone());
        let mut merged: Vec<RelatedPaper> = Vec::new();

        let targets = targets
            .iter()
            .filter(|t| !t.query.trim().is_empty())
            .take(settings.max_queries);

        for target in targets {
            if merged.len() >= settings.max_papers {
                tracing::debug!("Collected {} papers, skipping remaining queries", merged.len());
                break;
            }

            scheduler.tick().await;

            let call_timeout = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        tracing::warn!("Search budget exhausted, skipping remaining queries");
                        break;
                    }
                    remaining.min(settings.call_timeout)
                }
                None => settings.call_timeout,
            };

            let mut batch = self.search_all(&target.query, seed, call_timeout).await;
            for paper in &mut batch {
                paper.statement = Some(target.label.clone());
                paper.supporting_quote = supporting_quote(&paper.r#abstract, &target.query);
            }

            merged.extend(batch);
            merged = dedup_by_title(merged);
            merged.truncate(settings.max_papers);
        }

        // Stable: equal scores keep merge order
        merged.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        merged.retain(|p| p.similarity >= settings.min_similarity);

        tracing::info!("Aggregated {} related papers", merged.len());
        merged
    }

    /// Query every source concurrently; results are concatenated in source order.
    pub async fn search_all(&self, query: &str, seed: u64, call_timeout: Duration) -> Vec<RelatedPaper> {
        let request = SearchQuery::new(query)
            .max_results(self.settings.per_source_limit)
            .seed(seed);

        let calls = self
            .sources
            .all()
            .map(|source| search_one(source.as_ref(), &request, call_timeout));

        join_all(calls).await.into_iter().flatten().collect()
    }
}

async fn search_one(source: &dyn Source, request: &SearchQuery, call_timeout: Duration) -> Vec<RelatedPaper> {
    let outcome = match tokio::time::timeout(call_timeout, source.search(request)).await {
        Ok(result) => result,
        Err(_) => Err(SourceError::Timeout(format!(
            "no answer within {:?}",
            call_timeout
        ))),
    };

    match outcome {
        Ok(papers) => {
            tracing::debug!("{} returned {} papers for '{}'", source.name(), papers.len(), request.query);
            papers
        }
        Err(e) => {
            tracing::warn!("{} search failed for '{}': {}", source.name(), request.query, e);
            Vec::new()
        }
    }
}

/// First abstract sentence sharing a significant word with `query`
pub fn supporting_quote(abstract_text: &str, query: &str) -> Option<String> {
    let query_words: Vec<String> = significant_words(query).collect();
    if query_words.is_empty() || abstract_text == NO_ABSTRACT {
        return None;
    }

    abstract_text
        .split_inclusive(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.ends_with("..."))
        .find(|sentence| significant_words(sentence).any(|w| query_words.contains(&w)))
        .map(str::to_string)
}

fn significant_words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= QUOTE_MIN_WORD_CHARS)
        .map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RelatedPaperBuilder, SourceType};
    use crate::sources::mock::make_paper;
    use crate::sources::MockSource;
    use crate::utils::RecordingSleeper;

    fn aggregator(sources: Vec<MockSource>, settings: AggregatorSettings) -> (Aggregator, Arc<RecordingSleeper>) {
        let mut registry = SourceRegistry::new();
        for source in sources {
            registry.register(Arc::new(source));
        }
        let sleeper = Arc::new(RecordingSleeper::new());
        (
            Aggregator::new(Arc::new(registry), settings, sleeper.clone()),
            sleeper,
        )
    }

    fn targets(n: usize) -> Vec<QueryTarget> {
        (0..n)
            .map(|i| QueryTarget::new(format!("label {}", i), format!("query {}", i)))
            .collect()
    }

    #[tokio::test]
    async fn test_dedup_prefers_earlier_source() {
        let (agg, _) = aggregator(
            vec![
                MockSource::new("first").with_papers(vec![make_paper("a", "Deep Learning", SourceType::Arxiv, 0.5)]),
                MockSource::new("second").with_papers(vec![make_paper("b", "deep learning ", SourceType::OpenAlex, 0.9)]),
            ],
            AggregatorSettings::default(),
        );

        let papers = agg.aggregate_targets(&targets(1), 0).await;
        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].id, "a");
        assert_eq!(papers[0].statement.as_deref(), Some("label 0"));
    }

    #[tokio::test]
    async fn test_sorted_by_similarity_with_stable_ties() {
        let (agg, _) = aggregator(
            vec![MockSource::new("m").with_papers(vec![
                make_paper("1", "Paper one", SourceType::Arxiv, 0.6),
                make_paper("2", "Paper two", SourceType::Arxiv, 0.9),
                make_paper("3", "Paper three", SourceType::Arxiv, 0.6),
            ])],
            AggregatorSettings::default(),
        );

        let ids: Vec<String> = agg
            .aggregate_targets(&targets(1), 0)
            .await
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["2", "1", "3"]);
    }

    #[tokio::test]
    async fn test_at_most_max_queries_and_paced() {
        let source = Arc::new(MockSource::new("m"));
        let mut registry = SourceRegistry::new();
        registry.register(source.clone());
        let sleeper = Arc::new(RecordingSleeper::new());
        let agg = Aggregator::new(Arc::new(registry), AggregatorSettings::default(), sleeper.clone());

        agg.aggregate_targets(&targets(5), 0).await;

        assert_eq!(source.queries(), vec!["query 0", "query 1", "query 2"]);
        assert_eq!(sleeper.waits(), vec![Duration::from_secs(1); 2]);
    }

    #[tokio::test]
    async fn test_cap_stops_further_queries() {
        let source = Arc::new(MockSource::new("m").with_responder(|q| {
            (0..5)
                .map(|i| make_paper(&format!("{}-{}", q.query, i), &format!("{} result {}", q.query, i), SourceType::Arxiv, 0.7))
                .collect()
        }));
        let mut registry = SourceRegistry::new();
        registry.register(source.clone());
        let settings = AggregatorSettings {
            max_papers: 7,
            ..Default::default()
        };
        let agg = Aggregator::new(Arc::new(registry), settings, Arc::new(RecordingSleeper::new()));

        let papers = agg.aggregate_targets(&targets(3), 0).await;
        assert_eq!(papers.len(), 7);
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let (agg, _) = aggregator(
            vec![
                MockSource::new("down").failing("503"),
                MockSource::new("up").with_papers(vec![make_paper("x", "Survivor", SourceType::PubMed, 0.5)]),
            ],
            AggregatorSettings::default(),
        );
        let papers = agg.aggregate_targets(&targets(1), 0).await;
        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].id, "x");
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_source_times_out() {
        let (agg, _) = aggregator(
            vec![
                MockSource::new("slow")
                    .with_delay(Duration::from_secs(60))
                    .with_papers(vec![make_paper("s", "Too late", SourceType::Arxiv, 0.99)]),
                MockSource::new("fast").with_papers(vec![make_paper("f", "On time", SourceType::CrossRef, 0.6)]),
            ],
            AggregatorSettings::default(),
        );
        let papers = agg.aggregate_targets(&targets(1), 0).await;
        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].id, "f");
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_stops_queries() {
        let source = Arc::new(MockSource::new("slow").with_delay(Duration::from_secs(30)));
        let mut registry = SourceRegistry::new();
        registry.register(source.clone());
        let settings = AggregatorSettings {
            budget: Some(Duration::from_secs(15)),
            ..Default::default()
        };
        let agg = Aggregator::new(Arc::new(registry), settings, Arc::new(RecordingSleeper::new()));

        let papers = agg.aggregate_targets(&targets(3), 0).await;
        assert!(papers.is_empty());
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test]
    async fn test_huge_budget_means_no_deadline() {
        let settings = AggregatorSettings {
            budget: Some(Duration::from_secs(u64::MAX)),
            ..Default::default()
        };
        let (agg, _) = aggregator(
            vec![MockSource::new("m").with_papers(vec![make_paper("1", "Found", SourceType::Arxiv, 0.9)])],
            settings,
        );
        let papers = agg.aggregate_targets(&targets(1), 0).await;
        assert_eq!(papers.len(), 1);

        let mut config = Config::default();
        config.aggregation.request_budget_secs = u64::MAX;
        assert_eq!(AggregatorSettings::from(&config).budget, Some(Duration::from_secs(u64::MAX)));
    }

    #[tokio::test]
    async fn test_min_similarity_filter() {
        let settings = AggregatorSettings {
            min_similarity: 0.65,
            ..Default::default()
        };
        let (agg, _) = aggregator(
            vec![MockSource::new("m").with_papers(vec![
                make_paper("hi", "High", SourceType::Arxiv, 0.8),
                make_paper("lo", "Low", SourceType::PubMed, 0.55),
            ])],
            settings,
        );
        let papers = agg.aggregate_targets(&targets(1), 0).await;
        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].id, "hi");
    }

    #[tokio::test]
    async fn test_no_results_anywhere_is_empty() {
        let (agg, _) = aggregator(
            vec![MockSource::new("a"), MockSource::new("b")],
            AggregatorSettings::default(),
        );
        assert!(agg.aggregate_targets(&targets(2), 0).await.is_empty());
    }

    #[test]
    fn test_supporting_quote() {
        let abstract_text = "We study graphs. Transformers improve translation quality. More work.";
        assert_eq!(
            supporting_quote(abstract_text, "neural transformers"),
            Some("Transformers improve translation quality.".to_string())
        );
        assert_eq!(supporting_quote(abstract_text, "cats and dogs"), None);
        assert_eq!(supporting_quote(NO_ABSTRACT, "available data"), None);
    }

    #[tokio::test]
    async fn test_quote_attached_to_paper() {
        let paper = RelatedPaperBuilder::new("q", "Quoted", "u", SourceType::OpenAlex)
            .abstract_text("Intro sentence. Citation networks reveal structure.")
            .similarity(0.7)
            .build();
        let (agg, _) = aggregator(vec![MockSource::new("m").with_papers(vec![paper])], AggregatorSettings::default());

        let papers = agg
            .aggregate_targets(&[QueryTarget::new("claim", "citation networks")], 0)
            .await;
        assert_eq!(
            papers[0].supporting_quote.as_deref(),
            Some("Citation networks reveal structure.")
        );
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::default();
        config.aggregation.request_budget_secs = 0;
        config.sources.timeout_secs = 4;
        let settings = AggregatorSettings::from(&config);
        assert_eq!(settings.budget, None);
        assert_eq!(settings.call_timeout, Duration::from_secs(4));
        assert_eq!(settings.max_queries, 3);
    }
}
