//! Integration tests for the full analysis pipeline.
//!
//! Sources are `MockSource`s and pacing goes through a `RecordingSleeper`,
//! so nothing here touches the network or waits on the wall clock.

use std::sync::Arc;
use std::time::Duration;

use cite_scout::config::Config;
use cite_scout::models::SourceType;
use cite_scout::pipeline::{Document, Pipeline, PipelineError};
use cite_scout::sources::mock::make_paper;
use cite_scout::sources::{MockSource, SourceRegistry};
use cite_scout::utils::RecordingSleeper;

const APA_REFERENCE: &str = "Smith, J. (2020). Deep learning methods. Journal of AI, 5(2), 10-20.";

fn pipeline_with(sources: Vec<Arc<MockSource>>) -> (Pipeline, Arc<RecordingSleeper>) {
    pipeline_with_config(&Config::default(), sources)
}

fn pipeline_with_config(config: &Config, sources: Vec<Arc<MockSource>>) -> (Pipeline, Arc<RecordingSleeper>) {
    let mut registry = SourceRegistry::new();
    for source in sources {
        registry.register(source);
    }
    let sleeper = Arc::new(RecordingSleeper::new());
    let pipeline = Pipeline::new(config, Arc::new(registry), sleeper.clone()).unwrap();
    (pipeline, sleeper)
}

/// Text with `n` distinct parenthetical citations
fn document_with_citations(n: usize) -> Document {
    let names = ["Adams", "Baker", "Clark", "Davis", "Evans", "Foster"];
    let text = names
        .iter()
        .take(n)
        .enumerate()
        .map(|(i, name)| format!("Finding number {} was reported ({}, 201{}).", i, name, i))
        .collect::<Vec<_>>()
        .join(" ");
    Document::from_text(text).unwrap()
}

mod extraction_tests {
    use super::*;

    #[test]
    fn test_apa_reference() {
        let (pipeline, _) = pipeline_with(Vec::new());
        let extraction = pipeline.extract(&Document::from_text(APA_REFERENCE).unwrap()).unwrap();

        assert_eq!(extraction.citations.len(), 1);
        let citation = &extraction.citations[0];
        assert_eq!(citation.id, "c1");
        assert_eq!(citation.year.as_deref(), Some("2020"));
        assert!(citation.authors.as_deref().unwrap_or("").starts_with("Smith, J."));
        assert!(citation.confidence >= 0.9);
    }

    #[test]
    fn test_parenthetical_confidence_window() {
        let (pipeline, _) = pipeline_with(Vec::new());
        let extraction = pipeline.extract(&Document::from_text("(Jones, 2019)").unwrap()).unwrap();

        assert_eq!(extraction.citations.len(), 1);
        let citation = &extraction.citations[0];
        assert_eq!(citation.year.as_deref(), Some("2019"));
        assert!(citation.confidence >= 0.7 && citation.confidence <= 0.9);
    }

    #[test]
    fn test_statements_sorted_and_disjoint() {
        let (pipeline, _) = pipeline_with(Vec::new());
        let text = "Studies show that exercise improves mood in adults. \
                    Evidence suggests the effect is significant over time. \
                    Research indicates that sleep matters too.";
        let extraction = pipeline.extract(&Document::from_text(text).unwrap()).unwrap();

        assert!(!extraction.statements.is_empty());
        for pair in extraction.statements.windows(2) {
            assert!(pair[0].start_index <= pair[1].start_index);
            assert!(pair[0].end_index <= pair[1].start_index);
        }
    }

    #[test]
    fn test_no_duplicate_citation_texts() {
        let (pipeline, _) = pipeline_with(Vec::new());
        let text = "As shown (Lee, 2018). Again (Lee, 2018). And Lee et al. (2018) agree.";
        let extraction = pipeline.extract(&Document::from_text(text).unwrap()).unwrap();

        let mut texts: Vec<&str> = extraction.citations.iter().map(|c| c.text.as_str()).collect();
        let before = texts.len();
        texts.sort();
        texts.dedup();
        assert_eq!(texts.len(), before);
    }
}

mod aggregation_tests {
    use super::*;

    #[tokio::test]
    async fn test_case_and_whitespace_duplicates_merge() {
        let a = Arc::new(MockSource::new("a").with_papers(vec![make_paper("1", "Deep Learning", SourceType::Arxiv, 0.85)]));
        let b = Arc::new(MockSource::new("b").with_papers(vec![make_paper("2", "deep learning ", SourceType::OpenAlex, 0.75)]));
        let (pipeline, _) = pipeline_with(vec![a, b]);

        let report = pipeline.analyze(&Document::from_text(APA_REFERENCE).unwrap()).await.unwrap();

        assert_eq!(report.related_papers.len(), 1);
        assert_eq!(report.related_papers[0].id, "1");
        assert_eq!(report.discovered_citations_count, 1);
    }

    #[tokio::test]
    async fn test_inner_whitespace_duplicates_merge() {
        let a = Arc::new(MockSource::new("a").with_papers(vec![make_paper("1", "Deep Learning", SourceType::Arxiv, 0.85)]));
        let b = Arc::new(MockSource::new("b").with_papers(vec![make_paper("2", "Deep  Learning", SourceType::OpenAlex, 0.75)]));
        let c = Arc::new(MockSource::new("c").with_papers(vec![make_paper("3", "deep\tlearning\n", SourceType::CrossRef, 0.65)]));
        let (pipeline, _) = pipeline_with(vec![a, b, c]);

        let report = pipeline.analyze(&Document::from_text(APA_REFERENCE).unwrap()).await.unwrap();

        let titles: Vec<&str> = report.related_papers.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Deep Learning"]);
    }

    #[tokio::test]
    async fn test_no_results_anywhere() {
        let sources = (0..4).map(|i| Arc::new(MockSource::new(format!("empty{}", i)))).collect();
        let (pipeline, _) = pipeline_with(sources);

        let report = pipeline.analyze(&Document::from_text(APA_REFERENCE).unwrap()).await.unwrap();
        assert!(report.related_papers.is_empty());
        assert_eq!(report.existing_citations_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_of_four_sources_failing() {
        let survivor = make_paper("ok", "Surviving result", SourceType::PubMed, 0.6);
        let sources = vec![
            Arc::new(MockSource::new("arxiv").with_delay(Duration::from_secs(120))),
            Arc::new(MockSource::new("openalex").failing("HTTP 500")),
            Arc::new(MockSource::new("crossref").with_delay(Duration::from_secs(120))),
            Arc::new(MockSource::new("pubmed").with_papers(vec![survivor])),
        ];
        let (pipeline, _) = pipeline_with(sources);

        let report = pipeline.analyze(&Document::from_text(APA_REFERENCE).unwrap()).await.unwrap();
        assert_eq!(report.related_papers.len(), 1);
        assert_eq!(report.related_papers[0].id, "ok");
    }

    #[tokio::test]
    async fn test_at_most_three_queries_with_pacing() {
        let source = Arc::new(MockSource::new("m"));
        let (pipeline, sleeper) = pipeline_with(vec![source.clone()]);

        let report = pipeline.analyze(&document_with_citations(5)).await.unwrap();

        assert_eq!(report.existing_citations_count, 5);
        assert_eq!(source.call_count(), 3);
        assert_eq!(sleeper.waits(), vec![Duration::from_millis(1000); 2]);
    }

    #[tokio::test]
    async fn test_results_capped_at_fifteen() {
        let responders: Vec<Arc<MockSource>> = (0..4)
            .map(|s| {
                Arc::new(MockSource::new(format!("s{}", s)).with_responder(move |q| {
                    (0..5)
                        .map(|i| {
                            make_paper(
                                &format!("{}-{}", s, i),
                                &format!("{} from source {} item {}", q.query, s, i),
                                SourceType::CrossRef,
                                0.6,
                            )
                        })
                        .collect()
                }))
            })
            .collect();
        let (pipeline, _) = pipeline_with(responders);

        let report = pipeline.analyze(&document_with_citations(3)).await.unwrap();
        assert_eq!(report.related_papers.len(), 15);
        assert_eq!(report.discovered_citations_count, 15);
    }

    #[tokio::test]
    async fn test_ranked_by_similarity() {
        let source = Arc::new(MockSource::new("m").with_papers(vec![
            make_paper("low", "Low scoring", SourceType::PubMed, 0.55),
            make_paper("high", "High scoring", SourceType::Arxiv, 0.95),
            make_paper("mid", "Mid scoring", SourceType::OpenAlex, 0.75),
        ]));
        let (pipeline, _) = pipeline_with(vec![source]);

        let report = pipeline.analyze(&Document::from_text(APA_REFERENCE).unwrap()).await.unwrap();
        let ids: Vec<&str> = report.related_papers.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["high", "mid", "low"]);
        let label = report.citations[0].text.as_str();
        assert!(report.related_papers.iter().all(|p| p.statement.as_deref() == Some(label)));
    }

    #[tokio::test]
    async fn test_title_used_as_query() {
        let source = Arc::new(MockSource::new("m"));
        let (pipeline, _) = pipeline_with(vec![source.clone()]);

        pipeline.analyze(&Document::from_text(APA_REFERENCE).unwrap()).await.unwrap();
        assert_eq!(source.queries(), vec!["Deep learning methods"]);
    }
}

mod pipeline_tests {
    use super::*;

    #[tokio::test]
    async fn test_statements_drive_queries_without_citations() {
        let source = Arc::new(MockSource::new("m"));
        let (pipeline, _) = pipeline_with(vec![source.clone()]);

        let text = "Research shows that regular exercise improves sleep quality in adults.";
        let report = pipeline.analyze(&Document::from_text(text).unwrap()).await.unwrap();

        assert_eq!(report.existing_citations_count, 0);
        assert!(!report.statements_found.is_empty());
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_statement_queries_can_be_disabled() {
        let mut config = Config::default();
        config.aggregation.query_statements_when_no_citations = false;
        let source = Arc::new(MockSource::new("m"));
        let (pipeline, _) = pipeline_with_config(&config, vec![source.clone()]);

        let text = "Research shows that regular exercise improves sleep quality in adults.";
        pipeline.analyze(&Document::from_text(text).unwrap()).await.unwrap();
        assert_eq!(source.call_count(), 0);
    }

    #[tokio::test]
    async fn test_analysis_is_idempotent() {
        let source = Arc::new(MockSource::new("m").with_papers(vec![
            make_paper("1", "First", SourceType::Arxiv, 0.9),
            make_paper("2", "Second", SourceType::Arxiv, 0.8),
        ]));
        let (pipeline, _) = pipeline_with(vec![source]);
        let doc = Document::from_text(format!("{} Studies show this matters.", APA_REFERENCE)).unwrap();

        let first = serde_json::to_string(&pipeline.analyze(&doc).await.unwrap()).unwrap();
        let second = serde_json::to_string(&pipeline.analyze(&doc).await.unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_report_json_shape() {
        let (pipeline, _) = pipeline_with(Vec::new());
        let report = pipeline.analyze(&Document::from_text("(Jones, 2019)").unwrap()).await.unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["existingCitationsCount"], 1);
        assert_eq!(json["discoveredCitationsCount"], 0);
        assert_eq!(json["textLength"], 13);
        assert!(json["relatedPapers"].as_array().unwrap().is_empty());
        assert!(json.get("pages").is_none());
    }

    #[test]
    fn test_empty_input_is_client_error() {
        let err = Document::from_text("").unwrap_err();
        assert!(matches!(err, PipelineError::EmptyInput));
        assert!(err.is_client_error());
    }
}
