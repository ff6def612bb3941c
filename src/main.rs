use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use cite_scout::config::{find_config_file, load_config, Config};
use cite_scout::models::{AnalysisReport, Citation, RelatedPaper, Statement};
use cite_scout::pipeline::{seed_for, Document, Pipeline};
use cite_scout::sources::SourceRegistry;
use cite_scout::utils::{dedup_by_title, TokioSleeper};
use comfy_table::{Attribute, Cell, Table};
use is_terminal::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Cite Scout - find citations and claims in a document and look up supporting papers
#[derive(Parser, Debug)]
#[command(name = "cite-scout")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Find citations and claims in a document and look up supporting papers", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract citations and statements, then search sources for related papers
    #[command(alias = "a")]
    Analyze {
        /// File to analyze (PDF or text), or the text itself with --text
        input: String,

        /// Treat INPUT as the document text rather than a path
        #[arg(long)]
        text: bool,

        /// Fixed seed for similarity scores (default: derived from the text)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Extract citations and statements only (no network)
    #[command(alias = "x")]
    Extract {
        /// File to analyze (PDF or text), or the text itself with --text
        input: String,

        /// Treat INPUT as the document text rather than a path
        #[arg(long)]
        text: bool,
    },

    /// Search every enabled source for one query
    #[command(alias = "s")]
    Search {
        /// Search query string
        query: String,

        /// Maximum number of results per source
        #[arg(long, short)]
        max_results: Option<usize>,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(Some(path.as_path()))
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => load_config(None).context("Failed to load configuration")?,
    };

    init_tracing(&cli, &config);

    if cli.config.is_none() {
        if let Some(path) = find_config_file() {
            tracing::debug!("Using config file: {}", path.display());
        }
    }

    match cli.command {
        Commands::Analyze { input, text, seed } => {
            let document = read_document(&input, text)?;
            let pipeline = Pipeline::from_config(&config)?;
            let seed = seed.unwrap_or_else(|| seed_for(&document.text));
            let report = pipeline.analyze_with_seed(&document, seed).await?;
            output_report(&report, cli.output)?;
        }
        Commands::Extract { input, text } => {
            let document = read_document(&input, text)?;
            let pipeline = Pipeline::new(&config, Arc::new(SourceRegistry::new()), Arc::new(TokioSleeper))?;
            let extraction = pipeline.extract(&document)?;
            output_extraction(&extraction.citations, &extraction.statements, cli.output)?;
        }
        Commands::Search { query, max_results } => {
            if let Some(max) = max_results {
                config.sources.max_results = max;
            }
            let pipeline = Pipeline::from_config(&config)?;
            let aggregator = pipeline.aggregator();
            let papers = aggregator
                .search_all(&query, seed_for(&query), aggregator.settings().call_timeout)
                .await;
            let papers = dedup_by_title(papers);
            output_papers(&papers, cli.output)?;
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

fn init_tracing(cli: &Cli, config: &Config) {
    let level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => config.logging.level.as_str(),
        (false, 1) => "debug",
        (false, _) => "trace",
    };

    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("cite_scout={}", level)),
    );

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format.as_deref() == Some("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn read_document(input: &str, literal: bool) -> Result<Document> {
    let document = if literal {
        Document::from_text(input)?
    } else {
        let path = PathBuf::from(input);
        Document::from_path(&path).with_context(|| format!("Failed to read {}", path.display()))?
    };
    Ok(document)
}

fn resolve_format(format: OutputFormat) -> OutputFormat {
    match format {
        OutputFormat::Auto if std::io::stdout().is_terminal() => OutputFormat::Table,
        OutputFormat::Auto => OutputFormat::Json,
        other => other,
    }
}

fn output_report(report: &AnalysisReport, format: OutputFormat) -> Result<()> {
    match resolve_format(format) {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        _ => {
            println!(
                "{} characters{}, {} citations found, {} related papers",
                report.text_length,
                report
                    .pages
                    .map(|p| format!(" over {} pages", p))
                    .unwrap_or_default(),
                report.existing_citations_count,
                report.discovered_citations_count
            );
            if !report.citations.is_empty() {
                println!("{}", citation_table(&report.citations));
            }
            if !report.statements_found.is_empty() {
                println!("Statements needing support:");
                for statement in &report.statements_found {
                    println!("  - {}", statement);
                }
            }
            if !report.related_papers.is_empty() {
                println!("{}", paper_table(&report.related_papers));
            }
        }
    }
    Ok(())
}

fn output_extraction(citations: &[Citation], statements: &[Statement], format: OutputFormat) -> Result<()> {
    match resolve_format(format) {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "citations": citations,
                "statements": statements,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        _ => {
            println!("{}", citation_table(citations));
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["Statement", "Offset", "Confidence"]);
            for statement in statements {
                table.add_row(vec![
                    Cell::new(ellipsize(&statement.text, 70)),
                    Cell::new(statement.start_index),
                    Cell::new(format!("{:.2}", statement.confidence)),
                ]);
            }
            println!("{table}");
        }
    }
    Ok(())
}

fn output_papers(papers: &[RelatedPaper], format: OutputFormat) -> Result<()> {
    match resolve_format(format) {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(papers)?),
        _ => println!("{}", paper_table(papers)),
    }
    Ok(())
}

fn citation_table(citations: &[Citation]) -> Table {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Id", "Citation", "Authors", "Year", "Confidence"]);

    for citation in citations {
        table.add_row(vec![
            Cell::new(&citation.id).add_attribute(Attribute::Bold),
            Cell::new(ellipsize(&citation.text, 50)),
            Cell::new(ellipsize(citation.authors.as_deref().unwrap_or(""), 30)),
            Cell::new(citation.year.as_deref().unwrap_or("")),
            Cell::new(format!("{:.2}", citation.confidence)),
        ]);
    }
    table
}

fn paper_table(papers: &[RelatedPaper]) -> Table {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Title", "Authors", "Source", "Year", "Similarity"]);

    for paper in papers {
        table.add_row(vec![
            Cell::new(ellipsize(&paper.title, 50)).add_attribute(Attribute::Bold),
            Cell::new(ellipsize(&paper.authors.join("; "), 30)),
            Cell::new(paper.source.to_string()),
            Cell::new(paper.year.map(|y| y.to_string()).unwrap_or_default()),
            Cell::new(format!("{}%", paper.similarity_percent())),
        ]);
    }
    table
}

/// Shorten to `max` characters, marking the cut
fn ellipsize(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_version() {
        let version = env!("CARGO_PKG_VERSION");
        let parts: Vec<&str> = version.split('.').collect();
        assert!(parts.len() >= 2);
        assert!(parts[0].parse::<u32>().is_ok());
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::parse_from(["cite-scout", "-vv", "-o", "json", "config"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.output, OutputFormat::Json);
        assert!(!cli.quiet);
        assert!(matches!(cli.command, Commands::Config));
    }

    #[test]
    fn test_cli_config_flag() {
        let cli = Cli::parse_from(["cite-scout", "--config", "/path/to/config.toml", "config"]);
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/config.toml")));
    }

    #[test]
    fn test_cli_analyze_command() {
        let cli = Cli::parse_from(["cite-scout", "analyze", "paper.pdf"]);
        match cli.command {
            Commands::Analyze { input, text, seed } => {
                assert_eq!(input, "paper.pdf");
                assert!(!text);
                assert_eq!(seed, None);
            }
            _ => panic!("Expected Analyze command"),
        }

        let cli = Cli::parse_from(["cite-scout", "a", "(Jones, 2019)", "--text", "--seed", "7"]);
        assert!(matches!(
            cli.command,
            Commands::Analyze { text: true, seed: Some(7), .. }
        ));
    }

    #[test]
    fn test_cli_extract_and_search() {
        let cli = Cli::parse_from(["cite-scout", "extract", "notes.txt", "-q"]);
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::Extract { text: false, .. }));

        let cli = Cli::parse_from(["cite-scout", "search", "deep learning", "--max-results", "3"]);
        match cli.command {
            Commands::Search { query, max_results } => {
                assert_eq!(query, "deep learning");
                assert_eq!(max_results, Some(3));
            }
            _ => panic!("Expected Search command"),
        }
    }

    #[test]
    fn test_cli_requires_command() {
        assert!(Cli::try_parse_from(["cite-scout"]).is_err());
    }

    #[test]
    fn test_ellipsize() {
        assert_eq!(ellipsize("short", 10), "short");
        assert_eq!(ellipsize("ééééééééééé", 6), "ééé...");
    }
}
