//! # Cite Scout
//!
//! Finds the citations and claims in a document and looks for academic papers
//! that corroborate them across arXiv, OpenAlex, CrossRef and PubMed.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (Citation, Statement, RelatedPaper, AnalysisReport)
//! - [`extract`]: Citation pattern matching, field normalization, statement detection
//! - [`sources`]: Academic source adapters behind the [`Source`] trait
//! - [`aggregate`]: Concurrent fan-out, dedup and ranking of source results
//! - [`pipeline`]: Document in, [`AnalysisReport`] out
//! - [`utils`]: HTTP client, pacing, deduplication, PDF text
//! - [`config`]: Configuration management
//!
//! ## Example
//!
//! ```rust,no_run
//! use cite_scout::config::Config;
//! use cite_scout::pipeline::{Document, Pipeline};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = Pipeline::from_config(&Config::default())?;
//! let doc = Document::from_text("Smith, J. (2020). Deep learning methods. Journal of AI, 5(2), 10-20.")?;
//! let report = pipeline.analyze(&doc).await?;
//! println!("{} related papers", report.discovered_citations_count);
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod config;
pub mod extract;
pub mod models;
pub mod pipeline;
pub mod sources;
pub mod utils;

// Re-export commonly used types
pub use models::{AnalysisReport, Citation, RelatedPaper, Statement};
pub use pipeline::{Document, Pipeline, PipelineError};
pub use sources::{Source, SourceRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
