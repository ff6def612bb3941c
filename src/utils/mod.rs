//! Utility modules supporting the analysis pipeline.
//!
//! - [`dedup_by_title`]: Drop papers whose title was already reported
//! - [`HttpClient`]: Shared HTTP client with a per-request timeout
//! - [`IntervalScheduler`]: Fixed spacing between query batches over a [`Sleeper`]
//! - [`extract_text`]: Extract text and page count from PDF files
//!
//! # Pacing
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use cite_scout::utils::{IntervalScheduler, RecordingSleeper};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let sleeper = Arc::new(RecordingSleeper::new());
//! let mut scheduler = IntervalScheduler::new(Duration::from_secs(1), sleeper.clone());
//! scheduler.tick().await; // immediate
//! scheduler.tick().await; // waits one interval
//! assert_eq!(sleeper.waits(), vec![Duration::from_secs(1)]);
//! # }
//! ```

mod dedup;
mod http;
mod pacing;
mod pdf;

pub use dedup::{dedup_by_title, find_duplicates};
pub use http::{HttpClient, DEFAULT_TIMEOUT};
pub use pacing::{IntervalScheduler, RecordingSleeper, Sleeper, TokioSleeper};
pub use pdf::{extract_from_bytes, extract_text, is_pdf, page_count, PdfExtractError, PdfText};
