//! Search request model sent to every source.

use serde::{Deserialize, Serialize};

/// Default number of results requested from each source
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Search query parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Free-text query string
    pub query: String,

    /// Maximum number of results to return
    pub max_results: usize,

    /// Seed for the similarity jitter of this request
    pub seed: u64,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            query: String::new(),
            max_results: DEFAULT_MAX_RESULTS,
            seed: 0,
        }
    }
}

impl SearchQuery {
    /// Create a new search query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Set maximum results
    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    /// Set the jitter seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
