//! Registry for the configured academic sources.

use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "source-arxiv")]
use super::ArxivSource;
#[cfg(feature = "source-crossref")]
use super::CrossRefSource;
#[cfg(feature = "source-openalex")]
use super::OpenAlexSource;
#[cfg(feature = "source-pubmed")]
use super::PubMedSource;
use super::{Source, SourceError};
use crate::config::SourcesConfig;
use crate::utils::HttpClient;

/// Source ids in merge-priority order
pub const SOURCE_ORDER: [&str; 4] = ["arxiv", "openalex", "crossref", "pubmed"];

/// Ordered collection of sources.
///
/// Registration order is query order and merge priority: when two sources
/// report the same title, the one registered first wins.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn Source>>,
}

impl SourceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the sources enabled in `config`, in canonical order
    pub fn from_config(config: &SourcesConfig) -> Result<Self, SourceError> {
        let client = HttpClient::with_timeout(Duration::from_secs(config.timeout_secs))?;
        let mut registry = Self::new();

        for id in &config.enabled {
            if !SOURCE_ORDER.contains(&id.as_str()) {
                tracing::warn!("Unknown source '{}' in configuration, ignoring", id);
            }
        }

        for id in SOURCE_ORDER {
            if !config.enabled.iter().any(|e| e.eq_ignore_ascii_case(id)) {
                tracing::debug!("Source '{}' disabled by configuration", id);
                continue;
            }
            match build_source(id, &client, config) {
                Some(source) => registry.register(source),
                None => tracing::warn!("Source '{}' is not compiled into this build", id),
            }
        }

        tracing::debug!("Registered sources: {:?}", registry.ids().collect::<Vec<_>>());
        Ok(registry)
    }

    /// Register a new source; a source with the same id is replaced in place
    pub fn register(&mut self, source: Arc<dyn Source>) {
        match self.sources.iter_mut().find(|s| s.id() == source.id()) {
            Some(slot) => *slot = source,
            None => self.sources.push(source),
        }
    }

    /// Get a source by ID
    pub fn get(&self, id: &str) -> Option<&Arc<dyn Source>> {
        self.sources.iter().find(|s| s.id() == id)
    }

    /// Get all registered sources, in order
    pub fn all(&self) -> impl Iterator<Item = &Arc<dyn Source>> {
        self.sources.iter()
    }

    /// Get all source IDs, in order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|s| s.id())
    }

    /// Check if a source exists
    pub fn has(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[allow(unused_variables)]
fn build_source(id: &str, client: &HttpClient, config: &SourcesConfig) -> Option<Arc<dyn Source>> {
    match id {
        #[cfg(feature = "source-arxiv")]
        "arxiv" => Some(Arc::new(ArxivSource::new(client.clone()))),
        #[cfg(feature = "source-openalex")]
        "openalex" => Some(Arc::new(
            OpenAlexSource::new(client.clone()).with_email(config.mailto.clone()),
        )),
        #[cfg(feature = "source-crossref")]
        "crossref" => Some(Arc::new(CrossRefSource::new(client.clone()))),
        #[cfg(feature = "source-pubmed")]
        "pubmed" => Some(Arc::new(PubMedSource::new(client.clone()))),
        _ => None,
    }
}
