use crate::models::{RawRecord, SearchCriteria, SourceId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors a source provider can report for one fetch
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    #[error("Source timed out")]
    Timeout,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl SourceError {
    /// Whether a retry might succeed
    pub fn is_transient(&self) -> bool {
        match self {
            SourceError::Timeout => true,
            SourceError::Io(err) => matches!(
                err.kind(),
                std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::WouldBlock
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
            ),
            SourceError::Unavailable(_) | SourceError::Parse(_) => false,
        }
    }
}

/// A registry integration that yields raw candidate records
#[async_trait]
pub trait SourceProvider: Send + Sync {
    /// Registry identifier (e.g. "NamUs", "DoeNetwork")
    fn source_id(&self) -> SourceId;

    /// Fetch raw records that may match the criteria
    ///
    /// Providers may pre-filter on the criteria but are not required to;
    /// every returned record is scored.
    async fn fetch_candidates(&self, criteria: &SearchCriteria)
        -> Result<Vec<RawRecord>, SourceError>;

    /// Look up one case by its source-native ID
    ///
    /// The default scans an unfiltered fetch.
    async fn get_record(&self, case_id: &str) -> Result<Option<RawRecord>, SourceError> {
        let case_id = case_id.trim();
        let records = self.fetch_candidates(&SearchCriteria::default()).await?;
        Ok(records
            .into_iter()
            .find(|record| record.case_id() == Some(case_id)))
    }

    /// Whether the integration can currently be queried
    fn is_available(&self) -> bool {
        true
    }
}

/// Registered providers, in registration order
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn SourceProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider; a later provider with the same ID replaces the earlier one
    pub fn register(&mut self, provider: Arc<dyn SourceProvider>) {
        let id = provider.source_id();
        if let Some(existing) = self.providers.iter_mut().find(|p| p.source_id() == id) {
            tracing::warn!("Replacing registered source {}", id);
            *existing = provider;
        } else {
            tracing::debug!("Registered source {}", id);
            self.providers.push(provider);
        }
    }

    pub fn with(mut self, provider: Arc<dyn SourceProvider>) -> Self {
        self.register(provider);
        self
    }

    pub fn get(&self, id: &SourceId) -> Option<Arc<dyn SourceProvider>> {
        self.providers.iter().find(|p| &p.source_id() == id).cloned()
    }

    pub fn ids(&self) -> Vec<SourceId> {
        self.providers.iter().map(|p| p.source_id()).collect()
    }

    pub fn available(&self) -> Vec<SourceId> {
        self.providers
            .iter()
            .filter(|p| p.is_available())
            .map(|p| p.source_id())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry").field("sources", &self.ids()).finish()
    }
}
