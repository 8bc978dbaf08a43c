use crate::models::SourceId;
use thiserror::Error;

/// Errors surfaced by the matching core
#[derive(Debug, Error)]
pub enum MatchError {
    /// No criteria field was specified; fatal to the call
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid search options: {0}")]
    InvalidOptions(String),

    /// A provider failed or timed out; recovered by the coordinator
    #[error("Source {source_id} unavailable: {reason}")]
    SourceUnavailable { source_id: SourceId, reason: String },

    /// One malformed record; recovered by dropping the record
    #[error("Failed to normalize record from {source_id}: {reason}")]
    RecordNormalization { source_id: SourceId, reason: String },

    /// Contract violation while aggregating one candidate
    #[error("Aggregation failed for {source_id}/{case_id}: {reason}")]
    Aggregation {
        source_id: SourceId,
        case_id: String,
        reason: String,
    },

    #[error("Search cancelled")]
    Cancelled,
}

impl MatchError {
    pub fn empty_query() -> Self {
        MatchError::InvalidQuery("no search criteria specified".to_string())
    }
}

impl From<validator::ValidationErrors> for MatchError {
    fn from(errors: validator::ValidationErrors) -> Self {
        MatchError::InvalidOptions(errors.to_string())
    }
}
