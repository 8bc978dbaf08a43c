use crate::models::domain::{MatchResult, SourceId};
use serde::{Deserialize, Serialize};

/// Result of a coordinated search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub results: Vec<MatchResult>,
    pub summary: SearchSummary,
}

/// Per-search bookkeeping reported alongside the results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSummary {
    pub sources_queried: Vec<SourceId>,
    pub sources_succeeded: Vec<SourceId>,
    pub sources_failed: Vec<SourceFailure>,
    /// Unique canonical records scored
    pub total_candidates: usize,
    pub duplicates_removed: usize,
    pub records_dropped: usize,
    pub candidates_skipped: usize,
    /// Candidates at or above the minimum confidence, before truncation
    pub candidates_above_threshold: usize,
    pub elapsed_ms: u64,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl SearchSummary {
    /// True when no source could be searched; distinct from "no matches"
    pub fn all_sources_failed(&self) -> bool {
        self.sources_succeeded.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFailure {
    pub source: SourceId,
    pub reason: String,
}
