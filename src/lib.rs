//! doe-match - Matching and scoring core for unidentified-person registry search
//!
//! Compares a partial physical and location description against case records
//! from several registries and returns an explainable, deterministic ranking.
//! Output is an advisory ranking, never an identification.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use crate::core::{normalize, Matcher};
pub use error::MatchError;
pub use models::{
    ConfidenceLevel, MatchResult, NumericRange, PersonRecord, Race, RawRecord, SearchCriteria,
    SearchOptions, SearchOutcome, SearchSummary, Sex, SourceId,
};
pub use services::{ProviderRegistry, SearchCoordinator, SourceError, SourceProvider};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let criteria = SearchCriteria::new().with_sex(Sex::Female);
        let record = PersonRecord::unknown(SourceId::from("Test"), "1");

        let result = Matcher::default().score(&criteria, &record).unwrap();
        assert_eq!(result.confidence, 50);
        assert_eq!(result.level, ConfidenceLevel::Low);
    }
}
