use crate::core::scoring::score_record;
use crate::error::MatchError;
use crate::models::{MatchResult, PersonRecord, ScoringConfig, SearchCriteria, SearchOptions};
use std::collections::HashSet;
use tracing::{debug, error};

/// Result of ranking one batch of canonical records
#[derive(Debug, Default)]
pub struct MatchSet {
    pub matches: Vec<MatchResult>,
    /// Unique records scored
    pub total_candidates: usize,
    /// Matches at or above the minimum confidence, before truncation
    pub above_threshold: usize,
    /// Records skipped because aggregation failed for them
    pub skipped: usize,
    pub duplicates_removed: usize,
}

/// Ranking pipeline over canonical records
///
/// # Pipeline Stages
/// 1. Deduplication by (source, case ID)
/// 2. Attribute matching and aggregation
/// 3. Minimum-confidence filter
/// 4. Sorting and truncation
#[derive(Debug, Clone)]
pub struct Matcher {
    config: ScoringConfig,
}

impl Matcher {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn with_default_config() -> Self {
        Self {
            config: ScoringConfig::default(),
        }
    }

    /// Score a single record
    pub fn score(
        &self,
        criteria: &SearchCriteria,
        record: &PersonRecord,
    ) -> Result<MatchResult, MatchError> {
        score_record(criteria, record, &self.config)
    }

    /// Rank candidate records for the criteria
    ///
    /// # Arguments
    /// * `criteria` - What the caller is looking for; must specify at least one field
    /// * `candidates` - Canonical records from every source, in any order
    /// * `min_confidence` - Results below this confidence are dropped
    /// * `limit` - Maximum number of matches to return
    ///
    /// # Returns
    /// MatchSet sorted by confidence descending, then source, then case ID
    pub fn find_matches(
        &self,
        criteria: &SearchCriteria,
        candidates: Vec<PersonRecord>,
        min_confidence: f64,
        limit: usize,
    ) -> Result<MatchSet, MatchError> {
        criteria.check()?;

        let received = candidates.len();
        let mut seen = HashSet::with_capacity(received);
        let unique: Vec<PersonRecord> = candidates
            .into_iter()
            .filter(|record| seen.insert(record.key()))
            .collect();
        let duplicates_removed = received - unique.len();
        let total_candidates = unique.len();

        let mut skipped = 0;
        let mut scored: Vec<MatchResult> = unique
            .iter()
            .filter_map(|record| match self.score(criteria, record) {
                Ok(result) => Some(result),
                Err(err) => {
                    error!("Skipping candidate {}/{}: {}", record.source, record.case_id, err);
                    skipped += 1;
                    None
                }
            })
            .filter(|result| f64::from(result.confidence) >= min_confidence)
            .collect();
        let above_threshold = scored.len();

        sort_results(&mut scored);
        scored.truncate(limit);

        debug!(
            "Ranked {} candidates: {} above {}, {} duplicates, {} skipped",
            total_candidates, above_threshold, min_confidence, duplicates_removed, skipped
        );

        Ok(MatchSet {
            matches: scored,
            total_candidates,
            above_threshold,
            skipped,
            duplicates_removed,
        })
    }

    /// `find_matches` with the threshold and limit taken from search options
    pub fn rank(
        &self,
        criteria: &SearchCriteria,
        candidates: Vec<PersonRecord>,
        options: &SearchOptions,
    ) -> Result<MatchSet, MatchError> {
        self.find_matches(criteria, candidates, options.min_confidence, options.max_results)
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_config()
    }
}

/// Confidence descending, then source, then case ID
pub fn sort_results(results: &mut [MatchResult]) {
    results.sort_by(|a, b| {
        b.confidence
            .cmp(&a.confidence)
            .then_with(|| a.record.source.cmp(&b.record.source))
            .then_with(|| a.record.case_id.cmp(&b.record.case_id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Measure, NumericRange, Sex, SourceId};

    fn create_candidate(source: &str, case_id: &str, height: f64, sex: Sex) -> PersonRecord {
        let mut record = PersonRecord::unknown(SourceId::from(source), case_id);
        record.height_in = Measure::exact(height);
        record.sex = sex;
        record
    }

    fn create_criteria() -> SearchCriteria {
        SearchCriteria::new()
            .with_height(NumericRange::around(64.0, 2.0))
            .with_sex(Sex::Female)
    }

    #[test]
    fn test_find_matches_basic() {
        let matcher = Matcher::with_default_config();

        let candidates = vec![
            create_candidate("NamUs", "1", 65.0, Sex::Female), // Match
            create_candidate("NamUs", "2", 65.0, Sex::Male),   // Wrong sex, height only
            create_candidate("NamUs", "3", 75.0, Sex::Male),   // Nothing matches
        ];

        let result = matcher.find_matches(&create_criteria(), candidates, 40.0, 10).unwrap();

        assert_eq!(result.total_candidates, 3);
        assert_eq!(result.matches.len(), 2);
        assert_eq!(result.matches[0].record.case_id, "1");
        assert_eq!(result.matches[0].confidence, 100);
        assert_eq!(result.matches[1].record.case_id, "2");
    }

    #[test]
    fn test_matches_sorted_with_deterministic_ties() {
        let matcher = Matcher::with_default_config();

        let candidates = vec![
            create_candidate("NamUs", "b", 65.0, Sex::Female),
            create_candidate("DoeNetwork", "z", 65.0, Sex::Female),
            create_candidate("NamUs", "a", 65.0, Sex::Female),
            create_candidate("NamUs", "c", 66.5, Sex::Female),
        ];

        let result = matcher.find_matches(&create_criteria(), candidates, 0.0, 10).unwrap();
        let order: Vec<(&str, &str)> = result
            .matches
            .iter()
            .map(|m| (m.record.source.as_str(), m.record.case_id.as_str()))
            .collect();

        assert_eq!(
            order,
            vec![("DoeNetwork", "z"), ("NamUs", "a"), ("NamUs", "b"), ("NamUs", "c")]
        );
    }

    #[test]
    fn test_respects_limit() {
        let matcher = Matcher::with_default_config();

        let candidates: Vec<PersonRecord> = (0..20)
            .map(|i| create_candidate("NamUs", &i.to_string(), 60.0 + (i % 6) as f64, Sex::Female))
            .collect();

        let result = matcher.find_matches(&create_criteria(), candidates, 0.0, 5).unwrap();

        assert_eq!(result.matches.len(), 5);
        assert_eq!(result.above_threshold, 20);
    }

    #[test]
    fn test_duplicates_removed() {
        let matcher = Matcher::with_default_config();

        let candidates = vec![
            create_candidate("NamUs", "UP1", 65.0, Sex::Female),
            create_candidate("NamUs", "UP1", 65.0, Sex::Female),
            create_candidate("DoeNetwork", "UP1", 65.0, Sex::Female),
        ];

        let result = matcher.find_matches(&create_criteria(), candidates, 0.0, 10).unwrap();

        assert_eq!(result.duplicates_removed, 1);
        assert_eq!(result.total_candidates, 2);
        assert_eq!(result.matches.len(), 2);
    }

    #[test]
    fn test_aggregation_failure_skips_only_that_candidate() {
        // Undocumented values get a non-finite score under this config
        let matcher = Matcher::new(ScoringConfig {
            partial_credit: f64::NAN,
            ..ScoringConfig::default()
        });

        let mut undocumented = create_candidate("NamUs", "2", 0.0, Sex::Female);
        undocumented.height_in = Measure::Unknown;
        let candidates = vec![
            create_candidate("NamUs", "1", 65.0, Sex::Female),
            undocumented,
            create_candidate("NamUs", "3", 63.0, Sex::Female),
        ];

        let result = matcher.find_matches(&create_criteria(), candidates, 0.0, 10).unwrap();

        assert_eq!(result.skipped, 1);
        assert_eq!(result.total_candidates, 3);
        let ids: Vec<&str> = result.matches.iter().map(|m| m.record.case_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn test_unscorable_range_rejected() {
        let matcher = Matcher::default();
        let criteria = SearchCriteria::new().with_height(NumericRange::exact(f64::NAN));
        let candidates = vec![create_candidate("NamUs", "1", 80.0, Sex::Female)];

        let err = matcher.find_matches(&criteria, candidates, 0.0, 10).unwrap_err();
        assert!(matches!(err, MatchError::InvalidQuery(_)));
    }

    #[test]
    fn test_empty_criteria_rejected_even_without_candidates() {
        let matcher = Matcher::default();
        let err = matcher.find_matches(&SearchCriteria::new(), vec![], 40.0, 10).unwrap_err();
        assert!(matches!(err, MatchError::InvalidQuery(_)));
    }

    #[test]
    fn test_no_matches_is_empty_not_error() {
        let matcher = Matcher::default();
        let candidates = vec![create_candidate("NamUs", "1", 75.0, Sex::Male)];

        let result = matcher.find_matches(&create_criteria(), candidates, 40.0, 10).unwrap();

        assert!(result.matches.is_empty());
        assert_eq!(result.total_candidates, 1);
    }
}
