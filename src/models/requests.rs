use crate::models::domain::Attribute;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::{Validate, ValidationError};

/// Default minimum confidence (0-100) a result needs to be returned
pub const DEFAULT_MIN_CONFIDENCE: f64 = 40.0;
/// Default number of results returned per search
pub const DEFAULT_MAX_RESULTS: usize = 50;
/// Default per-source fetch timeout
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(10);

/// Options for one search call
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct SearchOptions {
    #[validate(range(min = 0.0, max = 100.0))]
    pub min_confidence: f64,
    #[validate(range(min = 1))]
    pub max_results: usize,
    #[validate(custom(function = "validate_timeout"))]
    pub source_timeout: Duration,
    #[validate(nested)]
    pub retry: RetryPolicy,
    #[validate(nested)]
    pub scoring: ScoringConfig,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            max_results: DEFAULT_MAX_RESULTS,
            source_timeout: DEFAULT_SOURCE_TIMEOUT,
            retry: RetryPolicy::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

fn validate_timeout(timeout: &Duration) -> Result<(), ValidationError> {
    if timeout.is_zero() {
        return Err(ValidationError::new("timeout_must_be_positive"));
    }
    Ok(())
}

/// Bounded retry with exponential backoff for transient fetch failures
#[derive(Debug, Clone, Copy, PartialEq, Validate)]
pub struct RetryPolicy {
    #[validate(range(max = 10))]
    pub max_retries: u32,
    pub initial_backoff: Duration,
    #[validate(range(min = 1.0, max = 10.0))]
    pub multiplier: f64,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        self.initial_backoff.mul_f64(self.multiplier.powi(exponent))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_millis(200),
            multiplier: 2.0,
        }
    }
}

/// Everything the attribute matchers and aggregator are parameterized by
#[derive(Debug, Clone, Copy, PartialEq, Validate)]
pub struct ScoringConfig {
    #[validate(nested)]
    pub weights: ScoringWeights,
    #[validate(nested)]
    pub tolerances: Tolerances,
    #[validate(nested)]
    pub location_tiers: LocationTiers,
    /// Score for a specified criterion whose record value is unknown
    #[validate(range(exclusive_min = 0.0, exclusive_max = 1.0))]
    pub partial_credit: f64,
    pub similarity: SimilarityMethod,
}

impl ScoringConfig {
    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_similarity(mut self, similarity: SimilarityMethod) -> Self {
        self.similarity = similarity;
        self
    }
}

/// Default partial credit for undocumented record fields
pub const DEFAULT_PARTIAL_CREDIT: f64 = 0.5;

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            tolerances: Tolerances::default(),
            location_tiers: LocationTiers::default(),
            partial_credit: DEFAULT_PARTIAL_CREDIT,
            similarity: SimilarityMethod::default(),
        }
    }
}

/// Per-attribute weights
#[derive(Debug, Clone, Copy, PartialEq, Validate)]
pub struct ScoringWeights {
    #[validate(range(exclusive_min = 0.0))]
    pub height: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub weight: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub race: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub sex: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub age: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub location: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub distinguishing_marks: f64,
}

impl ScoringWeights {
    pub fn for_attribute(&self, attribute: Attribute) -> f64 {
        match attribute {
            Attribute::Height => self.height,
            Attribute::Weight => self.weight,
            Attribute::Race => self.race,
            Attribute::Sex => self.sex,
            Attribute::Age => self.age,
            Attribute::Location => self.location,
            Attribute::DistinguishingMarks => self.distinguishing_marks,
        }
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            height: 0.20,
            weight: 0.20,
            race: 0.15,
            sex: 0.15,
            age: 0.15,
            location: 0.10,
            distinguishing_marks: 0.05,
        }
    }
}

/// Distance at which a numeric attribute's score reaches zero
#[derive(Debug, Clone, Copy, PartialEq, Validate)]
pub struct Tolerances {
    /// Inches
    #[validate(range(exclusive_min = 0.0))]
    pub height_in: f64,
    /// Pounds
    #[validate(range(exclusive_min = 0.0))]
    pub weight_lb: f64,
    /// Years
    #[validate(range(exclusive_min = 0.0))]
    pub age_years: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            height_in: 3.0,
            weight_lb: 20.0,
            age_years: 5.0,
        }
    }
}

/// Scores for each level of the location hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Validate)]
#[validate(schema(function = "validate_tier_order"))]
pub struct LocationTiers {
    #[validate(range(min = 0.0, max = 1.0))]
    pub city: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub county: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub state: f64,
}

impl Default for LocationTiers {
    fn default() -> Self {
        Self {
            city: 1.0,
            county: 0.8,
            state: 0.6,
        }
    }
}

fn validate_tier_order(tiers: &LocationTiers) -> Result<(), ValidationError> {
    if tiers.city > tiers.county && tiers.county > tiers.state && tiers.state > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::new("location_tiers_must_descend"))
    }
}

/// How distinguishing-mark descriptions are compared
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMethod {
    /// Share of query words found (fuzzily) in the record text
    #[default]
    TokenOverlap,
    /// Normalized edit distance over the cleaned phrases
    Levenshtein,
    JaroWinkler,
}
