use crate::error::MatchError;
use crate::models::{
    LocationTiers, RetryPolicy, ScoringConfig, ScoringWeights, SearchOptions, SimilarityMethod,
    Tolerances,
};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use validator::Validate;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    /// File-backed sources to register
    #[serde(default)]
    pub sources: Vec<SourceSettings>,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_source_timeout_ms")]
    pub source_timeout_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default = "default_retry_multiplier")]
    pub retry_multiplier: f64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            max_results: default_max_results(),
            source_timeout_ms: default_source_timeout_ms(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            retry_multiplier: default_retry_multiplier(),
        }
    }
}

fn default_min_confidence() -> f64 { 40.0 }
fn default_max_results() -> usize { 50 }
fn default_source_timeout_ms() -> u64 { 10_000 }
fn default_max_retries() -> u32 { 2 }
fn default_retry_backoff_ms() -> u64 { 200 }
fn default_retry_multiplier() -> f64 { 2.0 }

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
    #[serde(default)]
    pub tolerances: TolerancesConfig,
    #[serde(default)]
    pub location: LocationConfig,
    #[serde(default = "default_partial_credit")]
    pub partial_credit: f64,
    #[serde(default)]
    pub similarity: SimilarityMethod,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            weights: WeightsConfig::default(),
            tolerances: TolerancesConfig::default(),
            location: LocationConfig::default(),
            partial_credit: default_partial_credit(),
            similarity: SimilarityMethod::default(),
        }
    }
}

fn default_partial_credit() -> f64 { 0.5 }

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_height_weight")]
    pub height: f64,
    #[serde(default = "default_weight_weight")]
    pub weight: f64,
    #[serde(default = "default_race_weight")]
    pub race: f64,
    #[serde(default = "default_sex_weight")]
    pub sex: f64,
    #[serde(default = "default_age_weight")]
    pub age: f64,
    #[serde(default = "default_location_weight")]
    pub location: f64,
    #[serde(default = "default_marks_weight")]
    pub distinguishing_marks: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            height: default_height_weight(),
            weight: default_weight_weight(),
            race: default_race_weight(),
            sex: default_sex_weight(),
            age: default_age_weight(),
            location: default_location_weight(),
            distinguishing_marks: default_marks_weight(),
        }
    }
}

fn default_height_weight() -> f64 { 0.20 }
fn default_weight_weight() -> f64 { 0.20 }
fn default_race_weight() -> f64 { 0.15 }
fn default_sex_weight() -> f64 { 0.15 }
fn default_age_weight() -> f64 { 0.15 }
fn default_location_weight() -> f64 { 0.10 }
fn default_marks_weight() -> f64 { 0.05 }

#[derive(Debug, Clone, Deserialize)]
pub struct TolerancesConfig {
    #[serde(default = "default_height_tolerance")]
    pub height_in: f64,
    #[serde(default = "default_weight_tolerance")]
    pub weight_lb: f64,
    #[serde(default = "default_age_tolerance")]
    pub age_years: f64,
}

impl Default for TolerancesConfig {
    fn default() -> Self {
        Self {
            height_in: default_height_tolerance(),
            weight_lb: default_weight_tolerance(),
            age_years: default_age_tolerance(),
        }
    }
}

fn default_height_tolerance() -> f64 { 3.0 }
fn default_weight_tolerance() -> f64 { 20.0 }
fn default_age_tolerance() -> f64 { 5.0 }

#[derive(Debug, Clone, Deserialize)]
pub struct LocationConfig {
    #[serde(default = "default_city_score")]
    pub city: f64,
    #[serde(default = "default_county_score")]
    pub county: f64,
    #[serde(default = "default_state_score")]
    pub state: f64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            city: default_city_score(),
            county: default_county_score(),
            state: default_state_score(),
        }
    }
}

fn default_city_score() -> f64 { 1.0 }
fn default_county_score() -> f64 { 0.8 }
fn default_state_score() -> f64 { 0.6 }

/// A JSON file of raw records registered as a source
#[derive(Debug, Clone, Deserialize)]
pub struct SourceSettings {
    pub id: String,
    pub path: PathBuf,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool { true }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "pretty".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with DOE__)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., DOE__SEARCH__MIN_CONFIDENCE -> search.min_confidence
            .add_source(environment())
            .build()?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        settings.try_deserialize()
    }

    pub fn scoring_config(&self) -> ScoringConfig {
        let scoring = &self.scoring;
        ScoringConfig {
            weights: ScoringWeights {
                height: scoring.weights.height,
                weight: scoring.weights.weight,
                race: scoring.weights.race,
                sex: scoring.weights.sex,
                age: scoring.weights.age,
                location: scoring.weights.location,
                distinguishing_marks: scoring.weights.distinguishing_marks,
            },
            tolerances: Tolerances {
                height_in: scoring.tolerances.height_in,
                weight_lb: scoring.tolerances.weight_lb,
                age_years: scoring.tolerances.age_years,
            },
            location_tiers: LocationTiers {
                city: scoring.location.city,
                county: scoring.location.county,
                state: scoring.location.state,
            },
            partial_credit: scoring.partial_credit,
            similarity: scoring.similarity,
        }
    }

    /// Validated search options
    pub fn search_options(&self) -> Result<SearchOptions, MatchError> {
        let search = &self.search;
        let options = SearchOptions {
            min_confidence: search.min_confidence,
            max_results: search.max_results,
            source_timeout: Duration::from_millis(search.source_timeout_ms),
            retry: RetryPolicy {
                max_retries: search.max_retries,
                initial_backoff: Duration::from_millis(search.retry_backoff_ms),
                multiplier: search.retry_multiplier,
            },
            scoring: self.scoring_config(),
        };
        options.validate()?;
        Ok(options)
    }

    /// Sources switched on in configuration
    pub fn enabled_sources(&self) -> impl Iterator<Item = &SourceSettings> {
        self.sources.iter().filter(|source| source.enabled)
    }
}

fn environment() -> Environment {
    Environment::with_prefix("DOE")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
