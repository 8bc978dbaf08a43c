// Model exports
pub mod domain;
pub mod raw;
pub mod requests;
pub mod responses;

pub use domain::{
    Attribute, AttributeScore, CaseNotes, ConfidenceLevel, Location, MatchResult, Measure, NumericRange,
    PersonRecord, Race, SearchCriteria, Sex, SourceId,
};
pub use raw::{
    CanonicalCase, DoeNetworkCase, LengthUnit, MassUnit, NamUsArticle, NamUsCase,
    NamUsCircumstances, NamUsFeature, NamUsSubject, NamedValue, RawRecord,
};
pub use requests::{
    LocationTiers, RetryPolicy, ScoringConfig, ScoringWeights, SearchOptions, SimilarityMethod,
    Tolerances,
};
pub use responses::{SearchOutcome, SearchSummary, SourceFailure};
