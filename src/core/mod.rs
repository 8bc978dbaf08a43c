// Core algorithm exports
pub mod matcher;
pub mod matchers;
pub mod normalize;
pub mod scoring;
pub mod text;

pub use matcher::{sort_results, MatchSet, Matcher};
pub use matchers::evaluate;
pub use normalize::{
    canonical_state, normalize, parse_age_text, parse_height_text, parse_weight_text,
};
pub use scoring::{aggregate, score_record};
pub use text::similarity;
