use crate::core::matchers::evaluate;
use crate::error::MatchError;
use crate::models::{
    AttributeScore, ConfidenceLevel, MatchResult, PersonRecord, ScoringConfig, SearchCriteria,
};
use std::collections::HashSet;

/// Score one record against the criteria (matchers + aggregation)
pub fn score_record(
    criteria: &SearchCriteria,
    record: &PersonRecord,
    config: &ScoringConfig,
) -> Result<MatchResult, MatchError> {
    let attribute_scores = evaluate(criteria, record, config);
    aggregate(criteria, record, attribute_scores, config)
}

/// Combine per-attribute scores into one confidence value (0-100)
///
/// Confidence formula, over specified attributes only:
/// confidence = round(
///     100 * Σ(weight_i * score_i) / Σ(weight_i)
/// )
///
/// Normalizing by the specified weights means a query with two fields is
/// not penalized against a query with seven.
pub fn aggregate(
    criteria: &SearchCriteria,
    record: &PersonRecord,
    mut attribute_scores: Vec<AttributeScore>,
    config: &ScoringConfig,
) -> Result<MatchResult, MatchError> {
    criteria.check()?;
    let specified = criteria.specified_attributes();

    let contract_violation = |reason: String| MatchError::Aggregation {
        source_id: record.source.clone(),
        case_id: record.case_id.clone(),
        reason,
    };

    let mut seen = HashSet::new();
    for entry in &attribute_scores {
        if !specified.contains(&entry.attribute) {
            return Err(contract_violation(format!(
                "score for unspecified attribute {}",
                entry.attribute
            )));
        }
        if !seen.insert(entry.attribute) {
            return Err(contract_violation(format!(
                "duplicate score for {}",
                entry.attribute
            )));
        }
        if !entry.score.is_finite() || !(0.0..=1.0).contains(&entry.score) {
            return Err(contract_violation(format!(
                "{} score {} outside [0, 1]",
                entry.attribute, entry.score
            )));
        }
    }
    if let Some(missing) = specified.iter().find(|attribute| !seen.contains(*attribute)) {
        return Err(contract_violation(format!("no score for {}", missing)));
    }

    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    for entry in &attribute_scores {
        let weight = config.weights.for_attribute(entry.attribute);
        if !weight.is_finite() || weight <= 0.0 {
            return Err(contract_violation(format!(
                "non-positive weight {} for {}",
                weight, entry.attribute
            )));
        }
        weighted_sum += weight * entry.score;
        total_weight += weight;
    }

    let confidence = (100.0 * weighted_sum / total_weight).round().clamp(0.0, 100.0) as u8;

    // Stable: equal scores keep canonical attribute order
    attribute_scores.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.attribute.cmp(&b.attribute))
    });

    Ok(MatchResult {
        record: record.clone(),
        confidence,
        level: ConfidenceLevel::from_score(confidence),
        attributes: attribute_scores,
    })
}
