//! Per-attribute comparators
//!
//! Every matcher returns `None` when the criterion is unset: the attribute is
//! neutral and takes no part in aggregation. Otherwise it returns a score in
//! `[0, 1]` with a human-readable reason.

use crate::core::normalize::{canonical_state, place_key};
use crate::core::text::{best_match, split_descriptions};
use crate::models::{
    Attribute, AttributeScore, Location, Measure, NumericRange, PersonRecord, Race,
    ScoringConfig, SearchCriteria, Sex,
};

/// Run every matcher; unset criteria are left out
pub fn evaluate(
    criteria: &SearchCriteria,
    record: &PersonRecord,
    config: &ScoringConfig,
) -> Vec<AttributeScore> {
    let tolerances = &config.tolerances;
    let partial = config.partial_credit;

    [
        score_numeric(
            Attribute::Height,
            criteria.height_in.as_ref(),
            &record.height_in,
            tolerances.height_in,
            partial,
        ),
        score_numeric(
            Attribute::Weight,
            criteria.weight_lb.as_ref(),
            &record.weight_lb,
            tolerances.weight_lb,
            partial,
        ),
        score_race(criteria.race.as_ref(), &record.race, partial),
        score_sex(criteria.sex.as_ref(), &record.sex, partial),
        score_numeric(
            Attribute::Age,
            criteria.age.as_ref(),
            &record.age,
            tolerances.age_years,
            partial,
        ),
        score_location(&criteria.location, &record.location, config),
        score_marks(
            criteria.distinguishing_marks.as_deref(),
            &record.distinguishing_marks,
            config,
        ),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn unit(attribute: Attribute) -> &'static str {
    match attribute {
        Attribute::Height => "in",
        Attribute::Weight => "lb",
        Attribute::Age => "yr",
        _ => "",
    }
}

fn not_documented(attribute: Attribute, partial_credit: f64) -> AttributeScore {
    AttributeScore {
        attribute,
        score: partial_credit,
        reason: format!("{} not documented on record", capitalize(attribute.name())),
    }
}

fn capitalize(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Proportional distance with saturation: `max(0, 1 - gap / tolerance)`
pub fn score_numeric(
    attribute: Attribute,
    criterion: Option<&NumericRange>,
    record: &Measure,
    tolerance: f64,
    partial_credit: f64,
) -> Option<AttributeScore> {
    let criterion = criterion?;
    let label = capitalize(attribute.name());
    let unit = unit(attribute);

    let Some(gap) = criterion.gap_to(record) else {
        return Some(not_documented(attribute, partial_credit));
    };

    let score = (1.0 - gap / tolerance).max(0.0);
    let reason = if gap == 0.0 {
        format!("{} {} {} within {} {}", label, record, unit, criterion, unit)
    } else {
        format!(
            "{} {} {} is {:.1} {} outside {} {}",
            label, record, unit, gap, unit, criterion, unit
        )
    };

    Some(AttributeScore {
        attribute,
        score,
        reason,
    })
}

/// Exact category match or zero
pub fn score_race(criterion: Option<&Race>, record: &Race, partial_credit: f64) -> Option<AttributeScore> {
    let criterion = criterion.filter(|race| race.is_known())?;
    if !record.is_known() {
        return Some(not_documented(Attribute::Race, partial_credit));
    }
    Some(categorical(Attribute::Race, criterion == record, criterion.label(), record.label()))
}

pub fn score_sex(criterion: Option<&Sex>, record: &Sex, partial_credit: f64) -> Option<AttributeScore> {
    let criterion = criterion.filter(|sex| sex.is_known())?;
    if !record.is_known() {
        return Some(not_documented(Attribute::Sex, partial_credit));
    }
    Some(categorical(Attribute::Sex, criterion == record, criterion.label(), record.label()))
}

fn categorical(attribute: Attribute, matched: bool, wanted: &str, found: &str) -> AttributeScore {
    let label = capitalize(attribute.name());
    if matched {
        AttributeScore {
            attribute,
            score: 1.0,
            reason: format!("{} matches ({})", label, found),
        }
    } else {
        AttributeScore {
            attribute,
            score: 0.0,
            reason: format!("{} mismatch: wanted {}, record {}", label, wanted, found),
        }
    }
}

/// Hierarchical location match: city > county > state > none
pub fn score_location(
    criterion: &Location,
    record: &Location,
    config: &ScoringConfig,
) -> Option<AttributeScore> {
    if criterion.is_empty() {
        return None;
    }
    let tiers = &config.location_tiers;

    let wanted_state = criterion.state.as_deref().and_then(canonical_state);
    let found_state = record.state.as_deref().and_then(canonical_state);
    let states_conflict = matches!((&wanted_state, &found_state), (Some(a), Some(b)) if a != b);

    let same_place = |wanted: &Option<String>, found: &Option<String>| match (wanted, found) {
        (Some(a), Some(b)) => place_key(a) == place_key(b),
        _ => false,
    };

    let verdict = if !states_conflict && same_place(&criterion.city, &record.city) {
        Some((tiers.city, format!("Same city ({})", record.city.as_deref().unwrap_or_default())))
    } else if !states_conflict && same_place(&criterion.county, &record.county) {
        Some((
            tiers.county,
            format!("Same county ({})", record.county.as_deref().unwrap_or_default()),
        ))
    } else if wanted_state.is_some() && wanted_state == found_state {
        Some((
            tiers.state,
            format!("Same state ({})", found_state.as_deref().unwrap_or_default()),
        ))
    } else {
        None
    };

    if let Some((score, reason)) = verdict {
        return Some(AttributeScore {
            attribute: Attribute::Location,
            score,
            reason,
        });
    }

    // Only the levels the caller asked about decide between "unknown" and "no match"
    let comparable = (criterion.state.is_some() && record.state.is_some())
        || (criterion.county.is_some() && record.county.is_some())
        || (criterion.city.is_some() && record.city.is_some());

    if !comparable {
        return Some(not_documented(Attribute::Location, config.partial_credit));
    }

    Some(AttributeScore {
        attribute: Attribute::Location,
        score: 0.0,
        reason: format!("Different location ({})", describe_location(record)),
    })
}

fn describe_location(location: &Location) -> String {
    [&location.city, &location.county, &location.state]
        .into_iter()
        .flatten()
        .cloned()
        .collect::<Vec<_>>()
        .join(", ")
}

/// Fuzzy similarity of each described mark to its best counterpart, averaged
pub fn score_marks(
    criterion: Option<&str>,
    record: &[String],
    config: &ScoringConfig,
) -> Option<AttributeScore> {
    let descriptions = split_descriptions(criterion?);
    if descriptions.is_empty() {
        return None;
    }
    if record.is_empty() {
        return Some(not_documented(
            Attribute::DistinguishingMarks,
            config.partial_credit,
        ));
    }

    let mut total = 0.0;
    let mut closest: Option<(f64, &str)> = None;
    for description in &descriptions {
        if let Some((score, text)) = best_match(description, record, config.similarity) {
            total += score;
            if closest.map_or(true, |(best, _)| score > best) {
                closest = Some((score, text));
            }
        }
    }
    let score = total / descriptions.len() as f64;

    let reason = match closest {
        Some((best, text)) if best > 0.0 => {
            format!("Marks similar to \"{}\" (similarity {:.2})", text, score)
        }
        _ => "No similar marks on record".to_string(),
    };

    Some(AttributeScore {
        attribute: Attribute::DistinguishingMarks,
        score,
        reason,
    })
}
