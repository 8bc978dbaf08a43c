//! Normalization of source-native records into canonical [`PersonRecord`]s
//!
//! Every field is parsed independently. A field that cannot be understood
//! becomes `Unknown` (or `None` for text fields) and the record is still
//! produced; only a record without a case identifier is rejected.

use crate::error::MatchError;
use crate::models::{
    CanonicalCase, CaseNotes, DoeNetworkCase, LengthUnit, Location, MassUnit, Measure,
    NamUsCase, PersonRecord, Race, RawRecord, Sex, SourceId,
};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

pub const CM_PER_INCH: f64 = 2.54;
pub const LB_PER_KG: f64 = 2.204_622_6;

/// Plausible adult/child height bounds in inches
const HEIGHT_BOUNDS_IN: (f64, f64) = (12.0, 108.0);
const WEIGHT_BOUNDS_LB: (f64, f64) = (1.0, 1000.0);
const AGE_BOUNDS_YEARS: (f64, f64) = (0.0, 120.0);

static RANGE_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*(?:-|–|—|\bto\b|\bthrough\b)\s*").expect("valid regex"));

static FEET_INCHES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(\d+(?:\.\d+)?)\s*(?:'|ft\.?|feet|foot)\s*(?:(\d+(?:\.\d+)?)\s*(?:"|''|in\.?|inches|inch)?)?$"#)
        .expect("valid regex")
});

static SPACED_FEET_INCHES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([3-8])\s+(\d{1,2})$").expect("valid regex"));

static NUMBER_WITH_UNIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(\d+(?:\.\d+)?)\s*(cm|centimeters?|"|in\.?|inches|inch|m|meters?|kg|kgs|kilograms?|lbs?\.?|pounds?)?$"#)
        .expect("valid regex")
});

static FIRST_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)").expect("valid regex"));

static DECADE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:(early|mid|late)[\s-]*)?(\d)0\s*'?s\b").expect("valid regex")
});

static SUB_YEAR_UNIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(months?|mos?|weeks?|wks?|days?)\b").expect("valid regex")
});

/// Convert one raw record into a canonical record
pub fn normalize(raw: RawRecord, source: &SourceId) -> Result<PersonRecord, MatchError> {
    let case_id = raw
        .case_id()
        .map(str::to_string)
        .ok_or_else(|| MatchError::RecordNormalization {
            source_id: source.clone(),
            reason: "record has no case identifier".to_string(),
        })?;

    let record = match raw {
        RawRecord::NamUs(case) => normalize_namus(case, source.clone(), case_id),
        RawRecord::DoeNetwork(case) => normalize_doe_network(case, source.clone(), case_id),
        RawRecord::Canonical(case) => normalize_canonical(case, source.clone(), case_id),
    };

    tracing::trace!(
        source = %record.source,
        case_id = %record.case_id,
        height = %record.height_in,
        weight = %record.weight_lb,
        age = %record.age,
        "Normalized record"
    );

    Ok(record)
}

fn normalize_namus(case: NamUsCase, source: SourceId, case_id: String) -> PersonRecord {
    let subject = case.subject_description;
    let circumstances = case.circumstances;

    let ethnicities: Vec<String> = subject
        .ethnicities
        .into_iter()
        .filter_map(|value| value.name)
        .collect();

    let marks = case
        .physical_feature_descriptions
        .into_iter()
        .filter_map(|feature| {
            let kind = feature.physical_feature.and_then(|f| f.name);
            let description = feature.description.filter(|d| !is_blank_or_unknown(d));
            match (kind, description) {
                (Some(kind), Some(description)) => Some(format!("{}: {}", kind, description)),
                (None, Some(description)) => Some(description),
                _ => None,
            }
        })
        .collect();

    let clothing: Vec<String> = case
        .clothing_and_accessories_articles
        .into_iter()
        .filter_map(|item| {
            let kind = item.article.and_then(|a| a.name);
            let description = item.description.filter(|d| !is_blank_or_unknown(d));
            match (kind, description) {
                (Some(kind), Some(description)) => Some(format!("{}: {}", kind, description)),
                (None, Some(description)) => Some(description),
                _ => None,
            }
        })
        .collect();

    let url = case
        .id_formatted
        .as_deref()
        .map(|id| id.trim_start_matches(|c: char| c.is_ascii_alphabetic()))
        .filter(|number| !number.is_empty())
        .map(|number| format!("https://www.namus.gov/UnidentifiedPersons/Case#/{}", number));

    PersonRecord {
        source,
        case_id,
        case_url: url,
        height_in: bounded(
            Measure::from_bounds(subject.height_from, subject.height_to),
            HEIGHT_BOUNDS_IN,
        ),
        weight_lb: bounded(
            Measure::from_bounds(subject.weight_from, subject.weight_to),
            WEIGHT_BOUNDS_LB,
        ),
        age: bounded(
            Measure::from_bounds(subject.estimated_age_from, subject.estimated_age_to),
            AGE_BOUNDS_YEARS,
        ),
        race: map_races(&ethnicities),
        sex: subject
            .sex
            .and_then(|sex| sex.name)
            .map(|name| map_sex(&name))
            .unwrap_or_default(),
        distinguishing_marks: marks,
        location: Location {
            state: circumstances
                .state
                .and_then(|state| state.name)
                .and_then(|state| canonical_state(&state)),
            county: circumstances
                .county
                .and_then(|county| county.name)
                .and_then(|county| clean_place(&county)),
            city: circumstances.city.and_then(|city| clean_place(&city)),
        },
        date_found: circumstances.date_found.as_deref().and_then(parse_date),
        notes: CaseNotes {
            hair_color: note(subject.hair_color.and_then(|value| value.name)),
            eye_color: note(subject.left_eye_color.and_then(|value| value.name)),
            circumstances: note(circumstances.circumstances_of_recovery),
            clothing_description: note(Some(clothing.join("; "))),
        },
    }
}

fn normalize_doe_network(case: DoeNetworkCase, source: SourceId, case_id: String) -> PersonRecord {
    let mut location = case
        .location
        .as_deref()
        .map(parse_location_text)
        .unwrap_or_default();
    if let Some(state) = case.state.as_deref().and_then(canonical_state) {
        location.state = Some(state);
    }

    PersonRecord {
        source,
        case_id,
        case_url: case.url.filter(|url| !url.trim().is_empty()),
        height_in: case.height.as_deref().map(parse_height_text).unwrap_or_default(),
        weight_lb: case.weight.as_deref().map(parse_weight_text).unwrap_or_default(),
        age: case.age.as_deref().map(parse_age_text).unwrap_or_default(),
        race: case.race.as_deref().map(map_race).unwrap_or_default(),
        sex: case.sex.as_deref().map(map_sex).unwrap_or_default(),
        distinguishing_marks: case
            .distinguishing_marks
            .as_deref()
            .map(split_marks)
            .unwrap_or_default(),
        location,
        date_found: case.date_found.as_deref().and_then(parse_date),
        notes: CaseNotes {
            hair_color: note(case.hair),
            eye_color: note(case.eyes),
            circumstances: note(case.circumstances),
            clothing_description: note(case.clothing),
        },
    }
}

fn normalize_canonical(case: CanonicalCase, source: SourceId, case_id: String) -> PersonRecord {
    let height_factor = match case.height_unit {
        LengthUnit::Inches => 1.0,
        LengthUnit::Centimeters => 1.0 / CM_PER_INCH,
    };
    let weight_factor = match case.weight_unit {
        MassUnit::Pounds => 1.0,
        MassUnit::Kilograms => LB_PER_KG,
    };

    PersonRecord {
        source,
        case_id,
        case_url: case.case_url,
        height_in: bounded(
            Measure::from_bounds(case.height_min, case.height_max).scaled(height_factor),
            HEIGHT_BOUNDS_IN,
        ),
        weight_lb: bounded(
            Measure::from_bounds(case.weight_min, case.weight_max).scaled(weight_factor),
            WEIGHT_BOUNDS_LB,
        ),
        age: bounded(Measure::from_bounds(case.age_min, case.age_max), AGE_BOUNDS_YEARS),
        race: case.race.as_deref().map(map_race).unwrap_or_default(),
        sex: case.sex.as_deref().map(map_sex).unwrap_or_default(),
        distinguishing_marks: case
            .distinguishing_marks
            .into_iter()
            .filter(|mark| !is_blank_or_unknown(mark))
            .map(|mark| mark.trim().to_string())
            .collect(),
        location: Location {
            state: case.state.as_deref().and_then(canonical_state),
            county: case.county.as_deref().and_then(clean_place),
            city: case.city.as_deref().and_then(clean_place),
        },
        date_found: case.date_found,
        notes: CaseNotes {
            hair_color: note(case.hair_color),
            eye_color: note(case.eye_color),
            circumstances: note(case.circumstances),
            clothing_description: note(case.clothing_description),
        },
    }
}

/// Drop measures outside physically plausible bounds
fn bounded(measure: Measure, (lo, hi): (f64, f64)) -> Measure {
    match measure.bounds() {
        Some((min, max)) if min >= lo && max <= hi => measure,
        Some(_) => Measure::Unknown,
        None => measure,
    }
}

/// Trimmed pass-through text; blank and "unknown" become `None`
fn note(text: Option<String>) -> Option<String> {
    text.filter(|text| !is_blank_or_unknown(text))
        .map(|text| text.trim().to_string())
}

fn is_blank_or_unknown(text: &str) -> bool {
    let lowered = text.trim().to_lowercase();
    matches!(
        lowered.as_str(),
        "" | "unknown" | "unk" | "n/a" | "na" | "none" | "not available" | "uncertain" | "-"
    )
}

fn clean_place(text: &str) -> Option<String> {
    if is_blank_or_unknown(text) {
        return None;
    }
    Some(text.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Split on range separators (`-`, `–`, `—`, `to`, `through`)
fn split_range(text: &str) -> Vec<&str> {
    RANGE_SEPARATOR
        .splitn(text, 2)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

fn normalize_quotes(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .replace(['’', '′', '‘'], "'")
        .replace(['”', '″', '“'], "\"")
}

fn to_measure(parts: Vec<Option<f64>>) -> Measure {
    match parts.as_slice() {
        [Some(value)] => Measure::exact(*value),
        [Some(lo), Some(hi)] => Measure::range(*lo, *hi),
        [Some(value), None] | [None, Some(value)] => Measure::exact(*value),
        _ => Measure::Unknown,
    }
}

/// Parse a height description into inches
///
/// Accepts `5'4"`, `5 ft 4 in`, `5 4`, `64"`, `64 in`, `163 cm`, `1.63 m` and
/// ranges of those. Unitless values above 96 are read as centimeters.
pub fn parse_height_text(text: &str) -> Measure {
    let cleaned = normalize_quotes(text);
    if is_blank_or_unknown(&cleaned) {
        return Measure::Unknown;
    }
    let metric = cleaned.contains("cm") || cleaned.contains("centimet");

    let parts = split_range(&cleaned)
        .into_iter()
        .map(|part| parse_length_part(part, metric))
        .collect();
    bounded(to_measure(parts), HEIGHT_BOUNDS_IN)
}

fn parse_length_part(part: &str, metric: bool) -> Option<f64> {
    let part = part.trim_end_matches('.').trim();

    if let Some(caps) = FEET_INCHES.captures(part) {
        let feet: f64 = caps.get(1)?.as_str().parse().ok()?;
        let inches: f64 = caps
            .get(2)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0.0);
        return Some(feet * 12.0 + inches);
    }

    if let Some(caps) = SPACED_FEET_INCHES.captures(part) {
        let feet: f64 = caps.get(1)?.as_str().parse().ok()?;
        let inches: f64 = caps.get(2)?.as_str().parse().ok()?;
        return (inches < 12.0).then_some(feet * 12.0 + inches);
    }

    let caps = NUMBER_WITH_UNIT.captures(part)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    let unit = caps.get(2).map(|m| m.as_str()).unwrap_or("");

    match unit {
        u if u.starts_with("cm") || u.starts_with("centimet") => Some(value / CM_PER_INCH),
        u if u == "m" || u.starts_with("meter") => Some(value * 100.0 / CM_PER_INCH),
        "" if metric || value > 96.0 => Some(value / CM_PER_INCH),
        "" if (3.0..=8.0).contains(&value) => Some(value * 12.0),
        "" => Some(value),
        u if u == "\"" || u.starts_with("in") => Some(value),
        _ => None,
    }
}

/// Parse a weight description into pounds (`120-140 lbs`, `55 kg`, `150`)
pub fn parse_weight_text(text: &str) -> Measure {
    let cleaned = normalize_quotes(text);
    if is_blank_or_unknown(&cleaned) {
        return Measure::Unknown;
    }
    let metric = cleaned.contains("kg") || cleaned.contains("kilo");

    let parts = split_range(&cleaned)
        .into_iter()
        .map(|part| {
            FIRST_NUMBER
                .captures(part)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<f64>().ok())
                .map(|value| if metric { value * LB_PER_KG } else { value })
        })
        .collect();
    bounded(to_measure(parts), WEIGHT_BOUNDS_LB)
}

/// Parse an age description into years
///
/// Handles `25-35`, `30`, `about 40 years old`, `20's`, `early 30s`,
/// `teen`, and `infant`.
pub fn parse_age_text(text: &str) -> Measure {
    let cleaned = normalize_quotes(text);
    if is_blank_or_unknown(&cleaned) {
        return Measure::Unknown;
    }

    if let Some(caps) = DECADE.captures(&cleaned) {
        let decade: f64 = caps
            .get(2)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .map(|d| d * 10.0)
            .unwrap_or(0.0);
        let (lo, hi) = match caps.get(1).map(|m| m.as_str()) {
            Some("early") => (0.0, 3.0),
            Some("mid") => (4.0, 6.0),
            Some("late") => (7.0, 9.0),
            _ => (0.0, 9.0),
        };
        return Measure::range(decade + lo, decade + hi);
    }
    if cleaned.contains("teen") {
        return Measure::range(13.0, 19.0);
    }
    if cleaned.contains("infant") || cleaned.contains("newborn") {
        return Measure::range(0.0, 1.0);
    }

    // Infant ages are given in months, weeks or days
    let per_year = match SUB_YEAR_UNIT.captures(&cleaned).and_then(|caps| caps.get(1)) {
        Some(unit) if unit.as_str().starts_with('m') => 12.0,
        Some(unit) if unit.as_str().starts_with('w') => 52.0,
        Some(_) => 365.0,
        None => 1.0,
    };

    let parts = split_range(&cleaned)
        .into_iter()
        .map(|part| {
            FIRST_NUMBER
                .captures(part)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<f64>().ok())
                .map(|value| value / per_year)
        })
        .collect();
    bounded(to_measure(parts), AGE_BOUNDS_YEARS)
}

/// Map one race/ethnicity label onto the canonical enumeration
pub fn map_race(text: &str) -> Race {
    if is_blank_or_unknown(text) {
        return Race::Unknown(None);
    }
    let lowered = text.trim().to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| lowered.contains(n));

    if has(&["multi", "mixed", "biracial", "bi-racial"]) {
        Race::Multiracial
    } else if has(&["hispanic", "latin"]) {
        Race::HispanicLatino
    } else if has(&["black", "african"]) {
        Race::Black
    } else if has(&["pacific", "hawaiian", "samoan"]) {
        Race::PacificIslander
    } else if has(&["native american", "american indian", "alaska", "indigenous"]) {
        Race::NativeAmerican
    } else if has(&["white", "caucasian"]) {
        Race::White
    } else if has(&["asian"]) {
        Race::Asian
    } else {
        Race::Unknown(Some(text.trim().to_string()))
    }
}

/// Map a list of ethnicities; more than one known category is multiracial
pub fn map_races(labels: &[String]) -> Race {
    let mut known: Vec<Race> = Vec::new();
    let mut unmapped: Option<String> = None;

    for label in labels {
        match map_race(label) {
            Race::Unknown(raw) => unmapped = unmapped.or(raw),
            race if !known.contains(&race) => known.push(race),
            _ => {}
        }
    }

    match known.len() {
        0 => Race::Unknown(unmapped),
        1 => known.remove(0),
        _ => Race::Multiracial,
    }
}

pub fn map_sex(text: &str) -> Sex {
    if is_blank_or_unknown(text) {
        return Sex::Unknown(None);
    }
    match text.trim().to_lowercase().as_str() {
        "f" | "female" | "woman" | "girl" => Sex::Female,
        "m" | "male" | "man" | "boy" => Sex::Male,
        _ => Sex::Unknown(Some(text.trim().to_string())),
    }
}

const STATES: [(&str, &str); 51] = [
    ("AL", "ALABAMA"),
    ("AK", "ALASKA"),
    ("AZ", "ARIZONA"),
    ("AR", "ARKANSAS"),
    ("CA", "CALIFORNIA"),
    ("CO", "COLORADO"),
    ("CT", "CONNECTICUT"),
    ("DE", "DELAWARE"),
    ("FL", "FLORIDA"),
    ("GA", "GEORGIA"),
    ("HI", "HAWAII"),
    ("ID", "IDAHO"),
    ("IL", "ILLINOIS"),
    ("IN", "INDIANA"),
    ("IA", "IOWA"),
    ("KS", "KANSAS"),
    ("KY", "KENTUCKY"),
    ("LA", "LOUISIANA"),
    ("ME", "MAINE"),
    ("MD", "MARYLAND"),
    ("MA", "MASSACHUSETTS"),
    ("MI", "MICHIGAN"),
    ("MN", "MINNESOTA"),
    ("MS", "MISSISSIPPI"),
    ("MO", "MISSOURI"),
    ("MT", "MONTANA"),
    ("NE", "NEBRASKA"),
    ("NV", "NEVADA"),
    ("NH", "NEW HAMPSHIRE"),
    ("NJ", "NEW JERSEY"),
    ("NM", "NEW MEXICO"),
    ("NY", "NEW YORK"),
    ("NC", "NORTH CAROLINA"),
    ("ND", "NORTH DAKOTA"),
    ("OH", "OHIO"),
    ("OK", "OKLAHOMA"),
    ("OR", "OREGON"),
    ("PA", "PENNSYLVANIA"),
    ("RI", "RHODE ISLAND"),
    ("SC", "SOUTH CAROLINA"),
    ("SD", "SOUTH DAKOTA"),
    ("TN", "TENNESSEE"),
    ("TX", "TEXAS"),
    ("UT", "UTAH"),
    ("VT", "VERMONT"),
    ("VA", "VIRGINIA"),
    ("WA", "WASHINGTON"),
    ("WV", "WEST VIRGINIA"),
    ("WI", "WISCONSIN"),
    ("WY", "WYOMING"),
    ("DC", "DISTRICT OF COLUMBIA"),
];

/// Two-letter code for a US state code or name
///
/// Unrecognized values are kept (uppercased) so they still compare equal to
/// the same text on the query side.
pub fn canonical_state(text: &str) -> Option<String> {
    if is_blank_or_unknown(text) {
        return None;
    }
    let upper = text
        .trim()
        .trim_end_matches('.')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase();

    STATES
        .iter()
        .find(|(code, name)| *code == upper || *name == upper)
        .map(|(code, _)| code.to_string())
        .or(Some(upper))
}

pub fn is_known_state(text: &str) -> bool {
    let upper = text.trim().to_uppercase();
    STATES.iter().any(|(code, name)| *code == upper || *name == upper)
}

/// Comparison key for county/city names: case, whitespace and county-type
/// suffixes are ignored
pub fn place_key(text: &str) -> String {
    let lowered = text.to_lowercase().replace(['.', ','], " ");
    let mut words: Vec<&str> = lowered.split_whitespace().collect();
    if words.len() > 1 {
        if let Some(last) = words.last() {
            if matches!(*last, "county" | "parish" | "borough" | "co") {
                words.pop();
            }
        }
    }
    words.join(" ")
}

/// Parse `City, Some County, State` style location lines
pub fn parse_location_text(text: &str) -> Location {
    let parts: Vec<&str> = text
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();

    let mut location = Location::default();
    let mut rest: Vec<&str> = Vec::new();

    for (index, part) in parts.iter().enumerate() {
        let lowered = part.to_lowercase();
        if index == parts.len() - 1 && index > 0 && is_known_state(part) {
            location.state = canonical_state(part);
        } else if lowered.ends_with(" county") || lowered.ends_with(" parish") || lowered.ends_with(" borough") {
            location.county = clean_place(part);
        } else {
            rest.push(part);
        }
    }

    if parts.len() == 1 && is_known_state(parts[0]) {
        location.state = canonical_state(parts[0]);
        return location;
    }

    location.city = rest.first().and_then(|city| clean_place(city));
    location
}

fn split_marks(text: &str) -> Vec<String> {
    text.split(|c| c == ';' || c == '\n')
        .map(str::trim)
        .filter(|mark| !is_blank_or_unknown(mark))
        .map(str::to_string)
        .collect()
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    const FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%B %d, %Y", "%b %d, %Y"];
    let text = text.trim();
    // ISO timestamps: keep the date part
    let text = text
        .get(..10)
        .filter(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").is_ok())
        .unwrap_or(text);
    FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NamUsArticle, NamUsCircumstances, NamUsFeature, NamUsSubject, NamedValue};

    fn approx(measure: Measure, lo: f64, hi: f64) -> bool {
        match measure.bounds() {
            Some((min, max)) => (min - lo).abs() < 0.05 && (max - hi).abs() < 0.05,
            None => false,
        }
    }

    #[test]
    fn test_parse_height_feet_inches_range() {
        assert_eq!(parse_height_text("5'4\" - 5'8\""), Measure::range(64.0, 68.0));
        assert_eq!(parse_height_text("5’4” – 5’8”"), Measure::range(64.0, 68.0));
        assert_eq!(parse_height_text("5 ft 6 in"), Measure::exact(66.0));
        assert_eq!(parse_height_text("5'"), Measure::exact(60.0));
        assert_eq!(parse_height_text("5 8"), Measure::exact(68.0));
    }

    #[test]
    fn test_parse_height_inches_and_metric() {
        assert_eq!(parse_height_text("64\""), Measure::exact(64.0));
        assert_eq!(parse_height_text("64 to 68 inches"), Measure::range(64.0, 68.0));
        assert!(approx(parse_height_text("163 cm"), 64.17, 64.17));
        assert!(approx(parse_height_text("160-170 cm"), 62.99, 66.93));
        assert!(approx(parse_height_text("1.63 m"), 64.17, 64.17));
        assert!(approx(parse_height_text("165"), 64.96, 64.96));
    }

    #[test]
    fn test_parse_height_unknown() {
        assert_eq!(parse_height_text(""), Measure::Unknown);
        assert_eq!(parse_height_text("Unknown"), Measure::Unknown);
        assert_eq!(parse_height_text("tall"), Measure::Unknown);
        assert_eq!(parse_height_text("900 in"), Measure::Unknown);
    }

    #[test]
    fn test_parse_weight() {
        assert_eq!(parse_weight_text("120-140 lbs"), Measure::range(120.0, 140.0));
        assert_eq!(parse_weight_text("150 pounds"), Measure::exact(150.0));
        assert!(approx(parse_weight_text("55 kg"), 121.25, 121.25));
        assert_eq!(parse_weight_text("n/a"), Measure::Unknown);
    }

    #[test]
    fn test_parse_age() {
        assert_eq!(parse_age_text("25-35"), Measure::range(25.0, 35.0));
        assert_eq!(parse_age_text("about 40 years old"), Measure::exact(40.0));
        assert_eq!(parse_age_text("20's"), Measure::range(20.0, 29.0));
        assert_eq!(parse_age_text("early 30s"), Measure::range(30.0, 33.0));
        assert_eq!(parse_age_text("Teen"), Measure::range(13.0, 19.0));
        assert_eq!(parse_age_text("unknown"), Measure::Unknown);
    }

    #[test]
    fn test_parse_age_below_one_year() {
        assert_eq!(parse_age_text("5 months"), Measure::exact(5.0 / 12.0));
        assert_eq!(parse_age_text("18 mos"), Measure::exact(1.5));
        assert_eq!(parse_age_text("2-3 weeks"), Measure::range(2.0 / 52.0, 3.0 / 52.0));
        assert_eq!(parse_age_text("10 days old"), Measure::exact(10.0 / 365.0));
        assert_eq!(parse_age_text("5 years"), Measure::exact(5.0));
    }

    #[test]
    fn test_map_race_and_sex() {
        assert_eq!(map_race("White / Caucasian"), Race::White);
        assert_eq!(map_race("Black / African American"), Race::Black);
        assert_eq!(map_race("Hispanic / Latino"), Race::HispanicLatino);
        assert_eq!(map_race("Uncertain"), Race::Unknown(None));
        assert_eq!(map_race("Martian"), Race::Unknown(Some("Martian".to_string())));

        assert_eq!(map_sex("F"), Sex::Female);
        assert_eq!(map_sex("Male"), Sex::Male);
        assert_eq!(map_sex("Undetermined"), Sex::Unknown(Some("Undetermined".to_string())));
    }

    #[test]
    fn test_map_races_multiple_is_multiracial() {
        let labels = vec!["White / Caucasian".to_string(), "Asian".to_string()];
        assert_eq!(map_races(&labels), Race::Multiracial);
        assert_eq!(map_races(&["Asian".to_string(), "Asian".to_string()]), Race::Asian);
        assert_eq!(map_races(&[]), Race::Unknown(None));
    }

    #[test]
    fn test_canonical_state() {
        assert_eq!(canonical_state("tx").as_deref(), Some("TX"));
        assert_eq!(canonical_state("New  York").as_deref(), Some("NY"));
        assert_eq!(canonical_state("Ontario").as_deref(), Some("ONTARIO"));
        assert_eq!(canonical_state(" "), None);
    }

    #[test]
    fn test_place_key_ignores_suffix_and_case() {
        assert_eq!(place_key("Harris County"), "harris");
        assert_eq!(place_key("harris"), "harris");
        assert_eq!(place_key("  Los   Angeles "), "los angeles");
    }

    #[test]
    fn test_parse_location_text() {
        let location = parse_location_text("Houston, Harris County, Texas");
        assert_eq!(location.city.as_deref(), Some("Houston"));
        assert_eq!(location.county.as_deref(), Some("Harris County"));
        assert_eq!(location.state.as_deref(), Some("TX"));

        let state_only = parse_location_text("Florida");
        assert_eq!(state_only.state.as_deref(), Some("FL"));
        assert!(state_only.city.is_none());
    }

    #[test]
    fn test_normalize_namus_case() {
        let case = NamUsCase {
            id_formatted: Some("UP12345".to_string()),
            subject_description: NamUsSubject {
                sex: Some(NamedValue::named("Female")),
                ethnicities: vec![NamedValue::named("White / Caucasian")],
                height_from: Some(62.0),
                height_to: Some(65.0),
                weight_from: Some(110.0),
                weight_to: None,
                estimated_age_from: Some(20.0),
                estimated_age_to: Some(30.0),
                hair_color: Some(NamedValue::named("Brown")),
                left_eye_color: Some(NamedValue::named("Unknown")),
            },
            circumstances: NamUsCircumstances {
                city: Some("Miami".to_string()),
                county: Some(NamedValue::named("Miami-Dade County")),
                state: Some(NamedValue::named("Florida")),
                date_found: Some("2021-12-03".to_string()),
                circumstances_of_recovery: Some("  Found near a canal ".to_string()),
            },
            physical_feature_descriptions: vec![NamUsFeature {
                physical_feature: Some(NamedValue::named("Birthmark")),
                description: Some("on left shoulder".to_string()),
            }],
            clothing_and_accessories_articles: vec![NamUsArticle {
                article: Some(NamedValue::named("Shirt")),
                description: Some("White t-shirt".to_string()),
            }],
        };

        let record = normalize(RawRecord::NamUs(case), &SourceId::from("NamUs")).unwrap();

        assert_eq!(record.case_id, "UP12345");
        assert_eq!(record.height_in, Measure::range(62.0, 65.0));
        assert_eq!(record.weight_lb, Measure::exact(110.0));
        assert_eq!(record.sex, Sex::Female);
        assert_eq!(record.race, Race::White);
        assert_eq!(record.location.state.as_deref(), Some("FL"));
        assert_eq!(record.distinguishing_marks, vec!["Birthmark: on left shoulder"]);
        assert_eq!(record.date_found, NaiveDate::from_ymd_opt(2021, 12, 3));
        assert_eq!(
            record.case_url.as_deref(),
            Some("https://www.namus.gov/UnidentifiedPersons/Case#/12345")
        );
        assert_eq!(record.notes.hair_color.as_deref(), Some("Brown"));
        assert_eq!(record.notes.eye_color, None);
        assert_eq!(record.notes.circumstances.as_deref(), Some("Found near a canal"));
        assert_eq!(record.notes.clothing_description.as_deref(), Some("Shirt: White t-shirt"));
    }

    #[test]
    fn test_normalize_doe_network_case_with_garbage_fields() {
        let case = DoeNetworkCase {
            case_ref: Some("1234UFTX".to_string()),
            sex: Some("Female".to_string()),
            race: Some("???".to_string()),
            height: Some("somewhere around average".to_string()),
            weight: Some("120-140 lbs".to_string()),
            age: Some("20's".to_string()),
            location: Some("Houston, Harris County, Texas".to_string()),
            distinguishing_marks: Some("Tattoo of a rose on ankle; scar on chin".to_string()),
            hair: Some("unknown".to_string()),
            clothing: Some(" Jeans ".to_string()),
            ..Default::default()
        };

        let record = normalize(RawRecord::DoeNetwork(case), &SourceId::from("DoeNetwork")).unwrap();

        assert_eq!(record.height_in, Measure::Unknown);
        assert_eq!(record.weight_lb, Measure::range(120.0, 140.0));
        assert_eq!(record.age, Measure::range(20.0, 29.0));
        assert_eq!(record.race, Race::Unknown(Some("???".to_string())));
        assert_eq!(record.location.city.as_deref(), Some("Houston"));
        assert_eq!(record.distinguishing_marks.len(), 2);
        assert_eq!(record.notes.hair_color, None);
        assert_eq!(record.notes.clothing_description.as_deref(), Some("Jeans"));
    }

    #[test]
    fn test_normalize_canonical_converts_units() {
        let case = CanonicalCase {
            case_id: Some("C-1".to_string()),
            height_min: Some(160.0),
            height_max: Some(170.0),
            height_unit: LengthUnit::Centimeters,
            weight_min: Some(50.0),
            weight_unit: MassUnit::Kilograms,
            ..Default::default()
        };

        let record = normalize(RawRecord::Canonical(case), &SourceId::from("Fixture")).unwrap();

        assert!(approx(record.height_in, 62.99, 66.93));
        assert!(approx(record.weight_lb, 110.23, 110.23));
        assert_eq!(record.age, Measure::Unknown);
    }

    #[test]
    fn test_normalize_rejects_missing_case_id() {
        let raw = RawRecord::Canonical(CanonicalCase::default());
        let err = normalize(raw, &SourceId::from("Fixture")).unwrap_err();
        assert!(matches!(err, MatchError::RecordNormalization { .. }));
    }
}
