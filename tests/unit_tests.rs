// Unit tests for doe-match

use doe_match::core::{
    matchers::{score_location, score_marks, score_numeric},
    normalize::{parse_age_text, parse_height_text, parse_weight_text},
    scoring::score_record,
    text::similarity,
};
use doe_match::models::{
    Attribute, ConfidenceLevel, Location, Measure, NumericRange, PersonRecord, Race,
    ScoringConfig, SearchCriteria, Sex, SimilarityMethod, SourceId,
};
use doe_match::MatchError;

fn create_test_record(case_id: &str) -> PersonRecord {
    PersonRecord::unknown(SourceId::from("NamUs"), case_id)
}

fn confidence(criteria: &SearchCriteria, record: &PersonRecord) -> u8 {
    score_record(criteria, record, &ScoringConfig::default())
        .unwrap()
        .confidence
}

#[test]
fn test_numeric_monotonicity() {
    let query = NumericRange::around(64.0, 2.0);

    let mut previous = f64::INFINITY;
    for height in [64.0, 66.0, 66.5, 67.0, 68.0, 69.0, 70.0, 80.0] {
        let score = score_numeric(Attribute::Height, Some(&query), &Measure::exact(height), 3.0, 0.5)
            .unwrap()
            .score;
        assert!(score <= previous, "score rose at {} in: {} > {}", height, score, previous);
        previous = score;
    }
}

#[test]
fn test_closer_candidate_never_scores_lower() {
    let criteria = SearchCriteria::new().with_weight(NumericRange::exact(150.0));

    for (near, far) in [(150.0, 160.0), (155.0, 165.0), (140.0, 120.0), (175.0, 200.0)] {
        let mut a = create_test_record("A");
        a.weight_lb = Measure::exact(near);
        let mut b = create_test_record("B");
        b.weight_lb = Measure::exact(far);

        assert!(
            confidence(&criteria, &a) >= confidence(&criteria, &b),
            "{} lb should score at least as well as {} lb",
            near,
            far
        );
    }
}

fn assert_unknown_between(
    criteria: SearchCriteria,
    set_match: impl Fn(&mut PersonRecord),
    set_mismatch: impl Fn(&mut PersonRecord),
) {
    let unknown = create_test_record("unknown");
    let mut matching = create_test_record("match");
    set_match(&mut matching);
    let mut mismatching = create_test_record("mismatch");
    set_mismatch(&mut mismatching);

    let (u, m, x) = (
        confidence(&criteria, &unknown),
        confidence(&criteria, &matching),
        confidence(&criteria, &mismatching),
    );
    assert!(x < u && u < m, "{:?}: mismatch {} < unknown {} < match {}", criteria, x, u, m);
}

#[test]
fn test_unknown_scores_strictly_between_match_and_mismatch() {
    assert_unknown_between(
        SearchCriteria::new().with_height(NumericRange::around(64.0, 2.0)),
        |r| r.height_in = Measure::exact(64.0),
        |r| r.height_in = Measure::exact(75.0),
    );
    assert_unknown_between(
        SearchCriteria::new().with_race(Race::Asian),
        |r| r.race = Race::Asian,
        |r| r.race = Race::White,
    );
    assert_unknown_between(
        SearchCriteria::new().with_sex(Sex::Male),
        |r| r.sex = Sex::Male,
        |r| r.sex = Sex::Female,
    );
    assert_unknown_between(
        SearchCriteria::new().with_city("Miami"),
        |r| r.location.city = Some("Miami".to_string()),
        |r| r.location.city = Some("Orlando".to_string()),
    );
    assert_unknown_between(
        SearchCriteria::new().with_marks("tattoo on ankle"),
        |r| r.distinguishing_marks = vec!["Tattoo on ankle".to_string()],
        |r| r.distinguishing_marks = vec!["Surgical scar".to_string()],
    );
    // Every query word is a stopword
    assert_unknown_between(
        SearchCriteria::new().with_marks("small"),
        |r| r.distinguishing_marks = vec!["Small scar on left hand".to_string()],
        |r| r.distinguishing_marks = vec!["Rose tattoo".to_string()],
    );
}

#[test]
fn test_field_order_invariance() {
    let mut record = create_test_record("1");
    record.height_in = Measure::range(63.0, 67.0);
    record.sex = Sex::Female;
    record.race = Race::HispanicLatino;
    record.age = Measure::exact(33.0);
    record.location.state = Some("FL".to_string());

    let forward = SearchCriteria::new()
        .with_height(NumericRange::new(62.0, 64.0))
        .with_sex(Sex::Female)
        .with_race(Race::White)
        .with_age(NumericRange::new(20.0, 30.0))
        .with_state("Florida");
    let backward = SearchCriteria::new()
        .with_state("Florida")
        .with_age(NumericRange::new(20.0, 30.0))
        .with_race(Race::White)
        .with_sex(Sex::Female)
        .with_height(NumericRange::new(62.0, 64.0));

    let a = score_record(&forward, &record, &ScoringConfig::default()).unwrap();
    let b = score_record(&backward, &record, &ScoringConfig::default()).unwrap();

    assert_eq!(a, b);
}

#[test]
fn test_height_scenario() {
    let criteria = SearchCriteria::new()
        .with_height(NumericRange::around(64.0, 2.0))
        .with_sex(Sex::Female);

    let mut a = create_test_record("A");
    a.height_in = Measure::exact(65.0);
    a.sex = Sex::Female;
    let mut b = create_test_record("B");
    b.height_in = Measure::exact(70.0);
    b.sex = Sex::Female;

    let result_a = score_record(&criteria, &a, &ScoringConfig::default()).unwrap();
    let result_b = score_record(&criteria, &b, &ScoringConfig::default()).unwrap();

    assert!(result_a.confidence > result_b.confidence);
    assert!(result_a.level >= result_b.level);
    assert_eq!(result_a.level, ConfidenceLevel::High);
}

#[test]
fn test_empty_criteria_is_invalid_query() {
    let err = score_record(&SearchCriteria::new(), &create_test_record("1"), &ScoringConfig::default())
        .unwrap_err();
    assert!(matches!(err, MatchError::InvalidQuery(_)));
}

#[test]
fn test_unknown_criteria_fields_do_not_penalize() {
    let mut record = create_test_record("1");
    record.sex = Sex::Female;

    let plain = SearchCriteria::new().with_sex(Sex::Female);
    let with_unknowns = plain
        .clone()
        .with_race(Race::Unknown(None))
        .with_marks("  ");

    assert_eq!(confidence(&plain, &record), confidence(&with_unknowns, &record));
}

#[test]
fn test_text_parsers_feed_canonical_units() {
    assert_eq!(parse_height_text("5'4\" – 5'8\""), Measure::range(64.0, 68.0));
    assert_eq!(parse_height_text("64 through 68"), Measure::range(64.0, 68.0));
    assert_eq!(parse_weight_text("120 to 140 lbs"), Measure::range(120.0, 140.0));
    assert_eq!(parse_age_text("late 20s"), Measure::range(27.0, 29.0));
}

#[test]
fn test_location_hierarchy_is_descending() {
    let config = ScoringConfig::default();
    let record = Location {
        state: Some("CA".to_string()),
        county: Some("Los Angeles County".to_string()),
        city: Some("Los Angeles".to_string()),
    };
    let query = |city: &str, county: &str| Location {
        state: Some("California".to_string()),
        county: Some(county.to_string()),
        city: Some(city.to_string()),
    };

    let city = score_location(&query("los angeles", "Orange"), &record, &config).unwrap().score;
    let county = score_location(&query("Pasadena", "Los Angeles"), &record, &config).unwrap().score;
    let state = score_location(&query("Irvine", "Orange"), &record, &config).unwrap().score;

    assert!(city > county && county > state && state > 0.0);
}

#[test]
fn test_marks_similarity_methods() {
    let record = vec!["Rose tattoo on left ankle".to_string()];

    for method in [
        SimilarityMethod::TokenOverlap,
        SimilarityMethod::Levenshtein,
        SimilarityMethod::JaroWinkler,
    ] {
        let config = ScoringConfig::default().with_similarity(method);
        let close = score_marks(Some("rose tattoo left ankle"), &record, &config).unwrap().score;
        let far = score_marks(Some("missing front tooth"), &record, &config).unwrap().score;
        assert!(close > far, "{:?}: close {} <= far {}", method, close, far);
    }

    assert!(similarity("TATTOO", "tattoo", SimilarityMethod::Levenshtein) > 0.99);
}
