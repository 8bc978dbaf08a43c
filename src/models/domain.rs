use crate::core::text::clean_text;
use crate::error::MatchError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the registry a record came from (e.g. "NamUs", "DoeNetwork")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(pub String);

impl SourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A numeric physical measurement on a canonical record
///
/// Registries frequently publish estimates as ranges ("5'4\" - 5'8\""), so a
/// value is either exact, a closed range, or explicitly unknown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Measure {
    Unknown,
    Exact { value: f64 },
    Range { min: f64, max: f64 },
}

impl Measure {
    pub fn exact(value: f64) -> Self {
        if value.is_finite() {
            Measure::Exact { value }
        } else {
            Measure::Unknown
        }
    }

    /// Build a range, swapping reversed bounds and collapsing equal bounds
    pub fn range(min: f64, max: f64) -> Self {
        if !min.is_finite() || !max.is_finite() {
            return Measure::Unknown;
        }
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        if lo == hi {
            Measure::Exact { value: lo }
        } else {
            Measure::Range { min: lo, max: hi }
        }
    }

    /// Build from optional bounds; a single known bound becomes an exact value
    pub fn from_bounds(min: Option<f64>, max: Option<f64>) -> Self {
        match (min, max) {
            (Some(lo), Some(hi)) => Measure::range(lo, hi),
            (Some(v), None) | (None, Some(v)) => Measure::exact(v),
            (None, None) => Measure::Unknown,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Measure::Unknown)
    }

    /// Inclusive bounds, or `None` when unknown
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match *self {
            Measure::Unknown => None,
            Measure::Exact { value } => Some((value, value)),
            Measure::Range { min, max } => Some((min, max)),
        }
    }

    /// Apply a unit conversion factor to every known bound
    pub fn scaled(self, factor: f64) -> Self {
        match self {
            Measure::Unknown => Measure::Unknown,
            Measure::Exact { value } => Measure::exact(value * factor),
            Measure::Range { min, max } => Measure::range(min * factor, max * factor),
        }
    }
}

impl Default for Measure {
    fn default() -> Self {
        Measure::Unknown
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Measure::Unknown => write!(f, "unknown"),
            Measure::Exact { value } => write!(f, "{}", trim_float(*value)),
            Measure::Range { min, max } => write!(f, "{}-{}", trim_float(*min), trim_float(*max)),
        }
    }
}

fn trim_float(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    }
}

/// Closed numeric range used on the query side
///
/// Deserialization goes through [`NumericRange::new`], so reversed bounds are
/// swapped and non-finite bounds are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RangeBounds")]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Deserialize)]
struct RangeBounds {
    min: f64,
    max: f64,
}

impl TryFrom<RangeBounds> for NumericRange {
    type Error = String;

    fn try_from(bounds: RangeBounds) -> Result<Self, Self::Error> {
        let range = NumericRange::new(bounds.min, bounds.max);
        if range.is_valid() {
            Ok(range)
        } else {
            Err(format!("invalid range {}..{}", bounds.min, bounds.max))
        }
    }
}

impl NumericRange {
    pub fn new(min: f64, max: f64) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn exact(value: f64) -> Self {
        Self { min: value, max: value }
    }

    /// `center ± spread`, e.g. 64in ± 2
    pub fn around(center: f64, spread: f64) -> Self {
        Self::new(center - spread.abs(), center + spread.abs())
    }

    /// Gap between this range and a record measure; zero when they overlap
    pub fn gap_to(&self, measure: &Measure) -> Option<f64> {
        let (lo, hi) = measure.bounds()?;
        if hi < self.min {
            Some(self.min - hi)
        } else if lo > self.max {
            Some(lo - self.max)
        } else {
            Some(0.0)
        }
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

impl fmt::Display for NumericRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.min == self.max {
            write!(f, "{}", trim_float(self.min))
        } else {
            write!(f, "{}-{}", trim_float(self.min), trim_float(self.max))
        }
    }
}

/// Canonical race categories
///
/// Values that cannot be mapped keep their source text in `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Race {
    White,
    Black,
    HispanicLatino,
    Asian,
    NativeAmerican,
    PacificIslander,
    Multiracial,
    Unknown(Option<String>),
}

impl Race {
    pub fn is_known(&self) -> bool {
        !matches!(self, Race::Unknown(_))
    }

    pub fn label(&self) -> &str {
        match self {
            Race::White => "White",
            Race::Black => "Black/African American",
            Race::HispanicLatino => "Hispanic/Latino",
            Race::Asian => "Asian",
            Race::NativeAmerican => "Native American",
            Race::PacificIslander => "Pacific Islander",
            Race::Multiracial => "Multiracial",
            Race::Unknown(Some(raw)) => raw,
            Race::Unknown(None) => "Unknown",
        }
    }
}

impl Default for Race {
    fn default() -> Self {
        Race::Unknown(None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Female,
    Male,
    Unknown(Option<String>),
}

impl Sex {
    pub fn is_known(&self) -> bool {
        !matches!(self, Sex::Unknown(_))
    }

    pub fn label(&self) -> &str {
        match self {
            Sex::Female => "Female",
            Sex::Male => "Male",
            Sex::Unknown(Some(raw)) => raw,
            Sex::Unknown(None) => "Unknown",
        }
    }
}

impl Default for Sex {
    fn default() -> Self {
        Sex::Unknown(None)
    }
}

/// Where a case was found (record) or is believed to be (query)
///
/// `state` holds a two-letter code after normalization. `None` means the
/// field is not documented.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub county: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

impl Location {
    pub fn is_empty(&self) -> bool {
        self.state.is_none() && self.county.is_none() && self.city.is_none()
    }
}

/// Descriptive text carried through for display; never scored
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseNotes {
    #[serde(default)]
    pub hair_color: Option<String>,
    #[serde(default)]
    pub eye_color: Option<String>,
    #[serde(default)]
    pub circumstances: Option<String>,
    #[serde(default)]
    pub clothing_description: Option<String>,
}

/// Canonical unidentified-person record produced by normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRecord {
    pub source: SourceId,
    #[serde(rename = "caseId")]
    pub case_id: String,
    #[serde(rename = "caseUrl")]
    pub case_url: Option<String>,
    /// Inches
    #[serde(rename = "heightIn")]
    pub height_in: Measure,
    /// Pounds
    #[serde(rename = "weightLb")]
    pub weight_lb: Measure,
    /// Years
    pub age: Measure,
    pub race: Race,
    pub sex: Sex,
    #[serde(rename = "distinguishingMarks")]
    pub distinguishing_marks: Vec<String>,
    pub location: Location,
    #[serde(rename = "dateFound")]
    pub date_found: Option<chrono::NaiveDate>,
    #[serde(default)]
    pub notes: CaseNotes,
}

impl PersonRecord {
    /// A record with every descriptive field unknown
    pub fn unknown(source: SourceId, case_id: impl Into<String>) -> Self {
        Self {
            source,
            case_id: case_id.into(),
            case_url: None,
            height_in: Measure::Unknown,
            weight_lb: Measure::Unknown,
            age: Measure::Unknown,
            race: Race::default(),
            sex: Sex::default(),
            distinguishing_marks: Vec::new(),
            location: Location::default(),
            date_found: None,
            notes: CaseNotes::default(),
        }
    }

    /// Deduplication key
    pub fn key(&self) -> (SourceId, String) {
        (self.source.clone(), self.case_id.clone())
    }
}

/// What the caller is looking for
///
/// Every field is optional. Units are canonical: inches, pounds, years.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchCriteria {
    #[serde(default, rename = "heightIn")]
    pub height_in: Option<NumericRange>,
    #[serde(default, rename = "weightLb")]
    pub weight_lb: Option<NumericRange>,
    #[serde(default)]
    pub age: Option<NumericRange>,
    #[serde(default)]
    pub race: Option<Race>,
    #[serde(default)]
    pub sex: Option<Sex>,
    #[serde(default, rename = "distinguishingMarks")]
    pub distinguishing_marks: Option<String>,
    #[serde(default)]
    pub location: Location,
}

impl SearchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_height(mut self, range: NumericRange) -> Self {
        self.height_in = Some(range);
        self
    }

    pub fn with_weight(mut self, range: NumericRange) -> Self {
        self.weight_lb = Some(range);
        self
    }

    pub fn with_age(mut self, range: NumericRange) -> Self {
        self.age = Some(range);
        self
    }

    pub fn with_race(mut self, race: Race) -> Self {
        self.race = Some(race);
        self
    }

    pub fn with_sex(mut self, sex: Sex) -> Self {
        self.sex = Some(sex);
        self
    }

    pub fn with_marks(mut self, marks: impl Into<String>) -> Self {
        self.distinguishing_marks = Some(marks.into());
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.location.state = Some(state.into());
        self
    }

    pub fn with_county(mut self, county: impl Into<String>) -> Self {
        self.location.county = Some(county.into());
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.location.city = Some(city.into());
        self
    }

    /// Attributes the caller actually specified, in canonical order
    pub fn specified_attributes(&self) -> Vec<Attribute> {
        Attribute::ALL
            .iter()
            .copied()
            .filter(|attribute| self.is_specified(*attribute))
            .collect()
    }

    pub fn is_specified(&self, attribute: Attribute) -> bool {
        match attribute {
            Attribute::Height => self.height_in.is_some(),
            Attribute::Weight => self.weight_lb.is_some(),
            Attribute::Age => self.age.is_some(),
            Attribute::Race => self.race.as_ref().is_some_and(Race::is_known),
            Attribute::Sex => self.sex.as_ref().is_some_and(Sex::is_known),
            Attribute::Location => !self.location.is_empty(),
            Attribute::DistinguishingMarks => self
                .distinguishing_marks
                .as_deref()
                .is_some_and(|marks| !clean_text(marks).is_empty()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.specified_attributes().is_empty()
    }

    /// Reject criteria that cannot be scored: nothing specified, or a
    /// numeric range that is reversed or not finite
    pub fn check(&self) -> Result<(), MatchError> {
        if self.is_empty() {
            return Err(MatchError::empty_query());
        }
        let ranges = [
            (Attribute::Height, self.height_in.as_ref()),
            (Attribute::Weight, self.weight_lb.as_ref()),
            (Attribute::Age, self.age.as_ref()),
        ];
        for (attribute, range) in ranges {
            if let Some(range) = range.filter(|range| !range.is_valid()) {
                return Err(MatchError::InvalidQuery(format!(
                    "invalid {} range {}..{}",
                    attribute, range.min, range.max
                )));
            }
        }
        Ok(())
    }
}

/// Compared characteristics, in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Height,
    Weight,
    Race,
    Sex,
    Age,
    Location,
    DistinguishingMarks,
}

impl Attribute {
    pub const ALL: [Attribute; 7] = [
        Attribute::Height,
        Attribute::Weight,
        Attribute::Race,
        Attribute::Sex,
        Attribute::Age,
        Attribute::Location,
        Attribute::DistinguishingMarks,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Attribute::Height => "height",
            Attribute::Weight => "weight",
            Attribute::Race => "race",
            Attribute::Sex => "sex",
            Attribute::Age => "age",
            Attribute::Location => "location",
            Attribute::DistinguishingMarks => "distinguishing_marks",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One matcher's verdict on one attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeScore {
    pub attribute: Attribute,
    pub score: f64,
    pub reason: String,
}

/// Confidence label, derived from the score only
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceLevel {
    VeryLow,
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    /// ≥80 HIGH, 60–79 MEDIUM, 40–59 LOW, <40 VERY LOW
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => ConfidenceLevel::High,
            60..=79 => ConfidenceLevel::Medium,
            40..=59 => ConfidenceLevel::Low,
            _ => ConfidenceLevel::VeryLow,
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfidenceLevel::High => "HIGH",
            ConfidenceLevel::Medium => "MEDIUM",
            ConfidenceLevel::Low => "LOW",
            ConfidenceLevel::VeryLow => "VERY LOW",
        };
        f.write_str(label)
    }
}

/// Scored candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub record: PersonRecord,
    pub confidence: u8,
    pub level: ConfidenceLevel,
    /// Score-descending
    pub attributes: Vec<AttributeScore>,
}

impl MatchResult {
    /// e.g. `HIGH (87%)`
    pub fn summary_line(&self) -> String {
        format!("{} ({}%)", self.level, self.confidence)
    }
}
