use serde::{Deserialize, Serialize};

/// Source-native record as handed over by a provider
///
/// One variant per registry schema; each has its own normalization path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "schema", rename_all = "snake_case")]
pub enum RawRecord {
    NamUs(NamUsCase),
    DoeNetwork(DoeNetworkCase),
    Canonical(CanonicalCase),
}

impl RawRecord {
    /// Source-native case identifier, if the record carries one
    pub fn case_id(&self) -> Option<&str> {
        let id = match self {
            RawRecord::NamUs(case) => case.id_formatted.as_deref(),
            RawRecord::DoeNetwork(case) => case.case_ref.as_deref(),
            RawRecord::Canonical(case) => case.case_id.as_deref(),
        };
        id.map(str::trim).filter(|id| !id.is_empty())
    }
}

/// Named lookup value as NamUs serializes enums (`{"name": "Female"}`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedValue {
    #[serde(default)]
    pub name: Option<String>,
}

impl NamedValue {
    pub fn named(name: &str) -> Self {
        Self { name: Some(name.to_string()) }
    }
}

/// Structured NamUs case. Heights are inches, weights pounds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamUsCase {
    #[serde(default)]
    pub id_formatted: Option<String>,
    #[serde(default)]
    pub subject_description: NamUsSubject,
    #[serde(default)]
    pub circumstances: NamUsCircumstances,
    #[serde(default)]
    pub physical_feature_descriptions: Vec<NamUsFeature>,
    #[serde(default)]
    pub clothing_and_accessories_articles: Vec<NamUsArticle>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamUsSubject {
    #[serde(default)]
    pub sex: Option<NamedValue>,
    #[serde(default)]
    pub ethnicities: Vec<NamedValue>,
    #[serde(default)]
    pub height_from: Option<f64>,
    #[serde(default)]
    pub height_to: Option<f64>,
    #[serde(default)]
    pub weight_from: Option<f64>,
    #[serde(default)]
    pub weight_to: Option<f64>,
    #[serde(default)]
    pub estimated_age_from: Option<f64>,
    #[serde(default)]
    pub estimated_age_to: Option<f64>,
    #[serde(default)]
    pub hair_color: Option<NamedValue>,
    #[serde(default)]
    pub left_eye_color: Option<NamedValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamUsCircumstances {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub county: Option<NamedValue>,
    #[serde(default)]
    pub state: Option<NamedValue>,
    #[serde(default)]
    pub date_found: Option<String>,
    #[serde(default)]
    pub circumstances_of_recovery: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamUsFeature {
    #[serde(default)]
    pub physical_feature: Option<NamedValue>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamUsArticle {
    #[serde(default)]
    pub article: Option<NamedValue>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Doe Network case page, scraped into free-text fields
///
/// Values look like `5'4" - 5'8"`, `120-140 lbs`, `20's`, or
/// `Houston, Harris County, Texas`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DoeNetworkCase {
    #[serde(default)]
    pub case_ref: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub sex: Option<String>,
    #[serde(default)]
    pub race: Option<String>,
    #[serde(default)]
    pub height: Option<String>,
    #[serde(default)]
    pub weight: Option<String>,
    #[serde(default)]
    pub age: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub distinguishing_marks: Option<String>,
    #[serde(default)]
    pub date_found: Option<String>,
    #[serde(default)]
    pub hair: Option<String>,
    #[serde(default)]
    pub eyes: Option<String>,
    #[serde(default)]
    pub circumstances: Option<String>,
    #[serde(default)]
    pub clothing: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthUnit {
    #[default]
    Inches,
    Centimeters,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MassUnit {
    #[default]
    Pounds,
    Kilograms,
}

/// Already-structured case with explicit units
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalCase {
    #[serde(default)]
    pub case_id: Option<String>,
    #[serde(default)]
    pub case_url: Option<String>,
    #[serde(default)]
    pub height_min: Option<f64>,
    #[serde(default)]
    pub height_max: Option<f64>,
    #[serde(default)]
    pub height_unit: LengthUnit,
    #[serde(default)]
    pub weight_min: Option<f64>,
    #[serde(default)]
    pub weight_max: Option<f64>,
    #[serde(default)]
    pub weight_unit: MassUnit,
    #[serde(default)]
    pub age_min: Option<f64>,
    #[serde(default)]
    pub age_max: Option<f64>,
    #[serde(default)]
    pub race: Option<String>,
    #[serde(default)]
    pub sex: Option<String>,
    #[serde(default)]
    pub distinguishing_marks: Vec<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub county: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub date_found: Option<chrono::NaiveDate>,
    #[serde(default)]
    pub hair_color: Option<String>,
    #[serde(default)]
    pub eye_color: Option<String>,
    #[serde(default)]
    pub circumstances: Option<String>,
    #[serde(default)]
    pub clothing_description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_record_tagged_json() {
        let json = r#"[
            {"schema": "nam_us", "idFormatted": "UP12345",
             "subjectDescription": {"sex": {"name": "Female"}, "heightFrom": 62, "heightTo": 65}},
            {"schema": "doe_network", "case_ref": "1234UFCA", "height": "5'4\""},
            {"schema": "canonical", "case_id": "C-1", "height_unit": "centimeters", "height_min": 163}
        ]"#;
        let records: Vec<RawRecord> = serde_json::from_str(json).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].case_id(), Some("UP12345"));
        assert_eq!(records[1].case_id(), Some("1234UFCA"));
        match &records[2] {
            RawRecord::Canonical(case) => assert_eq!(case.height_unit, LengthUnit::Centimeters),
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_blank_case_id_is_missing() {
        let record = RawRecord::DoeNetwork(DoeNetworkCase {
            case_ref: Some("   ".to_string()),
            ..Default::default()
        });
        assert_eq!(record.case_id(), None);
    }
}
