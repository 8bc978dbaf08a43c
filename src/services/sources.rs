use crate::models::{
    CanonicalCase, DoeNetworkCase, NamUsArticle, NamUsCase, NamUsCircumstances, NamUsFeature,
    NamUsSubject, NamedValue, RawRecord, SearchCriteria, SourceId,
};
use crate::services::provider::{SourceError, SourceProvider};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::PathBuf;
use tracing::debug;

/// In-memory provider
#[derive(Debug, Clone)]
pub struct StaticSource {
    id: SourceId,
    records: Vec<RawRecord>,
    available: bool,
}

impl StaticSource {
    pub fn new(id: impl Into<String>, records: Vec<RawRecord>) -> Self {
        Self {
            id: SourceId::new(id),
            records,
            available: true,
        }
    }

    /// A registered integration that cannot be queried yet
    pub fn unavailable(id: impl Into<String>) -> Self {
        Self {
            id: SourceId::new(id),
            records: Vec::new(),
            available: false,
        }
    }
}

#[async_trait]
impl SourceProvider for StaticSource {
    fn source_id(&self) -> SourceId {
        self.id.clone()
    }

    async fn fetch_candidates(
        &self,
        _criteria: &SearchCriteria,
    ) -> Result<Vec<RawRecord>, SourceError> {
        if !self.available {
            return Err(SourceError::Unavailable(format!("{} is not integrated", self.id)));
        }
        Ok(self.records.clone())
    }

    async fn get_record(&self, case_id: &str) -> Result<Option<RawRecord>, SourceError> {
        if !self.available {
            return Err(SourceError::Unavailable(format!("{} is not integrated", self.id)));
        }
        let case_id = case_id.trim();
        Ok(self
            .records
            .iter()
            .find(|record| record.case_id() == Some(case_id))
            .cloned())
    }

    fn is_available(&self) -> bool {
        self.available
    }
}

/// Provider backed by a JSON array of tagged raw records on disk
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    id: SourceId,
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: SourceId::new(id),
            path: path.into(),
        }
    }

    async fn read_records(&self) -> Result<Vec<RawRecord>, SourceError> {
        let contents = tokio::fs::read_to_string(&self.path).await?;
        let records: Vec<RawRecord> = serde_json::from_str(&contents)?;
        debug!("Read {} records from {}", records.len(), self.path.display());
        Ok(records)
    }
}

#[async_trait]
impl SourceProvider for JsonFileSource {
    fn source_id(&self) -> SourceId {
        self.id.clone()
    }

    async fn fetch_candidates(
        &self,
        _criteria: &SearchCriteria,
    ) -> Result<Vec<RawRecord>, SourceError> {
        self.read_records().await
    }

    async fn get_record(&self, case_id: &str) -> Result<Option<RawRecord>, SourceError> {
        let case_id = case_id.trim();
        let records = self.read_records().await?;
        Ok(records
            .into_iter()
            .find(|record| record.case_id() == Some(case_id)))
    }

    fn is_available(&self) -> bool {
        self.path.is_file()
    }
}

/// Demonstration cases in each supported schema
pub fn sample_records() -> Vec<RawRecord> {
    vec![
        RawRecord::Canonical(CanonicalCase {
            case_id: Some("MOCK-001".to_string()),
            case_url: Some("https://example.org/cases/MOCK-001".to_string()),
            height_min: Some(64.0),
            height_max: Some(66.0),
            weight_min: Some(120.0),
            weight_max: Some(140.0),
            age_min: Some(25.0),
            age_max: Some(35.0),
            race: Some("White".to_string()),
            sex: Some("Female".to_string()),
            distinguishing_marks: vec![
                "Small scar on left hand".to_string(),
                "Tattoo on ankle".to_string(),
            ],
            state: Some("CA".to_string()),
            county: Some("Los Angeles".to_string()),
            city: Some("Los Angeles".to_string()),
            date_found: NaiveDate::from_ymd_opt(2020, 5, 15),
            hair_color: Some("Brown".to_string()),
            eye_color: Some("Blue".to_string()),
            circumstances: Some("Found in hiking area".to_string()),
            clothing_description: Some("Blue jeans, white t-shirt".to_string()),
            ..Default::default()
        }),
        RawRecord::DoeNetwork(DoeNetworkCase {
            case_ref: Some("MOCK-002".to_string()),
            url: Some("https://example.org/cases/MOCK-002".to_string()),
            sex: Some("Male".to_string()),
            race: Some("Black / African American".to_string()),
            height: Some("5'8\" - 5'10\"".to_string()),
            weight: Some("160-180 lbs".to_string()),
            age: Some("30-45".to_string()),
            location: Some("Houston, Harris County, Texas".to_string()),
            distinguishing_marks: Some("Tribal tattoo on arm".to_string()),
            date_found: Some("08/22/2019".to_string()),
            hair: Some("Black".to_string()),
            eyes: Some("Brown".to_string()),
            circumstances: Some("Found near highway".to_string()),
            clothing: Some("Dark jeans, leather jacket".to_string()),
            ..Default::default()
        }),
        RawRecord::NamUs(NamUsCase {
            id_formatted: Some("MOCK-003".to_string()),
            subject_description: NamUsSubject {
                sex: Some(NamedValue::named("Female")),
                ethnicities: vec![NamedValue::named("Hispanic / Latino")],
                height_from: Some(62.0),
                height_to: Some(64.0),
                weight_from: Some(110.0),
                weight_to: Some(130.0),
                estimated_age_from: Some(20.0),
                estimated_age_to: Some(30.0),
                hair_color: Some(NamedValue::named("Black")),
                left_eye_color: Some(NamedValue::named("Brown")),
            },
            circumstances: NamUsCircumstances {
                city: Some("Miami".to_string()),
                county: Some(NamedValue::named("Miami-Dade")),
                state: Some(NamedValue::named("Florida")),
                date_found: Some("2021-12-03".to_string()),
                circumstances_of_recovery: Some("Found in park".to_string()),
            },
            physical_feature_descriptions: vec![NamUsFeature {
                physical_feature: Some(NamedValue::named("Birthmark")),
                description: Some("Birthmark on shoulder".to_string()),
            }],
            clothing_and_accessories_articles: vec![
                NamUsArticle {
                    article: Some(NamedValue::named("Dress")),
                    description: Some("Red".to_string()),
                },
                NamUsArticle {
                    article: Some(NamedValue::named("Footwear")),
                    description: Some("Sandals".to_string()),
                },
            ],
        }),
        RawRecord::Canonical(CanonicalCase {
            case_id: Some("MOCK-004".to_string()),
            case_url: Some("https://example.org/cases/MOCK-004".to_string()),
            height_min: Some(66.0),
            height_max: Some(68.0),
            weight_min: Some(140.0),
            weight_max: Some(160.0),
            age_min: Some(35.0),
            age_max: Some(50.0),
            race: Some("White".to_string()),
            sex: Some("Female".to_string()),
            state: Some("NY".to_string()),
            county: Some("Manhattan".to_string()),
            city: Some("New York".to_string()),
            date_found: NaiveDate::from_ymd_opt(2018, 3, 10),
            hair_color: Some("Blonde".to_string()),
            eye_color: Some("Green".to_string()),
            circumstances: Some("Found in urban area".to_string()),
            ..Default::default()
        }),
        RawRecord::Canonical(CanonicalCase {
            case_id: Some("MOCK-005".to_string()),
            case_url: Some("https://example.org/cases/MOCK-005".to_string()),
            height_min: Some(70.0),
            height_max: Some(72.0),
            weight_min: Some(170.0),
            weight_max: Some(190.0),
            age_min: Some(40.0),
            age_max: Some(55.0),
            race: Some("White".to_string()),
            sex: Some("Male".to_string()),
            distinguishing_marks: vec!["Surgery scar on chest".to_string()],
            state: Some("WA".to_string()),
            county: Some("King".to_string()),
            city: Some("Seattle".to_string()),
            date_found: NaiveDate::from_ymd_opt(2022, 1, 18),
            hair_color: Some("Gray".to_string()),
            eye_color: Some("Blue".to_string()),
            circumstances: Some("Found in wooded area".to_string()),
            ..Default::default()
        }),
    ]
}

/// In-memory provider serving [`sample_records`]
pub fn sample_source() -> StaticSource {
    StaticSource::new("Sample", sample_records())
}
