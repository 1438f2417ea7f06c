use crate::geo::LatLon;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

mod record;
mod validation;

pub use record::{parse_record, parse_records, RecordError};
pub use validation::{validate_new_comment, validate_new_facility, ValidationError};

/// Kind of point of interest.
///
/// `Gym` is the only top-level kind; every other kind lives inside a gym
/// and carries a `parent_facility_id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FacilityType {
    Gym,
    Equipment,
    FreeEquipment,
    CrowdedArea,
    TrainerRecommendation,
    Event,
}

impl FacilityType {
    pub const ALL: [FacilityType; 6] = [
        FacilityType::Gym,
        FacilityType::Equipment,
        FacilityType::FreeEquipment,
        FacilityType::CrowdedArea,
        FacilityType::TrainerRecommendation,
        FacilityType::Event,
    ];

    /// Wire name (e.g. "FREE_EQUIPMENT")
    pub fn as_str(&self) -> &'static str {
        match self {
            FacilityType::Gym => "GYM",
            FacilityType::Equipment => "EQUIPMENT",
            FacilityType::FreeEquipment => "FREE_EQUIPMENT",
            FacilityType::CrowdedArea => "CROWDED_AREA",
            FacilityType::TrainerRecommendation => "TRAINER_RECOMMENDATION",
            FacilityType::Event => "EVENT",
        }
    }

    /// Human-readable label
    pub fn display_name(&self) -> &'static str {
        match self {
            FacilityType::Gym => "Gym",
            FacilityType::Equipment => "Gym equipment",
            FacilityType::FreeEquipment => "Free equipment",
            FacilityType::CrowdedArea => "Crowded area",
            FacilityType::TrainerRecommendation => "Trainer recommendation",
            FacilityType::Event => "Fitness event",
        }
    }

    /// Glyph used in notification titles
    pub fn emoji(&self) -> &'static str {
        match self {
            FacilityType::Gym => "🏋️",
            FacilityType::Equipment => "💪",
            FacilityType::Event => "📅",
            FacilityType::TrainerRecommendation => "🎯",
            FacilityType::FreeEquipment | FacilityType::CrowdedArea => "📍",
        }
    }

    /// True for kinds that may exist without a parent gym.
    pub fn is_top_level(&self) -> bool {
        matches!(self, FacilityType::Gym)
    }
}

impl fmt::Display for FacilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FacilityType {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FacilityType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| RecordError::UnknownType(s.to_string()))
    }
}

/// A point of interest as stored by the facility directory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityObject {
    /// Store-assigned identifier
    pub id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(rename = "type")]
    pub facility_type: FacilityType,

    /// `None` when the record carried no usable coordinate
    #[serde(default)]
    pub location: Option<LatLon>,

    #[serde(default)]
    pub image_url: String,

    #[serde(default)]
    pub author_id: String,

    #[serde(default)]
    pub author_name: String,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    /// Free-form extra details (e.g. "wifi_password")
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,

    /// 0.0 when unrated
    #[serde(default)]
    pub average_rating: f64,

    #[serde(default)]
    pub ratings_count: u32,

    #[serde(default)]
    pub comments_count: u32,

    /// Owning gym for non-gym kinds
    #[serde(default, alias = "parentGymId")]
    pub parent_facility_id: Option<String>,
}

impl FacilityObject {
    /// Minimal object with defaults for every optional field.
    pub fn new(id: impl Into<String>, title: impl Into<String>, facility_type: FacilityType) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            facility_type,
            location: None,
            image_url: String::new(),
            author_id: String::new(),
            author_name: String::new(),
            created_at: None,
            attributes: BTreeMap::new(),
            average_rating: 0.0,
            ratings_count: 0,
            comments_count: 0,
            parent_facility_id: None,
        }
    }

    pub fn with_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.location = Some(LatLon::new(latitude, longitude));
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_facility_id = Some(parent_id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_rating(mut self, average_rating: f64, ratings_count: u32) -> Self {
        self.average_rating = average_rating;
        self.ratings_count = ratings_count;
        self
    }

    pub fn is_gym(&self) -> bool {
        self.facility_type.is_top_level()
    }

    /// Location if present and within valid coordinate ranges.
    pub fn valid_location(&self) -> Option<LatLon> {
        self.location.filter(LatLon::is_valid)
    }
}

/// Write-path payload for creating a facility; the store fills in the rest.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFacility {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub facility_type: FacilityType,
    pub location: LatLon,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub author_id: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, alias = "parentGymId")]
    pub parent_facility_id: Option<String>,
}

/// A user comment on a facility
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub object_id: String,
    pub author_id: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_image_url: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Write-path payload for a comment; the store assigns id and timestamp.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub author_id: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_image_url: String,
    pub text: String,
}
