// Client-side filter engine over a fetched facility snapshot

use crate::facility::{FacilityObject, FacilityType};
use crate::geo::{haversine_distance, LatLon};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

mod grouping;

pub use grouping::{group_by_gym, GymGroup, GroupedFacilities};

/// Desired subset of the facility list.
///
/// The default value filters nothing (`is_active() == false`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    /// Case-insensitive substring over title or description; blank disables
    #[serde(default)]
    pub search_text: String,

    /// Restrict to one facility type
    #[serde(default, rename = "type")]
    pub facility_type: Option<FacilityType>,

    /// Keep objects within this distance of the reference location
    #[serde(default)]
    pub radius_meters: Option<f64>,

    /// Minimum average rating; 0 disables
    #[serde(default)]
    pub min_rating: f64,
}

impl FilterSpec {
    /// True iff any field deviates from its "no filter" default.
    pub fn is_active(&self) -> bool {
        !self.search_text.trim().is_empty()
            || self.facility_type.is_some()
            || self.radius_meters.is_some()
            || self.min_rating > 0.0
    }

    /// The inactive spec
    pub fn reset(&self) -> Self {
        Self::default()
    }
}

/// Radius presets offered to users
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RadiusOption {
    Radius100m,
    Radius500m,
    Radius1km,
    Radius5km,
    Radius10km,
    All,
}

impl RadiusOption {
    pub const ALL_OPTIONS: [RadiusOption; 6] = [
        RadiusOption::Radius100m,
        RadiusOption::Radius500m,
        RadiusOption::Radius1km,
        RadiusOption::Radius5km,
        RadiusOption::Radius10km,
        RadiusOption::All,
    ];

    /// Radius in meters; `None` for "All"
    pub fn meters(&self) -> Option<f64> {
        match self {
            RadiusOption::Radius100m => Some(100.0),
            RadiusOption::Radius500m => Some(500.0),
            RadiusOption::Radius1km => Some(1_000.0),
            RadiusOption::Radius5km => Some(5_000.0),
            RadiusOption::Radius10km => Some(10_000.0),
            RadiusOption::All => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            RadiusOption::Radius100m => "100m",
            RadiusOption::Radius500m => "500m",
            RadiusOption::Radius1km => "1 km",
            RadiusOption::Radius5km => "5 km",
            RadiusOption::Radius10km => "10 km",
            RadiusOption::All => "All",
        }
    }

    /// Maps a spec radius back to its preset; unknown values map to `All`.
    pub fn from_meters(meters: Option<f64>) -> Self {
        let Some(meters) = meters else {
            return RadiusOption::All;
        };
        Self::ALL_OPTIONS
            .iter()
            .copied()
            .find(|option| option.meters() == Some(meters))
            .unwrap_or(RadiusOption::All)
    }
}

/// Applies `spec` to `all_objects`.
///
/// Stages run in order, each over the previous stage's output:
/// 1. text (with parent gym re-inclusion from the full list)
/// 2. type
/// 3. radius (skipped when `reference` is `None`)
/// 4. minimum rating
///
/// The result keeps the relative order of `all_objects`. Callers are
/// expected to skip this entirely when `spec.is_active()` is false.
pub fn apply_filter(
    all_objects: &[FacilityObject],
    spec: &FilterSpec,
    reference: Option<LatLon>,
) -> Vec<FacilityObject> {
    let mut kept: Vec<&FacilityObject> = all_objects.iter().collect();

    if !spec.search_text.trim().is_empty() {
        kept = text_stage(all_objects, &spec.search_text);
    }

    if let Some(facility_type) = spec.facility_type {
        kept.retain(|object| object.facility_type == facility_type);
    }

    if let (Some(radius), Some(reference)) = (spec.radius_meters, reference) {
        kept.retain(|object| match object.valid_location() {
            Some(location) => haversine_distance(&reference, &location) <= radius,
            None => false,
        });
    }

    if spec.min_rating > 0.0 {
        kept.retain(|object| object.average_rating >= spec.min_rating);
    }

    kept.into_iter().cloned().collect()
}

/// Text matches plus the gyms that own them, in original order, once each.
fn text_stage<'a>(all_objects: &'a [FacilityObject], query: &str) -> Vec<&'a FacilityObject> {
    let needle = query.to_lowercase();
    let matches = |object: &FacilityObject| {
        object.title.to_lowercase().contains(&needle)
            || object.description.to_lowercase().contains(&needle)
    };

    // Parents are looked up in the full list, not the matched subset
    let parents: HashSet<&str> = all_objects
        .iter()
        .filter(|object| matches(*object))
        .filter_map(|object| object.parent_facility_id.as_deref())
        .collect();

    let mut seen = HashSet::new();
    let mut kept = Vec::new();
    for object in all_objects {
        let included = matches(object) || (object.is_gym() && parents.contains(object.id.as_str()));
        if included && seen.insert(object.id.as_str()) {
            kept.push(object);
        }
    }
    kept
}
