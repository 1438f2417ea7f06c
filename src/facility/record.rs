use super::{FacilityObject, FacilityType};
use crate::geo::LatLon;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

/// Reasons a remote record cannot become a `FacilityObject`
#[derive(Debug, Clone, PartialEq)]
pub enum RecordError {
    NotAnObject,
    MissingId,
    MissingType,
    UnknownType(String),
    Malformed(String),
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::NotAnObject => write!(f, "record must be a JSON object"),
            RecordError::MissingId => write!(f, "record has no id"),
            RecordError::MissingType => write!(f, "record has no type"),
            RecordError::UnknownType(t) => write!(f, "unknown facility type '{}'", t),
            RecordError::Malformed(field) => write!(f, "malformed field '{}'", field),
        }
    }
}

impl std::error::Error for RecordError {}

/// Parses one remote record.
///
/// Only `id` and `type` are mandatory. Text fields default to empty,
/// counters to zero, and a missing or out-of-range coordinate yields
/// `location = None`. Present-but-wrong-typed numeric fields are rejected.
pub fn parse_record(value: &Value) -> Result<FacilityObject, RecordError> {
    let record = value.as_object().ok_or(RecordError::NotAnObject)?;

    let id = match record.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => return Err(RecordError::MissingId),
    };

    let facility_type: FacilityType = record
        .get("type")
        .and_then(Value::as_str)
        .ok_or(RecordError::MissingType)?
        .parse()?;

    let created_at = match record.get("createdAt") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(
            DateTime::parse_from_rfc3339(s)
                .map_err(|_| RecordError::Malformed("createdAt".to_string()))?
                .with_timezone(&Utc),
        ),
        Some(_) => return Err(RecordError::Malformed("createdAt".to_string())),
    };

    let parent_facility_id = record
        .get("parentFacilityId")
        .or_else(|| record.get("parentGymId"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Ok(FacilityObject {
        id,
        title: string_field(record, "title"),
        description: string_field(record, "description"),
        facility_type,
        location: location_field(record),
        image_url: string_field(record, "imageUrl"),
        author_id: string_field(record, "authorId"),
        author_name: string_field(record, "authorName"),
        created_at,
        attributes: attributes_field(record),
        average_rating: rating_field(record)?,
        ratings_count: count_field(record, "ratingsCount")?,
        comments_count: count_field(record, "commentsCount")?,
        parent_facility_id,
    })
}

/// Parses a batch, dropping (and logging) records that fail.
///
/// Valid records keep their relative order.
pub fn parse_records(values: &[Value]) -> Vec<FacilityObject> {
    values
        .iter()
        .enumerate()
        .filter_map(|(index, value)| match parse_record(value) {
            Ok(object) => Some(object),
            Err(e) => {
                let record_id = value.get("id").and_then(Value::as_str).unwrap_or("<none>");
                warn!(
                    index = index,
                    record_id = record_id,
                    error = %e,
                    "Dropping malformed facility record"
                );
                None
            }
        })
        .collect()
}

fn string_field(record: &Map<String, Value>, key: &str) -> String {
    record
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn location_field(record: &Map<String, Value>) -> Option<LatLon> {
    let location = record.get("location")?.as_object()?;
    let latitude = location.get("latitude")?.as_f64()?;
    let longitude = location.get("longitude")?.as_f64()?;
    Some(LatLon::new(latitude, longitude)).filter(LatLon::is_valid)
}

fn attributes_field(record: &Map<String, Value>) -> BTreeMap<String, String> {
    let Some(attributes) = record.get("attributes").and_then(Value::as_object) else {
        return BTreeMap::new();
    };

    attributes
        .iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), text)
        })
        .collect()
}

fn rating_field(record: &Map<String, Value>) -> Result<f64, RecordError> {
    match record.get("averageRating") {
        None | Some(Value::Null) => Ok(0.0),
        Some(value) => value
            .as_f64()
            .filter(|r| r.is_finite() && *r >= 0.0)
            .ok_or_else(|| RecordError::Malformed("averageRating".to_string())),
    }
}

fn count_field(record: &Map<String, Value>, key: &str) -> Result<u32, RecordError> {
    match record.get(key) {
        None | Some(Value::Null) => Ok(0),
        Some(value) => value
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| RecordError::Malformed(key.to_string())),
    }
}
