use super::points::{
    LeaderboardEntry, PointsLedger, POINTS_ADD_COMMENT, POINTS_ADD_OBJECT, POINTS_ADD_RATING,
};
use super::{FacilityStore, StoreError};
use crate::facility::{
    parse_records, validate_new_comment, validate_new_facility, Comment, FacilityObject,
    NewComment, NewFacility,
};
use crate::geo::LocationSample;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// Latest raw location reported by a user
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    pub user_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f32,
    pub recorded_at: DateTime<Utc>,
    pub received_at: DateTime<Utc>,
}

#[derive(Default)]
struct Directory {
    /// Insertion order is the listing order
    objects: Vec<FacilityObject>,

    /// object_id -> author_id -> rating
    ratings: HashMap<String, HashMap<String, f64>>,

    /// object_id -> comments, oldest first
    comments: HashMap<String, Vec<Comment>>,
}

/// Facility directory held in memory.
///
/// Enforces the parent/child invariant on writes, keeps the latest
/// location sample per user and awards contribution points.
#[derive(Default)]
pub struct InMemoryFacilityStore {
    directory: RwLock<Directory>,
    locations: DashMap<String, LocationRecord>,
    points: PointsLedger,
}

impl InMemoryFacilityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `objects`, in the given order
    pub fn with_objects(objects: Vec<FacilityObject>) -> Self {
        Self {
            directory: RwLock::new(Directory {
                objects,
                ratings: HashMap::new(),
                comments: HashMap::new(),
            }),
            locations: DashMap::new(),
            points: PointsLedger::default(),
        }
    }

    /// Loads a JSON array of facility records. Malformed records are dropped.
    pub fn load_seed_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed file {}", path.display()))?;
        let records: Vec<Value> =
            serde_json::from_str(&contents).context("Seed file must be a JSON array")?;

        let objects = parse_records(&records);
        info!(
            path = %path.display(),
            records = records.len(),
            loaded = objects.len(),
            "Loaded facility seed file"
        );

        Ok(Self::with_objects(objects))
    }

    pub async fn len(&self) -> usize {
        self.directory.read().await.objects.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn get(&self, id: &str) -> Option<FacilityObject> {
        let directory = self.directory.read().await;
        directory.objects.iter().find(|o| o.id == id).cloned()
    }

    /// Validates and inserts a new facility, assigning its id.
    pub async fn create(&self, new: NewFacility) -> Result<FacilityObject, StoreError> {
        let mut directory = self.directory.write().await;

        validate_new_facility(&new, |parent_id| {
            directory
                .objects
                .iter()
                .find(|o| o.id == parent_id)
                .map(|o| o.facility_type)
        })?;

        let object = FacilityObject {
            id: Uuid::now_v7().to_string(),
            title: new.title.trim().to_string(),
            description: new.description,
            facility_type: new.facility_type,
            location: Some(new.location),
            image_url: new.image_url,
            author_id: new.author_id,
            author_name: new.author_name,
            created_at: Some(Utc::now()),
            attributes: new.attributes,
            average_rating: 0.0,
            ratings_count: 0,
            comments_count: 0,
            parent_facility_id: new.parent_facility_id.filter(|id| !id.is_empty()),
        };

        directory.objects.push(object.clone());
        self.points
            .award(&object.author_id, &object.author_name, POINTS_ADD_OBJECT);

        info!(
            object_id = %object.id,
            facility_type = %object.facility_type,
            parent_id = object.parent_facility_id.as_deref().unwrap_or("-"),
            "Facility created"
        );

        Ok(object)
    }

    /// Records `author_id`'s rating, replacing any earlier one, and
    /// recomputes the object's average from recorded ratings.
    pub async fn rate(
        &self,
        object_id: &str,
        author_id: &str,
        value: f64,
    ) -> Result<FacilityObject, StoreError> {
        if !(1.0..=5.0).contains(&value) {
            return Err(StoreError::InvalidRating(value));
        }

        let mut directory = self.directory.write().await;
        let Directory { objects, ratings, .. } = &mut *directory;

        let object = objects
            .iter_mut()
            .find(|o| o.id == object_id)
            .ok_or_else(|| StoreError::NotFound(object_id.to_string()))?;

        let object_ratings = ratings.entry(object_id.to_string()).or_default();
        if object_ratings.insert(author_id.to_string(), value).is_none() {
            self.points.award(author_id, "", POINTS_ADD_RATING);
        }

        let count = object_ratings.len();
        object.average_rating = object_ratings.values().sum::<f64>() / count as f64;
        object.ratings_count = count as u32;

        info!(
            object_id = %object_id,
            average_rating = object.average_rating,
            ratings_count = object.ratings_count,
            "Facility rated"
        );

        Ok(object.clone())
    }

    /// Removes a facility and, for a gym, every child attached to it.
    ///
    /// Returns the number of removed objects.
    pub async fn delete(&self, id: &str) -> Result<usize, StoreError> {
        let mut directory = self.directory.write().await;

        if !directory.objects.iter().any(|o| o.id == id) {
            return Err(StoreError::NotFound(id.to_string()));
        }

        let before = directory.objects.len();
        directory
            .objects
            .retain(|o| o.id != id && o.parent_facility_id.as_deref() != Some(id));
        let removed_ids: Vec<String> = directory
            .ratings
            .keys()
            .filter(|key| !directory.objects.iter().any(|o| &o.id == *key))
            .cloned()
            .collect();
        for key in removed_ids {
            directory.ratings.remove(&key);
        }
        let Directory {
            objects, comments, ..
        } = &mut *directory;
        comments.retain(|key, _| objects.iter().any(|o| &o.id == key));

        let removed = before - directory.objects.len();
        info!(object_id = %id, removed = removed, "Facility deleted");

        Ok(removed)
    }

    /// Adds a comment to `object_id` and bumps its comment count.
    pub async fn add_comment(
        &self,
        object_id: &str,
        new: NewComment,
    ) -> Result<Comment, StoreError> {
        validate_new_comment(&new)?;

        let mut directory = self.directory.write().await;
        let Directory {
            objects, comments, ..
        } = &mut *directory;

        let object = objects
            .iter_mut()
            .find(|o| o.id == object_id)
            .ok_or_else(|| StoreError::NotFound(object_id.to_string()))?;

        let comment = Comment {
            id: Uuid::now_v7().to_string(),
            object_id: object_id.to_string(),
            author_id: new.author_id,
            author_name: new.author_name,
            author_image_url: new.author_image_url,
            text: new.text.trim().to_string(),
            created_at: Utc::now(),
        };

        let object_comments = comments.entry(object_id.to_string()).or_default();
        object_comments.push(comment.clone());
        object.comments_count = object_comments.len() as u32;

        self.points
            .award(&comment.author_id, &comment.author_name, POINTS_ADD_COMMENT);

        info!(
            object_id = %object_id,
            comment_id = %comment.id,
            comments_count = object.comments_count,
            "Comment added"
        );

        Ok(comment)
    }

    /// Comments on `object_id`, newest first
    pub async fn comments(&self, object_id: &str) -> Result<Vec<Comment>, StoreError> {
        let directory = self.directory.read().await;
        if !directory.objects.iter().any(|o| o.id == object_id) {
            return Err(StoreError::NotFound(object_id.to_string()));
        }

        Ok(directory
            .comments
            .get(object_id)
            .map(|list| list.iter().rev().cloned().collect())
            .unwrap_or_default())
    }

    pub fn points(&self, author_id: &str) -> u32 {
        self.points.points(author_id)
    }

    /// Competition rank of `author_id`, `None` if they never earned points
    pub fn rank(&self, author_id: &str) -> Option<u32> {
        self.points.rank(author_id)
    }

    /// Top `limit` authors by points
    pub fn leaderboard(&self, limit: usize) -> Vec<LeaderboardEntry> {
        self.points.leaderboard(limit)
    }

    /// Stores `sample` as the latest location for `user_id`.
    pub fn record_location(&self, user_id: &str, sample: &LocationSample) -> LocationRecord {
        let record = LocationRecord {
            user_id: user_id.to_string(),
            latitude: sample.latitude,
            longitude: sample.longitude,
            accuracy: sample.accuracy,
            recorded_at: sample.recorded_at,
            received_at: Utc::now(),
        };
        self.locations.insert(user_id.to_string(), record.clone());
        record
    }

    pub fn latest_location(&self, user_id: &str) -> Option<LocationRecord> {
        self.locations.get(user_id).map(|r| r.clone())
    }
}

#[async_trait]
impl FacilityStore for InMemoryFacilityStore {
    async fn fetch_all(&self) -> Result<Vec<FacilityObject>> {
        Ok(self.directory.read().await.objects.clone())
    }

    async fn fetch_by_parent(&self, parent_id: &str) -> Result<Vec<FacilityObject>> {
        let directory = self.directory.read().await;
        Ok(directory
            .objects
            .iter()
            .filter(|o| o.parent_facility_id.as_deref() == Some(parent_id))
            .cloned()
            .collect())
    }
}
