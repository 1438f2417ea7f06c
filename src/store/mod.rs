// Facility store collaborator seam and the in-memory directory

use crate::facility::{FacilityObject, ValidationError};
use anyhow::Result;
use async_trait::async_trait;
use std::fmt;

mod memory;
mod points;

pub use memory::{InMemoryFacilityStore, LocationRecord};
pub use points::{LeaderboardEntry, POINTS_ADD_COMMENT, POINTS_ADD_OBJECT, POINTS_ADD_RATING};

/// Read-only facility source used by the engines.
///
/// Implementations return records in a stable order; the filter engine
/// preserves whatever order it is given.
#[async_trait]
pub trait FacilityStore: Send + Sync {
    /// Every known facility
    async fn fetch_all(&self) -> Result<Vec<FacilityObject>>;

    /// Facilities whose parent is `parent_id`
    async fn fetch_by_parent(&self, parent_id: &str) -> Result<Vec<FacilityObject>>;
}

/// Errors from directory write paths
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    Validation(ValidationError),
    NotFound(String),
    InvalidRating(f64),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Validation(e) => write!(f, "{}", e),
            StoreError::NotFound(id) => write!(f, "facility '{}' not found", id),
            StoreError::InvalidRating(value) => {
                write!(f, "rating must be between 1 and 5, got {}", value)
            }
        }
    }
}

impl std::error::Error for StoreError {}

impl From<ValidationError> for StoreError {
    fn from(e: ValidationError) -> Self {
        StoreError::Validation(e)
    }
}
