// Proximity detection: near/far hysteresis over a facility snapshot

mod engine;

pub use engine::{NotificationState, ProximityEngine, Transition};

use crate::facility::FacilityType;
use serde::{Deserialize, Serialize};

#[cfg(test)]
mod tests;

/// Default distance at or below which a facility counts as "near" (meters)
pub const DEFAULT_NEAR_THRESHOLD_METERS: f64 = 100.0;

/// Default far-threshold as a multiple of the near-threshold
pub const DEFAULT_FAR_THRESHOLD_MULTIPLIER: f64 = 2.0;

/// Hysteresis band configuration
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProximityConfig {
    pub near_threshold_meters: f64,
    pub far_threshold_multiplier: f64,
}

impl ProximityConfig {
    /// Distance beyond which a notified facility is re-armed (meters)
    pub fn far_threshold_meters(&self) -> f64 {
        self.near_threshold_meters * self.far_threshold_multiplier
    }
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            near_threshold_meters: DEFAULT_NEAR_THRESHOLD_METERS,
            far_threshold_multiplier: DEFAULT_FAR_THRESHOLD_MULTIPLIER,
        }
    }
}

/// "You are near facility X", produced on a near-threshold crossing
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProximityAlert {
    pub object_id: String,
    pub title: String,
    pub facility_type: FacilityType,
    pub distance_meters: f64,
}
