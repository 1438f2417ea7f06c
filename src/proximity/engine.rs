use super::{ProximityAlert, ProximityConfig};
use crate::facility::FacilityObject;
use crate::geo::{haversine_distance, LatLon};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Facility ids already notified in the current "near" episode.
///
/// Owned by a single `ProximityEngine`; discarded with it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NotificationState {
    notified: HashSet<String>,
}

impl NotificationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, object_id: &str) -> bool {
        self.notified.contains(object_id)
    }

    pub fn len(&self) -> usize {
        self.notified.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notified.is_empty()
    }

    pub fn clear(&mut self) {
        self.notified.clear();
    }

    fn insert(&mut self, object_id: &str) -> bool {
        self.notified.insert(object_id.to_string())
    }

    fn remove(&mut self, object_id: &str) -> bool {
        self.notified.remove(object_id)
    }
}

/// Outcome of observing one facility at one distance
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Crossed into the near band while armed; a notification is due
    Notify,
    /// Left past the far threshold; the next approach notifies again
    Rearm,
    /// Already notified, dead zone, or still far away
    Unchanged,
}

/// Converts location ticks into proximity alerts with hysteresis.
///
/// - `distance <= near` and not notified: notify, mark notified
/// - `distance > far` and notified: clear the mark
/// - anything else: no change
///
/// Ticks must be applied serially; the engine holds no lock.
pub struct ProximityEngine {
    config: ProximityConfig,
    state: NotificationState,
}

impl ProximityEngine {
    pub fn new(config: ProximityConfig) -> Self {
        Self {
            config,
            state: NotificationState::new(),
        }
    }

    pub fn config(&self) -> &ProximityConfig {
        &self.config
    }

    pub fn state(&self) -> &NotificationState {
        &self.state
    }

    /// Applies the hysteresis rule for one facility.
    pub fn observe(&mut self, object_id: &str, distance_meters: f64) -> Transition {
        if distance_meters <= self.config.near_threshold_meters && !self.state.contains(object_id) {
            self.state.insert(object_id);
            return Transition::Notify;
        }

        if distance_meters > self.config.far_threshold_meters() && self.state.remove(object_id) {
            return Transition::Rearm;
        }

        Transition::Unchanged
    }

    /// Evaluates one tick: `position` against a fresh facility snapshot.
    ///
    /// Objects without a valid location are skipped. An invalid `position`
    /// yields no alerts and leaves the state untouched. Returns alerts in
    /// snapshot order.
    pub fn evaluate(&mut self, position: LatLon, objects: &[FacilityObject]) -> Vec<ProximityAlert> {
        let mut alerts = Vec::new();

        if !position.is_valid() {
            warn!(
                latitude = position.latitude,
                longitude = position.longitude,
                "Ignoring out-of-range position"
            );
            return alerts;
        }

        for object in objects {
            let Some(location) = object.valid_location() else {
                debug!(object_id = %object.id, "Skipping facility without location");
                continue;
            };

            let distance = haversine_distance(&position, &location);

            match self.observe(&object.id, distance) {
                Transition::Notify => {
                    info!(
                        object_id = %object.id,
                        title = %object.title,
                        distance_m = distance as u64,
                        "Facility nearby"
                    );
                    alerts.push(ProximityAlert {
                        object_id: object.id.clone(),
                        title: object.title.clone(),
                        facility_type: object.facility_type,
                        distance_meters: distance,
                    });
                }
                Transition::Rearm => {
                    debug!(
                        object_id = %object.id,
                        distance_m = distance as u64,
                        "Facility left far threshold, notification re-armed"
                    );
                }
                Transition::Unchanged => {}
            }
        }

        alerts
    }

    /// Forgets every notified facility.
    pub fn reset(&mut self) {
        self.state.clear();
    }
}
