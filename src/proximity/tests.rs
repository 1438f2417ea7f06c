use super::*;
use crate::facility::FacilityObject;
use crate::geo::LatLon;

// One meter of latitude in degrees (R = 6,371,000 m)
const DEG_PER_METER: f64 = 360.0 / (2.0 * std::f64::consts::PI * 6_371_000.0);

fn gym_at(id: &str, latitude: f64) -> FacilityObject {
    FacilityObject::new(id, format!("Gym {}", id), FacilityType::Gym).with_location(latitude, 0.0)
}

fn position_at_meters(meters: f64) -> LatLon {
    LatLon::new(meters * DEG_PER_METER, 0.0)
}

#[test]
fn test_default_thresholds() {
    let config = ProximityConfig::default();
    assert_eq!(config.near_threshold_meters, 100.0);
    assert_eq!(config.far_threshold_meters(), 200.0);
}

#[test]
fn test_hysteresis_sequence() {
    let mut engine = ProximityEngine::new(ProximityConfig::default());

    let transitions: Vec<Transition> = [50.0, 50.0, 150.0, 250.0, 50.0]
        .iter()
        .map(|d| engine.observe("gym-1", *d))
        .collect();

    assert_eq!(
        transitions,
        vec![
            Transition::Notify,
            Transition::Unchanged,
            Transition::Unchanged,
            Transition::Rearm,
            Transition::Notify,
        ]
    );
}

#[test]
fn test_threshold_boundaries() {
    let mut engine = ProximityEngine::new(ProximityConfig::default());

    // Exactly at near threshold notifies
    assert_eq!(engine.observe("g", 100.0), Transition::Notify);
    // Exactly at far threshold stays in the dead zone
    assert_eq!(engine.observe("g", 200.0), Transition::Unchanged);
    assert!(engine.state().contains("g"));
    assert_eq!(engine.observe("g", 200.1), Transition::Rearm);
    assert!(!engine.state().contains("g"));
}

#[test]
fn test_dead_zone_does_not_notify_unarmed_object() {
    let mut engine = ProximityEngine::new(ProximityConfig::default());

    assert_eq!(engine.observe("g", 150.0), Transition::Unchanged);
    assert_eq!(engine.observe("g", 250.0), Transition::Unchanged);
    assert!(engine.state().is_empty());
}

#[test]
fn test_objects_are_tracked_independently() {
    let mut engine = ProximityEngine::new(ProximityConfig::default());

    assert_eq!(engine.observe("a", 10.0), Transition::Notify);
    assert_eq!(engine.observe("b", 10.0), Transition::Notify);
    assert_eq!(engine.observe("a", 500.0), Transition::Rearm);
    assert_eq!(engine.observe("b", 10.0), Transition::Unchanged);
    assert_eq!(engine.state().len(), 1);
}

#[test]
fn test_evaluate_emits_alerts_for_near_objects_only() {
    let mut engine = ProximityEngine::new(ProximityConfig::default());
    let objects = vec![
        gym_at("near", 0.0),
        gym_at("dead-zone", 150.0 * DEG_PER_METER),
        gym_at("far", 1_000.0 * DEG_PER_METER),
    ];

    let alerts = engine.evaluate(position_at_meters(0.0), &objects);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].object_id, "near");
    assert_eq!(alerts[0].facility_type, FacilityType::Gym);
    assert!(alerts[0].distance_meters < 1.0);

    // Second tick at the same spot: nothing new
    assert!(engine.evaluate(position_at_meters(0.0), &objects).is_empty());
}

#[test]
fn test_evaluate_walk_away_and_return() {
    let mut engine = ProximityEngine::new(ProximityConfig::default());
    let objects = vec![gym_at("g", 0.0)];

    let fired: Vec<usize> = [50.0, 50.0, 150.0, 250.0, 50.0]
        .iter()
        .map(|m| engine.evaluate(position_at_meters(*m), &objects).len())
        .collect();

    assert_eq!(fired, vec![1, 0, 0, 0, 1]);
}

#[test]
fn test_evaluate_skips_objects_without_location() {
    let mut engine = ProximityEngine::new(ProximityConfig::default());
    let mut no_location = FacilityObject::new("x", "Nowhere", FacilityType::Gym);
    no_location.location = None;
    let mut invalid = FacilityObject::new("y", "Broken", FacilityType::Gym);
    invalid.location = Some(LatLon::new(f64::NAN, 0.0));

    let alerts = engine.evaluate(position_at_meters(0.0), &[no_location, invalid]);
    assert!(alerts.is_empty());
    assert!(engine.state().is_empty());
}

#[test]
fn test_reset_clears_state() {
    let mut engine = ProximityEngine::new(ProximityConfig::default());
    engine.observe("g", 10.0);
    engine.reset();

    assert!(engine.state().is_empty());
    assert_eq!(engine.observe("g", 10.0), Transition::Notify);
}

#[test]
fn test_custom_thresholds() {
    let mut engine = ProximityEngine::new(ProximityConfig {
        near_threshold_meters: 50.0,
        far_threshold_multiplier: 3.0,
    });

    assert_eq!(engine.observe("g", 60.0), Transition::Unchanged);
    assert_eq!(engine.observe("g", 40.0), Transition::Notify);
    assert_eq!(engine.observe("g", 140.0), Transition::Unchanged);
    assert_eq!(engine.observe("g", 151.0), Transition::Rearm);
}

#[test]
fn test_out_of_range_position_is_ignored() {
    let mut engine = ProximityEngine::new(ProximityConfig::default());
    let gym = FacilityObject::new("g", "Equator Gym", FacilityType::Gym).with_location(0.0, 0.0);

    // Haversine over (180, 180) lands on the gym itself
    let alerts = engine.evaluate(LatLon::new(180.0, 180.0), &[gym.clone()]);
    assert!(alerts.is_empty());
    assert!(engine.state().is_empty());

    // A notified facility is not re-armed by a bogus far-away fix either
    assert_eq!(engine.evaluate(LatLon::new(0.0, 0.0), &[gym.clone()]).len(), 1);
    let alerts = engine.evaluate(LatLon::new(f64::NAN, 10.0), &[gym.clone()]);
    assert!(alerts.is_empty());
    assert!(engine.state().contains("g"));
    assert!(engine.evaluate(LatLon::new(0.0, 0.0), &[gym]).is_empty());
}
