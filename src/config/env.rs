use super::FitmapConfig;
use std::path::PathBuf;
use tracing::warn;

/// Applies `FITMAP_*` environment overrides on top of file/default values.
///
/// `lookup` resolves a variable name; production passes `std::env::var`.
/// Unparseable numeric values are ignored with a warning.
pub fn apply_env_overrides<F>(config: &mut FitmapConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("FITMAP_BIND_ADDRESS") {
        config.api.bind_address = v;
    }
    if let Some(v) = lookup("FITMAP_STORE_URL") {
        config.store.base_url = v;
    }
    if let Some(v) = lookup("FITMAP_SEED_FILE") {
        config.store.seed_file = Some(PathBuf::from(v));
    }
    if let Some(v) = lookup("FITMAP_USER_ID") {
        config.tracking.user_id = v;
    }
    if let Some(v) = lookup("FITMAP_REPLAY_FILE") {
        config.tracking.replay_file = Some(PathBuf::from(v));
    }
    if let Some(v) = lookup("FITMAP_WEBHOOK_URL") {
        config.notifications.webhook_url = Some(v);
    }
    if let Some(v) = lookup("FITMAP_NEAR_THRESHOLD_METERS") {
        match v.parse::<f64>() {
            Ok(n) => config.tracking.near_threshold_meters = n,
            Err(_) => warn!(value = %v, "Ignoring invalid FITMAP_NEAR_THRESHOLD_METERS"),
        }
    }
}
