mod env;
pub use env::apply_env_overrides;

use crate::proximity::{
    ProximityConfig, DEFAULT_FAR_THRESHOLD_MULTIPLIER, DEFAULT_NEAR_THRESHOLD_METERS,
};
use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Complete FitMap configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FitmapConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

impl FitmapConfig {
    /// Rejects values the engines cannot run with.
    pub fn validate(&self) -> Result<()> {
        let t = &self.tracking;
        ensure!(t.interval_seconds > 0, "tracking.interval_seconds must be positive");
        ensure!(
            t.fastest_interval_seconds > 0 && t.fastest_interval_seconds <= t.interval_seconds,
            "tracking.fastest_interval_seconds must be in 1..=interval_seconds"
        );
        ensure!(
            t.fetch_timeout_seconds > 0,
            "tracking.fetch_timeout_seconds must be positive"
        );
        ensure!(
            t.near_threshold_meters > 0.0,
            "tracking.near_threshold_meters must be positive"
        );
        ensure!(
            t.far_threshold_multiplier >= 1.0,
            "tracking.far_threshold_multiplier must be at least 1.0"
        );
        ensure!(
            self.store.request_timeout_seconds > 0,
            "store.request_timeout_seconds must be positive"
        );
        Ok(())
    }
}

/// HTTP API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

fn default_bind_address() -> String {
    "0.0.0.0:3000".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

/// Facility store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// JSON array of facility records loaded at startup
    #[serde(default)]
    pub seed_file: Option<PathBuf>,
    /// Directory service base URL (used by remote clients)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

impl StoreConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            seed_file: None,
            base_url: default_base_url(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// Proximity tracking session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TrackingConfig {
    #[serde(default = "default_user_id")]
    pub user_id: String,
    /// Target interval between location samples
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
    /// Minimum interval between location samples
    #[serde(default = "default_fastest_interval")]
    pub fastest_interval_seconds: u64,
    /// Upper bound on one facility fetch
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_seconds: u64,
    #[serde(default = "default_near_threshold")]
    pub near_threshold_meters: f64,
    #[serde(default = "default_far_multiplier")]
    pub far_threshold_multiplier: f64,
    /// Newline-delimited JSON location samples to replay
    #[serde(default)]
    pub replay_file: Option<PathBuf>,
    #[serde(default)]
    pub replay_loop: bool,
}

fn default_user_id() -> String {
    "anonymous".to_string()
}

fn default_interval() -> u64 {
    10
}

fn default_fastest_interval() -> u64 {
    5
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_near_threshold() -> f64 {
    DEFAULT_NEAR_THRESHOLD_METERS
}

fn default_far_multiplier() -> f64 {
    DEFAULT_FAR_THRESHOLD_MULTIPLIER
}

impl TrackingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    pub fn fastest_interval(&self) -> Duration {
        Duration::from_secs(self.fastest_interval_seconds)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_seconds)
    }

    pub fn proximity(&self) -> ProximityConfig {
        ProximityConfig {
            near_threshold_meters: self.near_threshold_meters,
            far_threshold_multiplier: self.far_threshold_multiplier,
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
            interval_seconds: default_interval(),
            fastest_interval_seconds: default_fastest_interval(),
            fetch_timeout_seconds: default_fetch_timeout(),
            near_threshold_meters: default_near_threshold(),
            far_threshold_multiplier: default_far_multiplier(),
            replay_file: None,
            replay_loop: false,
        }
    }
}

/// Notification delivery configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationConfig {
    /// POST target for notifications; logged only when absent
    #[serde(default)]
    pub webhook_url: Option<String>,
}

/// Load configuration from TOML file
pub fn load_config(path: &Path) -> Result<FitmapConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: FitmapConfig = toml::from_str(&contents).context("Failed to parse config file")?;
    Ok(config)
}

/// Loads `path` when given (defaults otherwise), applies env overrides, validates.
pub fn load_effective_config(path: Option<&Path>) -> Result<FitmapConfig> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => FitmapConfig::default(),
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}
