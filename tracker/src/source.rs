//! Location feed seam and the JSON-lines replay source.

use async_trait::async_trait;
use chrono::Utc;
use fitmap::config::TrackingConfig;
use fitmap::geo::LocationSample;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

/// `tokio::time::interval` rejects a zero period
const MIN_REPLAY_PERIOD: Duration = Duration::from_millis(1);

/// Stream of samples for one subscription. Dropping it unsubscribes.
pub type LocationSubscription = ReceiverStream<LocationSample>;

/// Cadence asked of the location source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocationRequest {
    /// Target interval between samples
    pub interval: Duration,
    /// Samples never arrive faster than this
    pub fastest_interval: Duration,
}

impl LocationRequest {
    pub fn from_config(config: &TrackingConfig) -> Self {
        Self {
            interval: config.interval(),
            fastest_interval: config.fastest_interval(),
        }
    }
}

impl Default for LocationRequest {
    fn default() -> Self {
        Self::from_config(&TrackingConfig::default())
    }
}

/// Why a location feed cannot be started
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    PermissionDenied,
    Unavailable(String),
}

impl fmt::Display for LocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationError::PermissionDenied => write!(f, "location permission not granted"),
            LocationError::Unavailable(reason) => write!(f, "location unavailable: {}", reason),
        }
    }
}

impl std::error::Error for LocationError {}

/// Periodic device-location provider.
///
/// Samples are delivered serially on the returned stream; the session
/// processes one before pulling the next.
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn subscribe(
        &self,
        request: LocationRequest,
    ) -> Result<LocationSubscription, LocationError>;
}

/// Replays newline-delimited JSON samples from a file, one per `interval`.
///
/// Each emitted sample is stamped with the emission time. Lines that fail to
/// parse are skipped with a warning.
pub struct ReplayLocationSource {
    path: PathBuf,
    looping: bool,
}

impl ReplayLocationSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            looping: false,
        }
    }

    /// Restart from the first sample after the last one
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    async fn read_samples(&self) -> Result<Vec<LocationSample>, LocationError> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            LocationError::Unavailable(format!("cannot read {}: {}", self.path.display(), e))
        })?;

        let mut samples = Vec::new();
        for (index, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<LocationSample>(line) {
                Ok(sample) => samples.push(sample),
                Err(e) => warn!(
                    path = %self.path.display(),
                    line = index + 1,
                    error = %e,
                    "Skipping malformed location sample"
                ),
            }
        }

        if samples.is_empty() {
            return Err(LocationError::Unavailable(format!(
                "{} contains no location samples",
                self.path.display()
            )));
        }
        Ok(samples)
    }
}

#[async_trait]
impl LocationSource for ReplayLocationSource {
    async fn subscribe(
        &self,
        request: LocationRequest,
    ) -> Result<LocationSubscription, LocationError> {
        let samples = self.read_samples().await?;
        let looping = self.looping;
        let (tx, rx) = mpsc::channel(1);

        info!(
            path = %self.path.display(),
            samples = samples.len(),
            interval_secs = request.interval.as_secs(),
            looping = looping,
            "Replaying location samples"
        );

        tokio::spawn(async move {
            let period = request
                .interval
                .max(request.fastest_interval)
                .max(MIN_REPLAY_PERIOD);
            let mut ticker = interval(period);
            loop {
                for sample in &samples {
                    ticker.tick().await;
                    let sample = LocationSample {
                        recorded_at: Utc::now(),
                        ..sample.clone()
                    };
                    if tx.send(sample).await.is_err() {
                        debug!("Location subscriber gone, stopping replay");
                        return;
                    }
                }
                if !looping {
                    debug!("Replay finished");
                    return;
                }
            }
        });

        Ok(ReceiverStream::new(rx))
    }
}
