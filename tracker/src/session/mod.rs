//! Proximity tracking session.
//!
//! A session subscribes to a location source and runs one tick per sample:
//! persist the sample (fire-and-forget), fetch the facility list, evaluate the
//! proximity engine and present any alerts. The engine's notification state
//! lives inside the session task, so stopping the session discards it.

use crate::presenter::{Notification, NotificationPresenter};
use crate::remote::LocationSink;
use crate::source::{LocationRequest, LocationSource};
use chrono::{DateTime, Utc};
use fitmap::config::TrackingConfig;
use fitmap::geo::LocationSample;
use fitmap::proximity::ProximityEngine;
use fitmap::store::FacilityStore;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};

/// Lifecycle of a tracking session
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    Starting,
    Running,
    /// Location feed could not be started; nothing will be evaluated
    Unavailable(String),
    Stopped,
}

/// Status information for a tracking session.
#[derive(Clone, Debug)]
pub struct SessionStatus {
    pub state: SessionState,
    /// Last fully evaluated tick
    pub last_tick: Option<DateTime<Utc>>,
    /// Total number of evaluated ticks
    pub tick_count: u64,
    /// Ticks skipped for an out-of-range sample or a failed/timed-out fetch
    pub skipped_ticks: u64,
    pub notifications_sent: u64,
    pub last_error: Option<String>,
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self {
            state: SessionState::Starting,
            last_tick: None,
            tick_count: 0,
            skipped_ticks: 0,
            notifications_sent: 0,
            last_error: None,
        }
    }
}

/// Owns the collaborators of one user's tracking session.
pub struct TrackingSession {
    user_id: String,
    source: Arc<dyn LocationSource>,
    store: Arc<dyn FacilityStore>,
    sink: Arc<dyn LocationSink>,
    presenter: Arc<dyn NotificationPresenter>,
    config: TrackingConfig,
    status: Arc<Mutex<SessionStatus>>,
}

/// Running session; `stop` unsubscribes and drops the notification state.
pub struct SessionHandle {
    task: JoinHandle<()>,
    status: Arc<Mutex<SessionStatus>>,
}

impl TrackingSession {
    pub fn new(
        user_id: String,
        source: Arc<dyn LocationSource>,
        store: Arc<dyn FacilityStore>,
        sink: Arc<dyn LocationSink>,
        presenter: Arc<dyn NotificationPresenter>,
        config: TrackingConfig,
    ) -> Self {
        Self {
            user_id,
            source,
            store,
            sink,
            presenter,
            config,
            status: Arc::new(Mutex::new(SessionStatus::default())),
        }
    }

    /// Returns a clone of the status tracker for external monitoring.
    pub fn status(&self) -> Arc<Mutex<SessionStatus>> {
        Arc::clone(&self.status)
    }

    /// Starts the session task (non-blocking).
    ///
    /// Every start builds a fresh engine; nothing carries over from an
    /// earlier run.
    pub fn start(&self) -> SessionHandle {
        let task = SessionTask {
            user_id: self.user_id.clone(),
            source: Arc::clone(&self.source),
            store: Arc::clone(&self.store),
            sink: Arc::clone(&self.sink),
            presenter: Arc::clone(&self.presenter),
            config: self.config.clone(),
            status: Arc::clone(&self.status),
        };

        SessionHandle {
            task: tokio::spawn(task.run()),
            status: Arc::clone(&self.status),
        }
    }
}

impl SessionHandle {
    /// True once the session task has ended on its own or been stopped
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancels the session and waits for the task to wind down.
    pub async fn stop(self) {
        self.task.abort();
        // Cancellation is the expected outcome here
        let _ = self.task.await;
        let mut status = self.status.lock().await;
        if !matches!(status.state, SessionState::Unavailable(_)) {
            status.state = SessionState::Stopped;
        }
    }
}

struct SessionTask {
    user_id: String,
    source: Arc<dyn LocationSource>,
    store: Arc<dyn FacilityStore>,
    sink: Arc<dyn LocationSink>,
    presenter: Arc<dyn NotificationPresenter>,
    config: TrackingConfig,
    status: Arc<Mutex<SessionStatus>>,
}

impl SessionTask {
    async fn run(self) {
        {
            let mut status = self.status.lock().await;
            status.state = SessionState::Starting;
            status.last_error = None;
        }

        let request = LocationRequest::from_config(&self.config);
        let mut updates = match self.source.subscribe(request).await {
            Ok(updates) => updates,
            Err(e) => {
                warn!(user_id = %self.user_id, error = %e, "Location tracking unavailable");
                let mut status = self.status.lock().await;
                status.state = SessionState::Unavailable(e.to_string());
                status.last_error = Some(e.to_string());
                return;
            }
        };

        let proximity = self.config.proximity();
        info!(
            user_id = %self.user_id,
            near_m = proximity.near_threshold_meters,
            far_m = proximity.far_threshold_meters(),
            interval_secs = request.interval.as_secs(),
            "Tracking session started"
        );
        self.status.lock().await.state = SessionState::Running;

        let mut engine = ProximityEngine::new(proximity);
        while let Some(sample) = updates.next().await {
            self.tick(&mut engine, sample).await;
        }

        info!(user_id = %self.user_id, "Location updates ended");
        self.status.lock().await.state = SessionState::Stopped;
    }

    async fn tick(&self, engine: &mut ProximityEngine, sample: LocationSample) {
        let position = sample.position();
        debug!(
            user_id = %self.user_id,
            latitude = position.latitude,
            longitude = position.longitude,
            accuracy = sample.accuracy,
            "Location tick"
        );

        if !position.is_valid() {
            return self.skip_tick("sample position out of range".to_string()).await;
        }

        self.persist(sample);

        let objects = match timeout(self.config.fetch_timeout(), self.store.fetch_all()).await {
            Ok(Ok(objects)) => objects,
            Ok(Err(e)) => return self.skip_tick(format!("fetch failed: {:#}", e)).await,
            Err(_) => return self.skip_tick("fetch timed out".to_string()).await,
        };

        let alerts = engine.evaluate(position, &objects);
        let mut sent = 0;
        for alert in &alerts {
            let notification = Notification::from_alert(alert);
            match self.presenter.present(&notification).await {
                Ok(()) => {
                    info!(
                        user_id = %self.user_id,
                        object_id = %alert.object_id,
                        distance_m = alert.distance_meters,
                        "Proximity notification sent"
                    );
                    sent += 1;
                }
                Err(e) => error!(
                    user_id = %self.user_id,
                    object_id = %alert.object_id,
                    error = %e,
                    "Failed to present notification"
                ),
            }
        }

        let mut status = self.status.lock().await;
        status.last_tick = Some(Utc::now());
        status.tick_count += 1;
        status.notifications_sent += sent;
        status.last_error = None;
    }

    fn persist(&self, sample: LocationSample) {
        let sink = Arc::clone(&self.sink);
        let user_id = self.user_id.clone();
        tokio::spawn(async move {
            if let Err(e) = sink.record_location(&user_id, &sample).await {
                warn!(user_id = %user_id, error = %e, "Failed to persist location sample");
            }
        });
    }

    async fn skip_tick(&self, reason: String) {
        warn!(user_id = %self.user_id, reason = %reason, "Skipping proximity evaluation");
        let mut status = self.status.lock().await;
        status.skipped_ticks += 1;
        status.last_error = Some(reason);
    }
}

#[cfg(test)]
mod tests;
