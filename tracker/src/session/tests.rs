use super::*;
use crate::source::{LocationError, LocationSubscription};
use anyhow::Result;
use async_trait::async_trait;
use fitmap::facility::{FacilityObject, FacilityType};
use fitmap::store::InMemoryFacilityStore;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

const GYM_LAT: f64 = 43.3209;
const GYM_LON: f64 = 21.8958;

/// Roughly `meters` north of the gym
fn sample_at(meters: f64) -> LocationSample {
    LocationSample::new(GYM_LAT + meters / 111_195.0, GYM_LON, 5.0)
}

fn gym() -> FacilityObject {
    FacilityObject::new("gym-1", "Iron Temple", FacilityType::Gym).with_location(GYM_LAT, GYM_LON)
}

/// Hands out one pre-built channel per subscription
struct ChannelSource {
    receivers: std::sync::Mutex<Vec<mpsc::Receiver<LocationSample>>>,
}

impl ChannelSource {
    fn new(count: usize) -> (Arc<Self>, Vec<mpsc::Sender<LocationSample>>) {
        let mut senders = Vec::new();
        let mut receivers = Vec::new();
        for _ in 0..count {
            let (tx, rx) = mpsc::channel(16);
            senders.push(tx);
            receivers.push(rx);
        }
        receivers.reverse();
        let source = Arc::new(Self {
            receivers: std::sync::Mutex::new(receivers),
        });
        (source, senders)
    }
}

#[async_trait]
impl LocationSource for ChannelSource {
    async fn subscribe(
        &self,
        _request: LocationRequest,
    ) -> Result<LocationSubscription, LocationError> {
        self.receivers
            .lock()
            .unwrap()
            .pop()
            .map(ReceiverStream::new)
            .ok_or_else(|| LocationError::Unavailable("no more channels".to_string()))
    }
}

struct DeniedSource;

#[async_trait]
impl LocationSource for DeniedSource {
    async fn subscribe(
        &self,
        _request: LocationRequest,
    ) -> Result<LocationSubscription, LocationError> {
        Err(LocationError::PermissionDenied)
    }
}

/// Fails the first `failures` fetches, then serves `objects`
struct FlakyStore {
    objects: Vec<FacilityObject>,
    failures: usize,
    calls: AtomicUsize,
}

#[async_trait]
impl FacilityStore for FlakyStore {
    async fn fetch_all(&self) -> Result<Vec<FacilityObject>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            anyhow::bail!("directory unreachable");
        }
        Ok(self.objects.clone())
    }

    async fn fetch_by_parent(&self, _parent_id: &str) -> Result<Vec<FacilityObject>> {
        Ok(vec![])
    }
}

struct HangingStore;

#[async_trait]
impl FacilityStore for HangingStore {
    async fn fetch_all(&self) -> Result<Vec<FacilityObject>> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(vec![gym()])
    }

    async fn fetch_by_parent(&self, _parent_id: &str) -> Result<Vec<FacilityObject>> {
        Ok(vec![])
    }
}

#[derive(Default)]
struct RecordingSink {
    samples: std::sync::Mutex<Vec<(String, LocationSample)>>,
}

#[async_trait]
impl LocationSink for RecordingSink {
    async fn record_location(&self, user_id: &str, sample: &LocationSample) -> Result<()> {
        self.samples
            .lock()
            .unwrap()
            .push((user_id.to_string(), sample.clone()));
        Ok(())
    }
}

struct FailingSink;

#[async_trait]
impl LocationSink for FailingSink {
    async fn record_location(&self, _user_id: &str, _sample: &LocationSample) -> Result<()> {
        anyhow::bail!("upload failed")
    }
}

#[derive(Default)]
struct RecordingPresenter {
    shown: std::sync::Mutex<Vec<Notification>>,
    fail: bool,
}

impl RecordingPresenter {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    fn shown(&self) -> Vec<Notification> {
        self.shown.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationPresenter for RecordingPresenter {
    async fn present(&self, notification: &Notification) -> Result<()> {
        if self.fail {
            anyhow::bail!("notifications disabled");
        }
        self.shown.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

fn test_config() -> TrackingConfig {
    TrackingConfig {
        fetch_timeout_seconds: 1,
        ..TrackingConfig::default()
    }
}

fn session(
    source: Arc<dyn LocationSource>,
    store: Arc<dyn FacilityStore>,
    sink: Arc<dyn LocationSink>,
    presenter: Arc<dyn NotificationPresenter>,
) -> TrackingSession {
    TrackingSession::new(
        "ana".to_string(),
        source,
        store,
        sink,
        presenter,
        test_config(),
    )
}

/// Polls the status until `done` holds (or panics after a few seconds)
async fn wait_for<F>(status: &Arc<Mutex<SessionStatus>>, done: F) -> SessionStatus
where
    F: Fn(&SessionStatus) -> bool,
{
    for _ in 0..500 {
        {
            let current = status.lock().await;
            if done(&*current) {
                return current.clone();
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for session status: {:?}", status.lock().await);
}

#[tokio::test]
async fn test_initial_status() {
    let (source, _senders) = ChannelSource::new(1);
    let session = session(
        source,
        Arc::new(InMemoryFacilityStore::new()),
        Arc::new(RecordingSink::default()),
        Arc::new(RecordingPresenter::default()),
    );

    let status = session.status();
    let status = status.lock().await;
    assert_eq!(status.state, SessionState::Starting);
    assert_eq!(status.tick_count, 0);
    assert!(status.last_tick.is_none());
}

#[tokio::test]
async fn test_walk_in_linger_leave_return() {
    let (source, senders) = ChannelSource::new(1);
    let presenter = Arc::new(RecordingPresenter::default());
    let session = session(
        source,
        Arc::new(InMemoryFacilityStore::with_objects(vec![gym()])),
        Arc::new(RecordingSink::default()),
        presenter.clone(),
    );

    let status = session.status();
    let handle = session.start();

    for meters in [45.5, 40.0, 150.0, 250.0, 45.5] {
        senders[0].send(sample_at(meters)).await.unwrap();
    }

    let done = wait_for(&status, |s| s.tick_count == 5).await;
    assert_eq!(done.state, SessionState::Running);
    assert_eq!(done.notifications_sent, 2);
    assert!(done.last_tick.is_some());

    let shown = presenter.shown();
    assert_eq!(shown.len(), 2);
    assert_eq!(shown[0].object_id, "gym-1");
    assert_eq!(shown[0].title, "🏋️ Facility nearby!");
    assert_eq!(
        shown[0].body,
        "Iron Temple is 45 m away from you. Tap to see details."
    );

    handle.stop().await;
}

#[tokio::test]
async fn test_permission_denied_reports_unavailable() {
    let session = session(
        Arc::new(DeniedSource),
        Arc::new(InMemoryFacilityStore::new()),
        Arc::new(RecordingSink::default()),
        Arc::new(RecordingPresenter::default()),
    );

    let status = session.status();
    let handle = session.start();

    let done = wait_for(&status, |s| matches!(s.state, SessionState::Unavailable(_))).await;
    assert_eq!(
        done.state,
        SessionState::Unavailable("location permission not granted".to_string())
    );
    assert_eq!(done.tick_count, 0);

    // Task ends on its own; stopping afterwards is harmless
    for _ in 0..100 {
        if handle.is_finished() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(handle.is_finished());
    handle.stop().await;
}

#[tokio::test]
async fn test_fetch_failure_skips_tick_and_keeps_state() {
    let (source, senders) = ChannelSource::new(1);
    let presenter = Arc::new(RecordingPresenter::default());
    let store = Arc::new(FlakyStore {
        objects: vec![gym()],
        failures: 1,
        calls: AtomicUsize::new(0),
    });
    let session = session(
        source,
        store.clone(),
        Arc::new(RecordingSink::default()),
        presenter.clone(),
    );

    let status = session.status();
    let handle = session.start();

    // Tick 1: fetch fails, nothing evaluated
    senders[0].send(sample_at(20.0)).await.unwrap();
    let after_failure = wait_for(&status, |s| s.skipped_ticks == 1).await;
    assert_eq!(after_failure.tick_count, 0);
    assert!(after_failure.last_error.is_some());
    assert!(presenter.shown().is_empty());

    // Tick 2: notifies; tick 3: already notified
    senders[0].send(sample_at(20.0)).await.unwrap();
    senders[0].send(sample_at(30.0)).await.unwrap();
    let done = wait_for(&status, |s| s.tick_count == 2).await;
    assert_eq!(done.skipped_ticks, 1);
    assert_eq!(done.notifications_sent, 1);
    assert!(done.last_error.is_none());
    assert_eq!(store.calls.load(Ordering::SeqCst), 3);

    handle.stop().await;
}

#[tokio::test]
async fn test_fetch_timeout_skips_tick() {
    let (source, senders) = ChannelSource::new(1);
    let presenter = Arc::new(RecordingPresenter::default());
    let session = session(
        source,
        Arc::new(HangingStore),
        Arc::new(RecordingSink::default()),
        presenter.clone(),
    );

    let status = session.status();
    let handle = session.start();
    senders[0].send(sample_at(10.0)).await.unwrap();

    let done = wait_for(&status, |s| s.skipped_ticks == 1).await;
    assert_eq!(done.last_error.as_deref(), Some("fetch timed out"));
    assert!(presenter.shown().is_empty());

    handle.stop().await;
}

#[tokio::test]
async fn test_presenter_failure_is_swallowed() {
    let (source, senders) = ChannelSource::new(1);
    let session = session(
        source,
        Arc::new(InMemoryFacilityStore::with_objects(vec![gym()])),
        Arc::new(RecordingSink::default()),
        Arc::new(RecordingPresenter::failing()),
    );

    let status = session.status();
    let handle = session.start();
    senders[0].send(sample_at(10.0)).await.unwrap();
    senders[0].send(sample_at(10.0)).await.unwrap();

    let done = wait_for(&status, |s| s.tick_count == 2).await;
    assert_eq!(done.state, SessionState::Running);
    assert_eq!(done.notifications_sent, 0);

    handle.stop().await;
}

#[tokio::test]
async fn test_samples_are_persisted() {
    let (source, senders) = ChannelSource::new(1);
    let sink = Arc::new(RecordingSink::default());
    let session = session(
        source,
        Arc::new(InMemoryFacilityStore::new()),
        sink.clone(),
        Arc::new(RecordingPresenter::default()),
    );

    let status = session.status();
    let handle = session.start();
    senders[0].send(sample_at(500.0)).await.unwrap();
    wait_for(&status, |s| s.tick_count == 1).await;

    for _ in 0..100 {
        if !sink.samples.lock().unwrap().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let samples = sink.samples.lock().unwrap().clone();
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].0, "ana");

    handle.stop().await;
}

#[tokio::test]
async fn test_persist_failure_does_not_block_tick() {
    let (source, senders) = ChannelSource::new(1);
    let presenter = Arc::new(RecordingPresenter::default());
    let session = session(
        source,
        Arc::new(InMemoryFacilityStore::with_objects(vec![gym()])),
        Arc::new(FailingSink),
        presenter.clone(),
    );

    let status = session.status();
    let handle = session.start();
    senders[0].send(sample_at(10.0)).await.unwrap();

    let done = wait_for(&status, |s| s.tick_count == 1).await;
    assert_eq!(done.notifications_sent, 1);
    assert_eq!(presenter.shown().len(), 1);

    handle.stop().await;
}

#[tokio::test]
async fn test_restart_starts_from_clean_slate() {
    let (source, senders) = ChannelSource::new(2);
    let presenter = Arc::new(RecordingPresenter::default());
    let session = session(
        source,
        Arc::new(InMemoryFacilityStore::with_objects(vec![gym()])),
        Arc::new(RecordingSink::default()),
        presenter.clone(),
    );
    let status = session.status();

    let first = session.start();
    senders[0].send(sample_at(10.0)).await.unwrap();
    wait_for(&status, |s| s.tick_count == 1).await;
    first.stop().await;
    assert_eq!(status.lock().await.state, SessionState::Stopped);

    // Stopping dropped the subscription
    assert!(senders[0].send(sample_at(10.0)).await.is_err());

    // Still within range, but the new run has no notification history
    let second = session.start();
    senders[1].send(sample_at(10.0)).await.unwrap();
    wait_for(&status, |s| s.tick_count == 2).await;

    assert_eq!(presenter.shown().len(), 2);
    second.stop().await;
}

#[tokio::test]
async fn test_source_end_stops_session() {
    let (source, mut senders) = ChannelSource::new(1);
    let session = session(
        source,
        Arc::new(InMemoryFacilityStore::new()),
        Arc::new(RecordingSink::default()),
        Arc::new(RecordingPresenter::default()),
    );

    let status = session.status();
    let handle = session.start();
    let sender = senders.remove(0);
    sender.send(sample_at(10.0)).await.unwrap();
    drop(sender);

    let done = wait_for(&status, |s| s.state == SessionState::Stopped).await;
    assert_eq!(done.tick_count, 1);
    handle.stop().await;
}

#[tokio::test]
async fn test_out_of_range_sample_skips_tick() {
    let (source, senders) = ChannelSource::new(1);
    let presenter = Arc::new(RecordingPresenter::default());
    let sink = Arc::new(RecordingSink::default());
    let equator_gym =
        FacilityObject::new("gym-0", "Equator Gym", FacilityType::Gym).with_location(0.0, 0.0);
    let session = session(
        source,
        Arc::new(InMemoryFacilityStore::with_objects(vec![equator_gym])),
        sink.clone(),
        presenter.clone(),
    );

    let status = session.status();
    let handle = session.start();
    senders[0]
        .send(LocationSample::new(180.0, 180.0, 5.0))
        .await
        .unwrap();

    let done = wait_for(&status, |s| s.skipped_ticks == 1).await;
    assert_eq!(done.tick_count, 0);
    assert_eq!(
        done.last_error.as_deref(),
        Some("sample position out of range")
    );
    assert!(presenter.shown().is_empty());

    // The next valid fix is evaluated normally
    senders[0]
        .send(LocationSample::new(0.0, 0.0, 5.0))
        .await
        .unwrap();
    let done = wait_for(&status, |s| s.tick_count == 1).await;
    assert_eq!(done.notifications_sent, 1);
    assert!(sink
        .samples
        .lock()
        .unwrap()
        .iter()
        .all(|(_, sample)| sample.position().is_valid()));

    handle.stop().await;
}

#[tokio::test]
async fn test_stop_keeps_unavailable_state() {
    let session = session(
        Arc::new(DeniedSource),
        Arc::new(InMemoryFacilityStore::new()),
        Arc::new(RecordingSink::default()),
        Arc::new(RecordingPresenter::default()),
    );

    let status = session.status();
    let handle = session.start();
    wait_for(&status, |s| matches!(s.state, SessionState::Unavailable(_))).await;

    handle.stop().await;
    assert_eq!(
        status.lock().await.state,
        SessionState::Unavailable("location permission not granted".to_string())
    );
}
