//! FitMap Tracker - proximity tracking sessions over the facility directory.
//!
//! A session turns a feed of device locations into "you are near facility X"
//! notifications. Each location sample is one tick of the proximity engine.
//!
//! # Architecture
//!
//! ```text
//! Location source (device feed, replay file)
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │       Tracking session (one per user)    │
//! │  - Persist sample (fire-and-forget)      │
//! │  - Fetch facilities (with timeout)       │
//! │  - Evaluate proximity engine             │
//! └─────────────────────────────────────────┘
//!          ↓
//!   Notification presenter (log, webhook)
//! ```
//!
//! # Core Types
//!
//! - [`LocationSource`] - Trait for location feeds
//! - [`NotificationPresenter`] - Trait for notification delivery
//! - [`HttpFacilityStore`] - Directory client (facility fetch + location upload)
//! - [`TrackingSession`] - Session lifecycle and per-tick pipeline
//!
//! # Running a session
//!
//! ```no_run
//! use fitmap::config::TrackingConfig;
//! use fitmap_tracker::{HttpFacilityStore, LogPresenter, ReplayLocationSource, TrackingSession};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let directory = Arc::new(HttpFacilityStore::new(
//!     "http://localhost:3000",
//!     Duration::from_secs(10),
//! )?);
//! let session = TrackingSession::new(
//!     "ana".to_string(),
//!     Arc::new(ReplayLocationSource::new("walk.jsonl")),
//!     directory.clone(),
//!     directory,
//!     Arc::new(LogPresenter),
//!     TrackingConfig::default(),
//! );
//!
//! let handle = session.start();
//! // ...
//! handle.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod presenter;
pub mod remote;
pub mod session;
pub mod source;

// Re-export public types
pub use presenter::{LogPresenter, Notification, NotificationPresenter, WebhookPresenter};
pub use remote::{HttpFacilityStore, LocationSink};
pub use session::{SessionHandle, SessionState, SessionStatus, TrackingSession};
pub use source::{
    LocationError, LocationRequest, LocationSource, LocationSubscription, ReplayLocationSource,
};
